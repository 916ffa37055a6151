use pretty_assertions::assert_eq;
use rstest::rstest;
use scoreboard_core::common::ConfigError;
use scoreboard_core::config::Config;

#[test]
fn empty_object_is_default() {
    assert_eq!(Config::from_json("{}"), Ok(Config::default()));
}

#[test]
fn partial_sections_keep_defaults() {
    let config = Config::from_json(r#"{"units": {"alu": 4}, "latency": {"mul": 3}}"#).unwrap();
    assert_eq!(config.units.alu, 4);
    assert_eq!(config.units.branch, 1);
    assert_eq!(config.units.total(), 6);
    assert_eq!(config.latency.mul, 3);
    assert_eq!(config.latency.add, 2);
    assert!(config.scheduler.order_shadow);
    assert!(!config.scheduler.stall_on_waw);
}

#[test]
fn default_shape() {
    let config = Config::default();
    assert_eq!(config.scheduler.num_regs, 8);
    assert_eq!(config.scheduler.reg_width, 64);
    assert_eq!(config.memory.words, 256);
    assert_eq!(config.general.max_cycles, 100_000);
    assert_eq!(config.validate(), Ok(()));
}

#[rstest]
#[case(r#"{"scheduler": {"num_regs": 0}}"#, ConfigError::NoRegisters)]
#[case(r#"{"scheduler": {"reg_width": 65}}"#, ConfigError::RegisterWidth(65))]
#[case(r#"{"scheduler": {"reg_width": 0}}"#, ConfigError::RegisterWidth(0))]
#[case(r#"{"units": {"alu": 0, "branch": 0, "load_store": 0}}"#, ConfigError::NoUnits)]
#[case(r#"{"latency": {"mul": 0}}"#, ConfigError::ZeroLatency("mul"))]
#[case(r#"{"latency": {"address": 0}}"#, ConfigError::ZeroLatency("address"))]
#[case(r#"{"memory": {"words": 100}}"#, ConfigError::MemorySize(100))]
fn rejects_invalid(#[case] json: &str, #[case] expected: ConfigError) {
    assert_eq!(Config::from_json(json), Err(expected));
}

#[test]
fn rejects_malformed_json() {
    assert!(matches!(Config::from_json("{"), Err(ConfigError::Parse(_))));
    assert!(matches!(
        Config::from_json(r#"{"units": {"alu": "two"}}"#),
        Err(ConfigError::Parse(_))
    ));
}
