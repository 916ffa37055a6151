//! Scoreboard simulator CLI.
//!
//! This binary runs JSON programs through the scheduler. It provides:
//! 1. **Run:** Simulate a program to completion and print statistics and final state.
//! 2. **Verify:** Simulate a program and compare its final state against the
//!    sequential reference interpreter.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use scoreboard_core::Config;
use scoreboard_core::common::SimError;
use scoreboard_core::sim::{Program, RegSim, Simulator};
use scoreboard_core::stats::{STATS_SECTIONS, SchedStats};

#[derive(Parser, Debug)]
#[command(
    name = "sbsim",
    author,
    version,
    about = "Out-of-order scoreboard simulator",
    long_about = "Run a JSON program through the scoreboard scheduler.\n\nExamples:\n  sbsim run program.json\n  sbsim run program.json --config wide.json --stats summary --stats stalls\n  sbsim verify program.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate a program and report statistics.
    Run {
        /// Program file (JSON).
        program: PathBuf,

        #[command(flatten)]
        opts: RunOpts,

        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Statistics sections to print (default: all).
        #[arg(
            long = "stats",
            value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied())
        )]
        sections: Vec<String>,
    },

    /// Simulate a program and compare against the reference interpreter.
    Verify {
        /// Program file (JSON).
        program: PathBuf,

        #[command(flatten)]
        opts: RunOpts,
    },
}

#[derive(clap::Args, Debug)]
struct RunOpts {
    /// Configuration file (JSON); built-in defaults otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every tick, grant and die.
    #[arg(long)]
    trace: bool,

    /// Check scheduler invariants after every tick.
    #[arg(long)]
    check: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    registers: &'a [u64],
    stats: &'a SchedStats,
}

fn main() {
    let cli = Cli::parse();
    let trace = match &cli.command {
        Commands::Run { opts, .. } | Commands::Verify { opts, .. } => opts.trace,
    };
    init_logging(trace);

    let result = match cli.command {
        Commands::Run {
            program,
            opts,
            json,
            sections,
        } => cmd_run(&program, &opts, json, &sections),
        Commands::Verify { program, opts } => cmd_verify(&program, &opts),
    };
    if let Err(e) = result {
        error!("{e}");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the default level.
fn init_logging(trace: bool) {
    let default = if trace { "trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(opts: &RunOpts) -> Result<Config, SimError> {
    let mut config = match &opts.config {
        Some(path) => Config::from_json(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    config.general.trace |= opts.trace;
    config.general.check_invariants |= opts.check;
    Ok(config)
}

fn simulate(program: &Path, opts: &RunOpts) -> Result<(Config, Program, Simulator), SimError> {
    let config = load_config(opts)?;
    let program = Program::load(program)?;
    let mut sim = Simulator::new(config.clone(), program.clone())?;
    sim.run()?;
    Ok((config, program, sim))
}

fn cmd_run(
    program: &Path,
    opts: &RunOpts,
    json: bool,
    sections: &[String],
) -> Result<(), SimError> {
    let (_, _, sim) = simulate(program, opts)?;
    if json {
        let report = Report {
            registers: sim.registers().values(),
            stats: sim.stats(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("error: {e}"),
        }
    } else {
        sim.stats().print_sections(sections);
        println!("REGISTERS");
        sim.registers().dump();
    }
    Ok(())
}

fn cmd_verify(program: &Path, opts: &RunOpts) -> Result<(), SimError> {
    let (config, program, sim) = simulate(program, opts)?;
    let reference = RegSim::execute(&config, &program);
    let mut mismatches = 0;
    for (i, (got, want)) in sim
        .registers()
        .values()
        .iter()
        .zip(reference.registers().values())
        .enumerate()
    {
        if got != want {
            println!("r{i}: scoreboard {got:#x}, reference {want:#x}");
            mismatches += 1;
        }
    }
    for (addr, (got, want)) in sim
        .memory()
        .words()
        .iter()
        .zip(reference.memory().words())
        .enumerate()
    {
        if got != want {
            println!("mem[{addr}]: scoreboard {got:#x}, reference {want:#x}");
            mismatches += 1;
        }
    }
    if mismatches > 0 {
        println!(
            "FAIL: {mismatches} mismatches after {} cycles",
            sim.stats().cycles
        );
        process::exit(2);
    }
    println!(
        "OK: {} cycles, {} retired, ipc {:.3}",
        sim.stats().cycles,
        sim.stats().retired,
        sim.stats().ipc()
    );
    Ok(())
}
