pub mod harness;
pub mod mocks;
