//! Simulation driver and program loading.
//!
//! Provides the collaborators the scheduler treats as external: the program
//! loader, the instruction queue front end, the sequential reference
//! interpreter, and the `Simulator` that ties them to a `Scoreboard`.

/// Program loading and validation.
pub mod program;

/// Instruction queue front end.
pub mod queue;

/// Sequential reference interpreter.
pub mod reference;

/// Tick-driven simulator.
pub mod simulator;

pub use program::Program;
pub use queue::InstructionQueue;
pub use reference::RegSim;
pub use simulator::Simulator;
