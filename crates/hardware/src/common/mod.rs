//! Common types shared across the scheduler and its simulation driver.
//!
//! This module provides the fundamental building blocks used by every other
//! component. It includes:
//! 1. **Masks:** Runtime-width bit vectors for per-FU and per-register signals.
//! 2. **Error Handling:** Protocol violations, configuration, program and simulation errors.
//! 3. **Register Storage:** The width-masked architectural register file.

/// Error types and protocol-violation definitions.
pub mod error;

/// Runtime-width bit masks.
pub mod mask;

/// Register file implementation.
pub mod reg;

pub use error::{ConfigError, Lane, ProgramError, ProtocolViolation, SimError};
pub use mask::Mask;
pub use reg::RegisterFile;
