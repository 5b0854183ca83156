//! Clinassist - resilience and relevance services for clinical AI assistants
//!
//! # Architecture
//!
//! - **quota**: persisted daily call budget with tiered warnings
//! - **resilience**: quota-gated remote calls with pacing, classified
//!   retry and a process-wide rate-limit circuit
//! - **ranking**: report relevance selection and question recommendation

pub mod clock;
pub mod errors;

// Re-export commonly used types
pub use errors::{ClinicalError, Result};

pub mod quota;
pub mod ranking;
pub mod resilience;
pub mod telemetry;

pub mod cli;
