//! Resilient remote calls
//! Admission control, pacing, classified retry and a global rate-limit circuit

pub mod caller;
pub mod circuit;
pub mod types;

pub use caller::ResilientCaller;
pub use circuit::{PacingGate, RateLimitCircuit, SharedCallState};
pub use types::{CircuitStatus, FailureClass, ResilienceConfig};
