//! Daily API quota governance
//! Persisted call budget with lazy day rollover and tiered warnings

pub mod governor;
pub mod store;
pub mod types;

pub use governor::QuotaGovernor;
pub use store::{FileQuotaStore, MemoryQuotaStore, QuotaStore};
pub use types::{CallAdmission, QuotaConfig, QuotaState, QuotaSummary, UsageTier};
