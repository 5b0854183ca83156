//! CLI module for Clinassist
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Commands, QuotaCommand, Verbosity};
pub use config::Config;
