//! Core functionality for podrig
//!
//! This module contains shared plumbing used by every action:
//! - Application configuration
//! - Ctrl-C handling
//! - External command execution
//! - Pod environment detection

pub mod config;
pub mod interrupt;
pub mod pod_env;
pub mod process;

pub use config::Config;
pub use interrupt::Interrupt;
pub use pod_env::PodEnvironment;
pub use process::{Cmd, CommandOutput, CommandRunner, SystemRunner};
