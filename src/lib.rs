//! podrig - interactive setup for rented GPU pods
//!
//! This library provides the menu engine and the actions behind it: SSH
//! access, file transfer, a Tailscale client and a ComfyUI manager. The
//! binary wires them to the terminal or runs them from command-line flags.

pub mod actions;
pub mod cli;
pub mod core;
pub mod error;
pub mod tui;

pub use error::{PodrigError, Result};
