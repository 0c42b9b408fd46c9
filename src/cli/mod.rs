//! CLI module for podrig
//!
//! This module contains the command definitions and handlers using clap.

pub mod actions;
pub mod commands;
pub mod config;

pub use commands::{Cli, Commands};
