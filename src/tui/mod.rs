//! Terminal user interface
//!
//! A line-oriented menu engine on top of crossterm. Menus read single keys
//! in raw mode when the terminal allows it and fall back to reading whole
//! lines otherwise, so the same screens work over SSH, in notebook
//! terminals and with piped stdin.

pub mod app;
pub mod capabilities;
pub mod input;
pub mod menu;
pub mod prompt;
pub mod screen;
pub mod screens;
pub mod sink;
pub mod theme;

pub use app::App;
