//! CLI, configuration, app wiring and output rendering
//!
//! This crate provides the `calmirror` command-line interface.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod secret;

pub use app::{App, Session};
pub use cli::Cli;
pub use error::{ClientError, ClientResult};
