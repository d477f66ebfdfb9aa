//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;
pub mod document;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::AppConfig;
pub use document::JsonDocument;
