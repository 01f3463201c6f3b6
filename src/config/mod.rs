//! Configuration loading and parsing.
//!
//! This module provides YAML-based configuration for the scheduler: timing,
//! the notifier to use, and tasks to queue at startup.

mod error;
mod types;
mod yaml;

pub use error::ConfigError;
pub use types::{NotifierConfig, SchedulerConfig, TaskConfig};
pub use yaml::YamlLoader;
