//! Configuration module for the quizcast runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for notification sinks, reconnect policy, answer matching, logging and
//! adapter sections.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ControlConfig, FileSinkConfig, HttpSinkConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, NotifierConfig, QuizcastConfig, ReconnectConfig, SessionConfig,
    SpanEventConfig, StateConfig,
};
pub use validation::validate_config;
