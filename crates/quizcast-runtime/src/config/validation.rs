//! Configuration validation utilities.

use quizcast_core::{MatchConfig, MatchTier};

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, NotifierConfig, QuizcastConfig, ReconnectConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &QuizcastConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_notifier_config(&config.notifier)?;
    validate_reconnect_config(&config.reconnect)?;
    validate_matching_config(&config.matching)?;

    if config.state.path.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("state.path"));
    }

    if let Some(target) = &config.session.target
        && target.trim().trim_start_matches('@').is_empty()
    {
        return Err(ConfigError::validation("session.target cannot be blank"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_notifier_config(notifier: &NotifierConfig) -> ConfigResult<()> {
    if notifier.timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Notifier timeout must be greater than 0",
        ));
    }

    if notifier.http.enabled {
        validate_url(&notifier.http.url, "http")?;
    }

    if notifier.file.enabled && notifier.file.path.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("notifier.file.path"));
    }

    Ok(())
}

fn validate_reconnect_config(reconnect: &ReconnectConfig) -> ConfigResult<()> {
    if reconnect.max_attempts == 0 {
        return Err(ConfigError::validation(
            "Reconnect max_attempts must be at least 1",
        ));
    }

    if reconnect.step_secs == 0 {
        return Err(ConfigError::validation(
            "Reconnect step must be greater than 0",
        ));
    }

    if reconnect.max_delay_secs < reconnect.step_secs {
        return Err(ConfigError::validation(
            "Reconnect max delay must be greater than or equal to the step",
        ));
    }

    Ok(())
}

fn validate_matching_config(matching: &MatchConfig) -> ConfigResult<()> {
    let threshold = matching.word_overlap_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(ConfigError::validation(format!(
            "Word overlap threshold must be in (0, 1], got {threshold}"
        )));
    }

    if !matching.tiers.iter().any(|t| *t != MatchTier::None) {
        return Err(ConfigError::validation(
            "At least one match tier must be enabled",
        ));
    }

    Ok(())
}

/// Validates a URL.
fn validate_url(url: &str, expected_scheme: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("url"));
    }

    let valid_schemes = match expected_scheme {
        "ws" => ["ws://", "wss://"],
        "http" => ["http://", "https://"],
        _ => return Err(ConfigError::validation("Unknown URL scheme type")),
    };

    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {:?}", valid_schemes),
        ));
    }

    Ok(())
}
