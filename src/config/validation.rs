use crate::config::types::{BackendConfig, BackendKind, Config, ExcludeEntry, KafkaConfig, WorkerConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_kafka_config(&config.kafka)?;
    validate_worker_config(&config.worker)?;
    validate_backend_config(&config.backend)?;
    validate_exclusions(&config.exclude)?;
    Ok(())
}

/// Validates message bus configuration
fn validate_kafka_config(config: &KafkaConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("location", &config.location),
        ("frontier-group", &config.frontier_group),
        ("incoming-topic", &config.incoming_topic),
        ("outgoing-topic", &config.outgoing_topic),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.incoming_topic == config.outgoing_topic {
        return Err(ConfigError::Validation(format!(
            "incoming-topic and outgoing-topic must differ, both are '{}'",
            config.incoming_topic
        )));
    }

    if config.message_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "message-timeout-ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Upper bound of requests asked from the backend in one batch
const MAX_NEXT_REQUESTS: usize = 100_000;

/// Validates loop configuration
fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.consumer_batch_size < 1 || config.consumer_batch_size > 10_000 {
        return Err(ConfigError::Validation(format!(
            "consumer-batch-size must be between 1 and 10000, got {}",
            config.consumer_batch_size
        )));
    }

    if config.max_next_requests < 1 || config.max_next_requests > MAX_NEXT_REQUESTS {
        return Err(ConfigError::Validation(format!(
            "max-next-requests must be between 1 and {}, got {}",
            MAX_NEXT_REQUESTS, config.max_next_requests
        )));
    }

    if config.poll_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-timeout-ms must be > 0".to_string(),
        ));
    }

    if !config.new_batch_ratio.is_finite() || config.new_batch_ratio <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "new-batch-ratio must be a positive number, got {}",
            config.new_batch_ratio
        )));
    }

    Ok(())
}

/// Validates backend configuration
fn validate_backend_config(config: &BackendConfig) -> Result<(), ConfigError> {
    if config.kind == BackendKind::Sqlite {
        match config.database_path.as_deref() {
            Some(path) if !path.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::Validation(
                    "database-path is required for the sqlite backend".to_string(),
                ))
            }
        }
    }
    Ok(())
}

/// Validates link exclusion entries
fn validate_exclusions(entries: &[ExcludeEntry]) -> Result<(), ConfigError> {
    for entry in entries {
        match (&entry.domain, &entry.substring) {
            (Some(domain), None) => validate_domain_pattern(domain)?,
            (None, Some(substring)) => {
                if substring.is_empty() {
                    return Err(ConfigError::Validation(
                        "exclude substring cannot be empty".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ConfigError::Validation(
                    "exclude entries need exactly one of 'domain' or 'substring'".to_string(),
                ))
            }
        }
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "Pattern '{}' has no domain after the wildcard",
            pattern
        )));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must be lowercase letters, digits, '.' or '-'",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' has an empty or malformed label",
            domain
        )));
    }

    Ok(())
}
