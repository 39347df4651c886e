// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants;
use crate::errors::ConfigError;
use std::env;

/// Configuration for the log forwarder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    /// Log group every distribution's stream is created in
    pub log_group: String,
    /// Number of buffered records that triggers a publish
    pub buffer_size: usize,
    /// Append attempts per batch before it is abandoned
    pub retry_attempts: u32,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// AWS region override; the SDK provider chain is used when unset
    pub region: Option<String>,
    /// Endpoint override for both S3 and CloudWatch Logs (e.g. localstack)
    pub endpoint_url: Option<String>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            log_group: constants::DEFAULT_LOG_GROUP.to_string(),
            buffer_size: constants::BUFFER_SIZE,
            retry_attempts: constants::RETRY_ATTEMPTS,
            log_level: "info".to_string(),
            region: None,
            endpoint_url: None,
        }
    }
}

impl ForwarderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_group = lookup("CF_LOGS_LOG_GROUP")
            .unwrap_or_else(|| constants::DEFAULT_LOG_GROUP.to_string());
        let buffer_size = lookup("CF_LOGS_BUFFER_SIZE")
            .and_then(|size| size.trim().parse::<usize>().ok())
            .unwrap_or(constants::BUFFER_SIZE);
        let retry_attempts = lookup("CF_LOGS_RETRY_ATTEMPTS")
            .and_then(|attempts| attempts.trim().parse::<u32>().ok())
            .unwrap_or(constants::RETRY_ATTEMPTS);
        let log_level = lookup("CF_LOGS_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());
        let region = lookup("CF_LOGS_AWS_REGION").filter(|val| !val.trim().is_empty());
        let endpoint_url =
            lookup("CF_LOGS_AWS_ENDPOINT_URL").filter(|val| !val.trim().is_empty());

        let config = Self {
            log_group,
            buffer_size,
            retry_attempts,
            log_level,
            region,
            endpoint_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_group.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "CF_LOGS_LOG_GROUP cannot be empty".to_string(),
            ));
        }

        // PutLogEvents accepts at most 10000 events per call
        if self.buffer_size == 0 || self.buffer_size > constants::MAX_BUFFER_SIZE {
            return Err(ConfigError::Invalid(format!(
                "Buffer size must be between 1 and {}, got {}",
                constants::MAX_BUFFER_SIZE,
                self.buffer_size
            )));
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "Retry attempts must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ForwarderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_group, "CloudFront");
        assert_eq!(config.buffer_size, 1000);
        assert_eq!(config.retry_attempts, 10);
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = ForwarderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ForwarderConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = ForwarderConfig::from_lookup(lookup(&[
            ("CF_LOGS_LOG_GROUP", "cdn-access"),
            ("CF_LOGS_BUFFER_SIZE", "250"),
            ("CF_LOGS_RETRY_ATTEMPTS", "3"),
            ("CF_LOGS_LOG_LEVEL", "DEBUG"),
            ("CF_LOGS_AWS_REGION", "eu-west-1"),
            ("CF_LOGS_AWS_ENDPOINT_URL", "http://localhost:4566"),
        ]))
        .unwrap();

        assert_eq!(config.log_group, "cdn-access");
        assert_eq!(config.buffer_size, 250);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
    }

    #[test]
    fn test_from_lookup_unparseable_numbers_fall_back() {
        let config = ForwarderConfig::from_lookup(lookup(&[
            ("CF_LOGS_BUFFER_SIZE", "lots"),
            ("CF_LOGS_RETRY_ATTEMPTS", "-1"),
        ]))
        .unwrap();
        assert_eq!(config.buffer_size, 1000);
        assert_eq!(config.retry_attempts, 10);
    }

    #[test]
    fn test_from_lookup_blank_region_is_unset() {
        let config =
            ForwarderConfig::from_lookup(lookup(&[("CF_LOGS_AWS_REGION", " ")])).unwrap();
        assert_eq!(config.region, None);
    }

    #[test]
    fn test_from_lookup_rejects_invalid_values() {
        assert!(ForwarderConfig::from_lookup(lookup(&[("CF_LOGS_BUFFER_SIZE", "0")])).is_err());
        assert!(ForwarderConfig::from_lookup(lookup(&[("CF_LOGS_LOG_GROUP", "")])).is_err());
        assert!(ForwarderConfig::from_lookup(lookup(&[("CF_LOGS_LOG_LEVEL", "loud")])).is_err());
    }

    #[test]
    fn test_validate_buffer_size_bounds() {
        for (buffer_size, valid) in [(0, false), (1, true), (10_000, true), (10_001, false)] {
            let config = ForwarderConfig {
                buffer_size,
                ..Default::default()
            };
            assert_eq!(config.validate().is_ok(), valid, "buffer size {buffer_size}");
        }
    }

    #[test]
    fn test_validate_zero_retry_attempts() {
        let config = ForwarderConfig {
            retry_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        for level in valid_levels {
            let config = ForwarderConfig {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Log level '{}' should be valid",
                level
            );
        }
    }
}
