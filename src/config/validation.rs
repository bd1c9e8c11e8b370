//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Value ranges (window > 0, budget > 0)
//! - Security constraints (CORS origin never a wildcard)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatekeeperConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::fmt;

use crate::config::schema::GatekeeperConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field,
        message: message.into(),
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.is_empty() {
        errors.push(err("listener.bind_address", "must not be empty"));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(err("rate_limit.window_secs", "must be greater than zero"));
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(err("rate_limit.max_requests", "must be greater than zero"));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(err(
            "rate_limit.sweep_interval_secs",
            "must be greater than zero",
        ));
    }

    if config.admission.max_body_bytes == 0 {
        errors.push(err("admission.max_body_bytes", "must be greater than zero"));
    }

    if config.cors.allowed_origin.is_empty() {
        errors.push(err("cors.allowed_origin", "must not be empty"));
    }
    if config.cors.allowed_origin == "*" {
        errors.push(err(
            "cors.allowed_origin",
            "wildcard origin is not permitted",
        ));
    }

    for (field, prefix) in [
        ("routes.api_prefix", &config.routes.api_prefix),
        ("routes.admin_prefix", &config.routes.admin_prefix),
    ] {
        if !prefix.starts_with('/') {
            errors.push(err(field, "must start with '/'"));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatekeeperConfig::default()).is_ok());
    }

    #[test]
    fn wildcard_origin_is_rejected() {
        let mut config = GatekeeperConfig::default();
        config.cors.allowed_origin = "*".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "cors.allowed_origin"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = GatekeeperConfig::default();
        config.rate_limit.window_secs = 0;
        config.rate_limit.max_requests = 0;
        config.routes.api_prefix = "api".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
