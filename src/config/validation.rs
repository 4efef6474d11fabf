//! Configuration validation.
//!
//! Serde handles syntax; this checks values the server cannot use.
//! Every error is reported, not just the first.

use std::fmt;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration.
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

/// Validate a loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if server.bind_address.is_empty() {
        errors.push(ValidationError {
            field: "server.bind_address",
            message: "must not be empty".to_string(),
        });
    } else {
        let port = server
            .bind_address
            .rsplit_once(':')
            .map(|(_, port)| port.parse::<u16>());
        if !matches!(port, Some(Ok(_))) {
            errors.push(ValidationError {
                field: "server.bind_address",
                message: format!("'{}' must end with :<port>", server.bind_address),
            });
        }
    }

    if server.max_header_bytes == 0 {
        errors.push(ValidationError {
            field: "server.max_header_bytes",
            message: "must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
