//! Configuration System
//!
//! Bridge construction settings plus logging, loaded from layered TOML files and
//! environment overrides. Tests included.

use crate::bridge::origin::AllowedOrigins;
use crate::bridge::rate_limit::DEFAULT_MESSAGES_PER_WINDOW;
use crate::bridge::router::{DEFAULT_GENERIC_MESSAGE_TYPE, DEFAULT_NOTIFICATION_PREFIX};
use crate::channel::ANY_ORIGIN;
use crate::frame::isolation::{default_isolation_flags, IsolationFlag};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameBridgeSettings {
    /// Bridge construction settings
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings recognised when a bridge is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Address of the embedded content
    #[serde(default)]
    pub address: String,

    /// Capabilities granted to the sandboxed sub-context
    #[serde(default = "default_isolation_flags")]
    pub isolation_flags: BTreeSet<IsolationFlag>,

    /// `"*"` or a list of exact origins
    #[serde(default)]
    pub allowed_origins: AllowedOrigins,

    /// Inbound messages processed per one-second window
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_second: u32,

    /// Timeout applied by `request` when none is given
    #[serde(default = "default_request_timeout_ms")]
    pub default_request_timeout_ms: u64,

    /// Types starting with this prefix are surfaced as notifications
    #[serde(default = "default_notification_prefix")]
    pub notification_prefix: String,

    /// Exact type surfaced as a generic notification
    #[serde(default = "default_generic_message_type")]
    pub generic_message_type: String,
}

fn default_rate_limit() -> u32 {
    DEFAULT_MESSAGES_PER_WINDOW
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_notification_prefix() -> String {
    DEFAULT_NOTIFICATION_PREFIX.to_string()
}

fn default_generic_message_type() -> String {
    DEFAULT_GENERIC_MESSAGE_TYPE.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            isolation_flags: default_isolation_flags(),
            allowed_origins: AllowedOrigins::default(),
            rate_limit_per_second: default_rate_limit(),
            default_request_timeout_ms: default_request_timeout_ms(),
            notification_prefix: default_notification_prefix(),
            generic_message_type: default_generic_message_type(),
        }
    }
}

impl BridgeConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_allowed_origins(mut self, allowed_origins: AllowedOrigins) -> Self {
        self.allowed_origins = allowed_origins;
        self
    }

    pub fn with_rate_limit(mut self, per_second: u32) -> Self {
        self.rate_limit_per_second = per_second;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_request_timeout_ms = timeout_ms;
        self
    }

    /// Validate bridge settings
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.rate_limit_per_second == 0 {
            errors.push(ValidationError::Bridge(
                "rate_limit_per_second must be greater than 0".to_string(),
            ));
        }
        if self.default_request_timeout_ms == 0 {
            errors.push(ValidationError::Bridge(
                "default_request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.notification_prefix.is_empty() && self.generic_message_type.is_empty() {
            errors.push(ValidationError::Bridge(
                "notification_prefix and generic_message_type cannot both be empty".to_string(),
            ));
        }

        if let AllowedOrigins::List(origins) = &self.allowed_origins {
            if origins.is_empty() {
                errors.push(ValidationError::Origin(
                    String::new(),
                    "allow-list is empty; use \"*\" to accept any origin".to_string(),
                ));
            }
            for origin in origins {
                if origin == ANY_ORIGIN {
                    if origins.len() > 1 {
                        errors.push(ValidationError::Origin(
                            origin.clone(),
                            "wildcard cannot be combined with listed origins".to_string(),
                        ));
                    }
                } else if origin.trim().is_empty() {
                    errors.push(ValidationError::Origin(
                        origin.clone(),
                        "origin cannot be empty".to_string(),
                    ));
                } else if origin.ends_with('/') {
                    errors.push(ValidationError::Origin(
                        origin.clone(),
                        "origin must not end with '/' (origins carry no path)".to_string(),
                    ));
                } else if !origin.contains("://") && origin != "null" {
                    errors.push(ValidationError::Origin(
                        origin.clone(),
                        "origin must include a scheme, e.g. https://host".to_string(),
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl FrameBridgeSettings {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        self.bridge.validate()
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Bridge(String),
    Origin(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Bridge(msg) => write!(f, "Bridge: {}", msg),
            ValidationError::Origin(origin, msg) => {
                write!(f, "Allowed origin '{}': {}", origin, msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
