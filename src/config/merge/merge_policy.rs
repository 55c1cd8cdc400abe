//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only scalars get builder defaults; collections (`allowed_origins`,
/// `isolation_flags`) fall back to their serde defaults so that a later layer
/// replaces them wholesale instead of merging element by element.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("bridge.address", "")?
        .set_default("bridge.rate_limit_per_second", 10)?
        .set_default("bridge.default_request_timeout_ms", 5000)?
        .set_default("bridge.notification_prefix", "bridge:")?
        .set_default("bridge.generic_message_type", "notify")?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")
}
