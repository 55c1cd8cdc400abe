//! CLI route: run context and command dispatch.

use crate::bridge::{AllowedOrigins, FrameBridge};
use crate::channel::{MemoryChannel, MessageHub, ANY_ORIGIN};
use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, FrameBridgeSettings};
use crate::error::BridgeError;
use crate::frame::parse_isolation_flags;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const SIMULATED_ADDRESS: &str = "https://embed.local/app";
const SIMULATED_ORIGIN: &str = "https://embed.local";

/// Runtime context for CLI execution: workspace and loaded settings.
pub struct RunContext {
    workspace_root: PathBuf,
    settings: FrameBridgeSettings,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, BridgeError> {
        let settings = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            settings,
        })
    }

    pub fn settings(&self) -> &FrameBridgeSettings {
        &self.settings
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, BridgeError> {
        match command {
            Commands::CheckConfig => self.check_config(),
            Commands::Simulate {
                requests,
                timeout_ms,
                silent,
                isolation_flags,
            } => {
                self.simulate(*requests, *timeout_ms, *silent, isolation_flags.as_deref())
                    .await
            }
        }
    }

    fn check_config(&self) -> Result<String, BridgeError> {
        self.settings.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            BridgeError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let rendered = toml::to_string_pretty(&self.settings)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to render config: {}", e)))?;
        Ok(format!(
            "# workspace: {}\n{}",
            self.workspace_root.display(),
            rendered
        ))
    }

    async fn simulate(
        &self,
        requests: usize,
        timeout_ms: Option<u64>,
        silent: bool,
        isolation_flags: Option<&str>,
    ) -> Result<String, BridgeError> {
        let mut config = self.settings.bridge.clone();
        if config.address.is_empty() {
            config.address = SIMULATED_ADDRESS.to_string();
        }
        if let Some(raw) = isolation_flags {
            config.isolation_flags = parse_isolation_flags(raw).map_err(BridgeError::ConfigError)?;
        }
        let origin = match &config.allowed_origins {
            AllowedOrigins::List(origins) => origins
                .iter()
                .find(|o| o.as_str() != ANY_ORIGIN)
                .cloned()
                .unwrap_or_else(|| SIMULATED_ORIGIN.to_string()),
            AllowedOrigins::Any => SIMULATED_ORIGIN.to_string(),
        };

        let hub = MessageHub::new();
        let channel = if silent {
            MemoryChannel::new(origin)
        } else {
            MemoryChannel::new(origin).with_echo(hub.clone())
        };
        let channel = Arc::new(channel);

        let (bridge, mut events) = FrameBridge::new(&config);
        bridge.attach(&hub, channel.clone())?;
        bridge.on_loaded();
        info!(
            address = %config.address,
            origin = channel.origin(),
            requests,
            "Simulating embedded context"
        );

        hub.post(channel.event(json!({
            "type": config.generic_message_type,
            "payload": {"ready": true},
        })));

        let pending: Vec<_> = (0..requests)
            .map(|seq| bridge.request("bridge:ping", json!({ "seq": seq }), timeout_ms))
            .collect();
        let results = futures::future::join_all(pending).await;

        let mut lines = vec![format!("sandbox: {}", bridge.sandbox_attribute())];
        for (seq, result) in results.into_iter().enumerate() {
            match result {
                Ok(payload) => lines.push(format!("request {}: ok {}", seq, payload)),
                Err(e) => lines.push(format!("request {}: error {}", seq, e)),
            }
        }

        bridge.detach();
        while let Ok(event) = events.try_recv() {
            let rendered = serde_json::to_string(&event).unwrap_or_default();
            lines.push(format!("event {}: {}", event.name(), rendered));
        }

        let stats = bridge.stats();
        lines.push(format!(
            "stats: received={} responses={} notifications={} dropped={}",
            stats.received,
            stats.responses,
            stats.notifications,
            stats.foreign_sender
                + stats.disallowed_origin
                + stats.rate_limited
                + stats.malformed
                + stats.ignored
        ));
        Ok(lines.join("\n"))
    }
}
