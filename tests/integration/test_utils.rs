//! Shared fixtures for bridge integration tests

use framebridge::bridge::AllowedOrigins;
use framebridge::channel::{MemoryChannel, MessageHub};
use framebridge::config::BridgeConfig;
use framebridge::events::BridgeEvent;
use framebridge::FrameBridge;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub const TRUSTED: &str = "https://trusted.example";
pub const ADDRESS: &str = "https://trusted.example/widget";

/// An attached bridge with its hub, sub-context and notification stream.
pub struct Harness {
    pub bridge: FrameBridge,
    pub hub: MessageHub,
    pub channel: Arc<MemoryChannel>,
    pub events: UnboundedReceiver<BridgeEvent>,
}

pub fn trusted_config() -> BridgeConfig {
    BridgeConfig::new(ADDRESS).with_allowed_origins(AllowedOrigins::list([TRUSTED]))
}

/// Attach a bridge to a fresh hub and a sub-context served from `origin`.
pub fn attach(config: BridgeConfig, origin: &str, echo: bool) -> Harness {
    let hub = MessageHub::new();
    let channel = if echo {
        MemoryChannel::new(origin).with_echo(hub.clone())
    } else {
        MemoryChannel::new(origin)
    };
    let channel = Arc::new(channel);
    let (bridge, events) = FrameBridge::new(&config);
    bridge.attach(&hub, channel.clone()).unwrap();
    Harness {
        bridge,
        hub,
        channel,
        events,
    }
}

/// Let spawned bridge tasks drain whatever is queued.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Drain notifications emitted so far, ignoring lifecycle events.
pub fn drain_messages(events: &mut UnboundedReceiver<BridgeEvent>) -> Vec<BridgeEvent> {
    let mut messages = Vec::new();
    while let Ok(event) = events.try_recv() {
        if matches!(event, BridgeEvent::FrameMessage { .. }) {
            messages.push(event);
        }
    }
    messages
}
