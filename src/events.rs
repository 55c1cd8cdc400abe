//! Notifications emitted upward to the widget that hosts the bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// Event surfaced to the surrounding widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum BridgeEvent {
    /// The embedded content finished loading.
    FrameLoaded { address: String },

    /// The embedded content failed to load.
    FrameError { address: String, reason: String },

    /// An admitted notification from the embedded content.
    FrameMessage {
        #[serde(rename = "type")]
        message_type: String,
        payload: Value,
        origin: String,
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl BridgeEvent {
    /// Wire name of the notification (`frame-loaded`, `frame-error`, `frame-message`).
    pub fn name(&self) -> &'static str {
        match self {
            BridgeEvent::FrameLoaded { .. } => "frame-loaded",
            BridgeEvent::FrameError { .. } => "frame-error",
            BridgeEvent::FrameMessage { .. } => "frame-message",
        }
    }
}

/// In-process event bus from the bridge to its widget.
#[derive(Clone)]
pub struct EventBus {
    sender: UnboundedSender<BridgeEvent>,
}

impl EventBus {
    pub fn new_pair() -> (Self, UnboundedReceiver<BridgeEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Emit an event. Best-effort: a widget that dropped its receiver misses it.
    pub fn emit(&self, event: BridgeEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            trace!(event = name, "Event receiver dropped; notification discarded");
        }
    }
}
