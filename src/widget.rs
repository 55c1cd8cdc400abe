//! Widget lifecycle contract.
//!
//! Widgets implement [`Widget`] explicitly instead of inheriting shared callbacks. The
//! embedded-content widget composes a [`FrameBridge`]; rendering is left to the host.

use crate::bridge::FrameBridge;
use crate::channel::{ContextChannel, MessageHub};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::BridgeEvent;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Init/teardown hooks every widget provides.
pub trait Widget {
    /// Element name the widget is registered under.
    fn tag_name(&self) -> &'static str;

    /// Called when the widget is attached to a host surface.
    fn connect(&mut self, hub: &MessageHub) -> Result<(), BridgeError>;

    /// Called when the widget leaves the host surface. Must release everything
    /// acquired in `connect`.
    fn disconnect(&mut self);
}

/// Embedded-content widget: one bridge bound to one sub-context.
pub struct EmbeddedFrameWidget {
    bridge: FrameBridge,
    context: Arc<dyn ContextChannel>,
    events: Option<UnboundedReceiver<BridgeEvent>>,
}

impl EmbeddedFrameWidget {
    pub fn new(config: &BridgeConfig, context: Arc<dyn ContextChannel>) -> Self {
        let (bridge, events) = FrameBridge::new(config);
        Self {
            bridge,
            context,
            events: Some(events),
        }
    }

    pub fn bridge(&self) -> &FrameBridge {
        &self.bridge
    }

    /// Take the notification stream. Available once.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<BridgeEvent>> {
        self.events.take()
    }
}

impl Widget for EmbeddedFrameWidget {
    fn tag_name(&self) -> &'static str {
        "embedded-frame"
    }

    fn connect(&mut self, hub: &MessageHub) -> Result<(), BridgeError> {
        self.bridge.attach(hub, Arc::clone(&self.context))
    }

    fn disconnect(&mut self) {
        self.bridge.detach();
    }
}
