//! Final dispatch of admitted, rate-accepted inbound messages.

use crate::bridge::message::IncomingEnvelope;
use crate::bridge::pending::PendingRequestTable;
use crate::channel::RawMessageEvent;
use crate::events::{BridgeEvent, EventBus};
use tracing::{debug, trace};

pub const DEFAULT_NOTIFICATION_PREFIX: &str = "bridge:";
pub const DEFAULT_GENERIC_MESSAGE_TYPE: &str = "notify";

/// Message types surfaced to the widget as `frame-message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
    generic_type: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_PREFIX, DEFAULT_GENERIC_MESSAGE_TYPE)
    }
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, generic_type: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            generic_type: generic_type.into(),
        }
    }

    pub fn contains(&self, message_type: &str) -> bool {
        message_type == self.generic_type
            || (!self.prefix.is_empty() && message_type.starts_with(&self.prefix))
    }
}

/// What the router did with one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Settled the pending request with this id.
    Resolved(String),
    /// Emitted a `frame-message` notification.
    Notified,
    /// Well formed, but neither a live response nor in the namespace.
    Ignored,
    /// Not an object, or missing a usable `type`.
    Malformed,
}

#[derive(Debug, Clone, Default)]
pub struct MessageRouter {
    namespace: Namespace,
}

impl MessageRouter {
    pub fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Response match takes precedence over notification dispatch.
    pub fn route(
        &self,
        event: RawMessageEvent,
        pending: &PendingRequestTable,
        events: &EventBus,
    ) -> RouteOutcome {
        let envelope = match IncomingEnvelope::parse(event) {
            Some(envelope) => envelope,
            None => {
                trace!("Dropping malformed inbound message");
                return RouteOutcome::Malformed;
            }
        };

        if let Some(request_id) = envelope.request_id.as_deref() {
            if pending.resolve(request_id, envelope.payload.clone()) {
                return RouteOutcome::Resolved(request_id.to_string());
            }
        }

        let message_type = match envelope.message_type {
            Some(message_type) => message_type,
            None => {
                trace!(
                    request_id = ?envelope.request_id,
                    "Dropping untyped message with no live request"
                );
                return RouteOutcome::Malformed;
            }
        };

        if !self.namespace.contains(&message_type) {
            debug!(
                message_type = %message_type,
                origin = %envelope.origin,
                "Ignoring message outside the bridge namespace"
            );
            return RouteOutcome::Ignored;
        }

        events.emit(BridgeEvent::FrameMessage {
            message_type,
            payload: envelope.payload,
            origin: envelope.origin,
            request_id: envelope.request_id,
        });
        RouteOutcome::Notified
    }
}
