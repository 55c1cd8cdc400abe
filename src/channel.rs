//! Host environment primitives consumed by the bridge.
//!
//! The bridge needs exactly two things from its environment: a way to post a message
//! into the embedded context ([`ContextChannel`]) and a stream of raw message events
//! coming back ([`MessageHub`]). The hub is shared by every embedded widget on the
//! host surface; each bridge holds its own [`Subscription`], released when the guard
//! is dropped.

use crate::bridge::message::OutgoingMessage;
use crate::error::ChannelError;
use crate::types::ContextId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

/// Wildcard target/allow-list value.
pub const ANY_ORIGIN: &str = "*";

/// Outbound primitive: a live reference to one embedded sub-context.
pub trait ContextChannel: Send + Sync {
    /// Identity compared against the `source` of inbound events.
    fn id(&self) -> ContextId;

    /// Post a message, restricted to `target_origin` (`"*"` for any).
    fn post(&self, message: &OutgoingMessage, target_origin: &str) -> Result<(), ChannelError>;
}

/// A message event as delivered by the host environment, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessageEvent {
    pub data: Value,
    pub origin: String,
    pub source: ContextId,
}

impl RawMessageEvent {
    pub fn new(data: Value, origin: impl Into<String>, source: ContextId) -> Self {
        Self {
            data,
            origin: origin.into(),
            source,
        }
    }
}

#[derive(Default)]
struct HubInner {
    subscribers: Mutex<HashMap<u64, UnboundedSender<RawMessageEvent>>>,
    next_id: AtomicU64,
}

/// Shared message channel of the host surface.
#[derive(Clone, Default)]
pub struct MessageHub {
    inner: Arc<HubInner>,
}

impl MessageHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a per-instance subscription. Dropping it unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().insert(id, sender);
        debug!(subscription = id, "Message hub subscription acquired");
        Subscription {
            guard: SubscriptionGuard {
                id,
                hub: Arc::downgrade(&self.inner),
            },
            receiver,
        }
    }

    /// Deliver an event to every current subscriber. Returns the number reached.
    pub fn post(&self, event: RawMessageEvent) -> usize {
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|_, sender| !sender.is_closed());
        for sender in subscribers.values() {
            let _ = sender.send(event.clone());
        }
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

/// Registration half of a [`Subscription`]; dropping it unsubscribes.
pub struct SubscriptionGuard {
    id: u64,
    hub: Weak<HubInner>,
}

impl SubscriptionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.subscribers.lock().remove(&self.id);
            debug!(subscription = self.id, "Message hub subscription released");
        }
    }
}

/// RAII subscription on a [`MessageHub`].
pub struct Subscription {
    guard: SubscriptionGuard,
    receiver: UnboundedReceiver<RawMessageEvent>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.guard.id
    }

    pub fn try_recv(&mut self) -> Option<RawMessageEvent> {
        self.receiver.try_recv().ok()
    }

    /// Separate the registration from the event stream, so the owner can release
    /// the registration while a task is still draining the receiver.
    pub fn split(self) -> (SubscriptionGuard, UnboundedReceiver<RawMessageEvent>) {
        (self.guard, self.receiver)
    }
}

/// A message accepted by a [`MemoryChannel`].
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub message: OutgoingMessage,
    pub target_origin: String,
}

/// In-memory sub-context used by the CLI simulator, tests and benchmarks.
///
/// Posts whose `target_origin` does not match the channel's own origin are
/// discarded without error, as a browser does. With an echo hub configured, every
/// request is answered through that hub with its own payload.
pub struct MemoryChannel {
    id: ContextId,
    origin: String,
    posted: Mutex<Vec<PostedMessage>>,
    closed: AtomicBool,
    echo: Option<MessageHub>,
}

impl MemoryChannel {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            id: ContextId::next(),
            origin: origin.into(),
            posted: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            echo: None,
        }
    }

    /// Answer requests by posting `{type, requestId, payload}` back through `hub`.
    pub fn with_echo(mut self, hub: MessageHub) -> Self {
        self.echo = Some(hub);
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Messages delivered so far.
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.lock().clone()
    }

    /// Build an inbound event as if this sub-context had sent `data`.
    pub fn event(&self, data: Value) -> RawMessageEvent {
        RawMessageEvent::new(data, self.origin.clone(), self.id)
    }
}

impl ContextChannel for MemoryChannel {
    fn id(&self) -> ContextId {
        self.id
    }

    fn post(&self, message: &OutgoingMessage, target_origin: &str) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        if target_origin != ANY_ORIGIN && target_origin != self.origin {
            trace!(
                context = %self.id,
                target_origin,
                origin = %self.origin,
                "Target origin mismatch; message not delivered"
            );
            return Ok(());
        }

        self.posted.lock().push(PostedMessage {
            message: message.clone(),
            target_origin: target_origin.to_string(),
        });

        if let (Some(hub), Some(request_id)) = (&self.echo, &message.request_id) {
            let reply = json!({
                "type": message.message_type,
                "requestId": request_id,
                "payload": message.payload,
            });
            hub.post(self.event(reply));
        }
        Ok(())
    }
}
