//! Frame Message Bridge
//!
//! Secure message exchange between a host surface and content running in an isolated
//! embedded sub-context.
//!
//! Inbound events flow through three stages, each of which fails closed without
//! telling the sender:
//!
//! ```text
//! RawMessageEvent ─▶ origin::check ─▶ RateLimiter::admit ─▶ MessageRouter::route
//!                     (sender id,       (fixed 1 s window)     ├─▶ resolve pending request
//!                      allow-list)                             └─▶ emit frame-message
//! ```
//!
//! Outbound, `send_message` posts a one-way message and `request` posts a message
//! carrying a correlation id, returning a [`PendingResponse`] that settles exactly once.

pub mod message;
pub mod origin;
pub mod pending;
pub mod rate_limit;
pub mod router;

pub use message::{IncomingEnvelope, OutgoingMessage};
pub use origin::{Admission, AllowedOrigins};
pub use pending::{CorrelationIds, PendingRequestTable, PendingResponse};
pub use rate_limit::RateLimiter;
pub use router::{MessageRouter, Namespace, RouteOutcome};

use crate::channel::{ContextChannel, MessageHub, RawMessageEvent, SubscriptionGuard, ANY_ORIGIN};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventBus};
use crate::frame::{sandbox_attribute, FrameHost, FrameState, LifecycleState};
use crate::types::{next_bridge_seq, ContextId};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The bridge is not attached; nothing was evaluated.
    Detached,
    Rejected(Admission),
    RateLimited,
    Routed(RouteOutcome),
}

/// Inbound/outbound counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Events offered to the pipeline
    pub received: u64,
    /// Dropped: sender is not the tracked sub-context
    pub foreign_sender: u64,
    /// Dropped: origin not on the allow-list
    pub disallowed_origin: u64,
    /// Dropped by the rate limiter
    pub rate_limited: u64,
    /// Dropped: not a usable envelope
    pub malformed: u64,
    /// Dropped: outside the notification namespace
    pub ignored: u64,
    /// Settled a pending request
    pub responses: u64,
    /// Emitted as `frame-message`
    pub notifications: u64,
    /// Messages handed to the sub-context
    pub sent: u64,
}

/// Resources held while attached; released by `detach`.
struct Attachment {
    subscription: SubscriptionGuard,
    pump: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

struct BridgeInner {
    seq: u64,
    frame: Mutex<FrameHost>,
    context: RwLock<Option<Arc<dyn ContextChannel>>>,
    allowed_origins: RwLock<AllowedOrigins>,
    limiter: Arc<RateLimiter>,
    router: MessageRouter,
    pending: PendingRequestTable,
    ids: CorrelationIds,
    events: EventBus,
    default_timeout: Duration,
    stats: Mutex<BridgeStats>,
}

impl BridgeInner {
    fn tracked_sender(&self) -> Option<ContextId> {
        self.context.read().as_ref().map(|context| context.id())
    }

    fn live_context(&self) -> Option<Arc<dyn ContextChannel>> {
        self.context.read().clone()
    }

    fn handle_event(&self, event: RawMessageEvent) -> InboundOutcome {
        self.stats.lock().received += 1;

        let admission = {
            let allowed = self.allowed_origins.read();
            origin::check(&event, self.tracked_sender(), &allowed)
        };
        match admission {
            Admission::Admitted => {}
            Admission::ForeignSender => {
                debug!(
                    bridge = self.seq,
                    source = %event.source,
                    origin = %event.origin,
                    "Dropping message from untracked sender"
                );
                self.stats.lock().foreign_sender += 1;
                return InboundOutcome::Rejected(admission);
            }
            Admission::DisallowedOrigin => {
                warn!(
                    bridge = self.seq,
                    origin = %event.origin,
                    "Dropping message from disallowed origin"
                );
                self.stats.lock().disallowed_origin += 1;
                return InboundOutcome::Rejected(admission);
            }
        }

        if !self.limiter.admit() {
            warn!(
                bridge = self.seq,
                threshold = self.limiter.threshold(),
                counted = self.limiter.current(),
                "Inbound rate limit exceeded; dropping message"
            );
            self.stats.lock().rate_limited += 1;
            return InboundOutcome::RateLimited;
        }

        let outcome = self.router.route(event, &self.pending, &self.events);
        {
            let mut stats = self.stats.lock();
            match &outcome {
                RouteOutcome::Resolved(_) => stats.responses += 1,
                RouteOutcome::Notified => stats.notifications += 1,
                RouteOutcome::Ignored => stats.ignored += 1,
                RouteOutcome::Malformed => stats.malformed += 1,
            }
        }
        InboundOutcome::Routed(outcome)
    }
}

/// Message bridge for one embedded sub-context.
///
/// Timers (rate-limit window, request timeouts) run on the ambient tokio runtime, so
/// `attach` and `request` must be called from within one.
pub struct FrameBridge {
    inner: Arc<BridgeInner>,
    attachment: Mutex<Option<Attachment>>,
}

impl FrameBridge {
    /// Create a bridge and the receiver for its upward notifications.
    pub fn new(config: &BridgeConfig) -> (Self, UnboundedReceiver<BridgeEvent>) {
        let (events, receiver) = EventBus::new_pair();
        let seq = next_bridge_seq();

        if config.allowed_origins.is_wildcard() {
            warn!(
                bridge = seq,
                address = %config.address,
                "Origin allow-list is the wildcard; messages from any origin will be accepted"
            );
        }

        let inner = BridgeInner {
            seq,
            frame: Mutex::new(FrameHost::new(
                config.address.clone(),
                config.isolation_flags.clone(),
                events.clone(),
            )),
            context: RwLock::new(None),
            allowed_origins: RwLock::new(config.allowed_origins.clone()),
            limiter: Arc::new(RateLimiter::new(config.rate_limit_per_second)),
            router: MessageRouter::new(Namespace::new(
                config.notification_prefix.clone(),
                config.generic_message_type.clone(),
            )),
            pending: PendingRequestTable::new(),
            ids: CorrelationIds::new(seq),
            events,
            default_timeout: Duration::from_millis(config.default_request_timeout_ms),
            stats: Mutex::new(BridgeStats::default()),
        };

        let bridge = Self {
            inner: Arc::new(inner),
            attachment: Mutex::new(None),
        };
        (bridge, receiver)
    }

    /// Connect to the host environment.
    ///
    /// Binds `context` as the tracked sub-context, subscribes to `hub`, starts the
    /// rate-limit window and begins loading the configured address. Attaching an
    /// already attached bridge detaches it first.
    pub fn attach(
        &self,
        hub: &MessageHub,
        context: Arc<dyn ContextChannel>,
    ) -> Result<(), BridgeError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        if self.is_attached() {
            self.detach();
        }

        let context_id = context.id();
        *self.inner.context.write() = Some(context);

        let (subscription, mut receiver) = hub.subscribe().split();
        let pump = {
            let inner = Arc::clone(&self.inner);
            runtime.spawn(async move {
                while let Some(event) = receiver.recv().await {
                    inner.handle_event(event);
                }
            })
        };
        let ticker = rate_limit::spawn_reset_ticker(&self.inner.limiter);

        *self.attachment.lock() = Some(Attachment {
            subscription,
            pump,
            ticker,
        });

        let mut frame = self.inner.frame.lock();
        let address = frame.address().to_string();
        frame.navigate(address);
        info!(
            bridge = self.inner.seq,
            context = %context_id,
            address = %frame.address(),
            "Bridge attached"
        );
        Ok(())
    }

    /// Release the subscription, stop timers, reject every pending request with
    /// `TornDown` and return the frame to `Unloaded`. Returns the number rejected.
    pub fn detach(&self) -> usize {
        let attachment = self.attachment.lock().take();
        if let Some(attachment) = attachment {
            let subscription_id = attachment.subscription.id();
            drop(attachment.subscription);
            attachment.pump.abort();
            attachment.ticker.abort();
            debug!(bridge = self.inner.seq, subscription = subscription_id, "Bridge detached");
        }

        let abandoned = self.inner.pending.ids();
        let rejected = self.inner.pending.reject_all();
        *self.inner.context.write() = None;
        self.inner.limiter.reset();
        self.inner.frame.lock().unload();
        if rejected > 0 {
            info!(
                bridge = self.inner.seq,
                rejected,
                request_ids = ?abandoned,
                "Rejected pending requests on teardown"
            );
        }
        rejected
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }

    /// Replace the tracked sub-context, e.g. after the environment recreated the frame.
    /// Events from the previous context are no longer admitted.
    pub fn bind_context(&self, context: Arc<dyn ContextChannel>) {
        debug!(bridge = self.inner.seq, context = %context.id(), "Bound embedded context");
        *self.inner.context.write() = Some(context);
    }

    /// Run one inbound event through admission, rate limiting and routing.
    ///
    /// Attached bridges call this for every hub event; environments that deliver
    /// events directly may call it themselves. Requires an attached bridge: the
    /// rate-limit window only runs while attached, so otherwise returns `Detached`.
    pub fn handle_event(&self, event: RawMessageEvent) -> InboundOutcome {
        if !self.is_attached() {
            debug!(
                bridge = self.inner.seq,
                source = %event.source,
                "Dropping message delivered to a detached bridge"
            );
            return InboundOutcome::Detached;
        }
        self.inner.handle_event(event)
    }

    // Lifecycle

    pub fn navigate(&self, address: impl Into<String>) {
        self.inner.frame.lock().navigate(address);
    }

    pub fn reload(&self) {
        self.inner.frame.lock().reload();
    }

    pub fn retry(&self) {
        self.inner.frame.lock().retry();
    }

    pub fn on_loaded(&self) {
        self.inner.frame.lock().on_loaded();
    }

    pub fn on_failed(&self, reason: impl Into<String>) {
        self.inner.frame.lock().on_failed(reason);
    }

    pub fn frame_state(&self) -> FrameState {
        self.inner.frame.lock().state()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.inner.frame.lock().lifecycle_state()
    }

    /// Sandbox attribute value for the renderer.
    pub fn sandbox_attribute(&self) -> String {
        sandbox_attribute(self.inner.frame.lock().isolation_flags())
    }

    // Origins

    pub fn allowed_origins(&self) -> AllowedOrigins {
        self.inner.allowed_origins.read().clone()
    }

    /// Replace the allow-list. Takes effect for the next inbound event.
    pub fn set_allowed_origins(&self, allowed: AllowedOrigins) {
        if allowed.is_wildcard() {
            warn!(bridge = self.inner.seq, "Origin allow-list reconfigured to the wildcard");
        } else {
            info!(bridge = self.inner.seq, origins = ?allowed, "Origin allow-list reconfigured");
        }
        *self.inner.allowed_origins.write() = allowed;
    }

    // Outbound

    /// Fire-and-forget send. False when no live sub-context is bound or the post failed.
    pub fn send_message(
        &self,
        message_type: impl Into<String>,
        payload: Value,
        target_origin: Option<&str>,
    ) -> bool {
        let message_type = message_type.into();
        let context = match self.inner.live_context() {
            Some(context) => context,
            None => {
                warn!(
                    bridge = self.inner.seq,
                    message_type = %message_type,
                    "No live embedded context; message not sent"
                );
                return false;
            }
        };

        let message = OutgoingMessage::new(message_type, payload, None);
        let target_origin = target_origin.unwrap_or(ANY_ORIGIN);
        match context.post(&message, target_origin) {
            Ok(()) => {
                self.inner.stats.lock().sent += 1;
                debug!(
                    bridge = self.inner.seq,
                    message_type = %message.message_type,
                    target_origin,
                    "Sent message to embedded context"
                );
                true
            }
            Err(e) => {
                warn!(
                    bridge = self.inner.seq,
                    message_type = %message.message_type,
                    error = %e,
                    "Failed to post message to embedded context"
                );
                false
            }
        }
    }

    /// Correlated send/receive.
    ///
    /// The returned future resolves with the response payload, or rejects with
    /// `Timeout` after `timeout_ms`, `TornDown` on detach, or immediately with
    /// `NoLiveContext` when nothing is bound.
    pub fn request(
        &self,
        message_type: impl Into<String>,
        payload: Value,
        timeout_ms: Option<u64>,
    ) -> PendingResponse {
        let message_type = message_type.into();
        let context = match self.inner.live_context() {
            Some(context) => context,
            None => {
                warn!(
                    bridge = self.inner.seq,
                    message_type = %message_type,
                    "No live embedded context; request failed"
                );
                return PendingResponse::failed(BridgeError::NoLiveContext);
            }
        };

        let timeout = timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.inner.default_timeout);
        let request_id = self.inner.ids.next_id();
        let response = match self.inner.pending.register(request_id.clone(), timeout) {
            Ok(response) => response,
            Err(e) => return PendingResponse::failed(e),
        };

        let message = OutgoingMessage::new(message_type, payload, Some(request_id.clone()));
        match context.post(&message, ANY_ORIGIN) {
            Ok(()) => {
                self.inner.stats.lock().sent += 1;
                debug!(
                    bridge = self.inner.seq,
                    request_id = %request_id,
                    message_type = %message.message_type,
                    "Sent request to embedded context"
                );
            }
            Err(e) => {
                warn!(
                    bridge = self.inner.seq,
                    request_id = %request_id,
                    error = %e,
                    "Failed to post request to embedded context"
                );
                self.inner.pending.reject(&request_id, BridgeError::Channel(e));
            }
        }
        response
    }

    /// `request` with the configured default timeout.
    pub fn request_default(&self, message_type: impl Into<String>, payload: Value) -> PendingResponse {
        self.request(message_type, payload, None)
    }

    // Diagnostics

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn stats(&self) -> BridgeStats {
        self.inner.stats.lock().clone()
    }
}

impl Drop for FrameBridge {
    fn drop(&mut self) {
        self.detach();
    }
}
