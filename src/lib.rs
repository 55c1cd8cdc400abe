//! Framebridge: Secure Embedded-Content Message Bridge
//!
//! Lets a host surface exchange typed JSON messages with content running inside an
//! isolated, potentially untrusted sub-context. Inbound traffic is admitted by sender
//! identity and origin allow-list, bounded by a fixed-window rate limiter and routed
//! either to an outstanding request or upward as a notification.

pub mod bridge;
pub mod channel;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod logging;
pub mod types;
pub mod widget;

pub use bridge::{AllowedOrigins, BridgeStats, FrameBridge, InboundOutcome, PendingResponse};
pub use channel::{ContextChannel, MemoryChannel, MessageHub, RawMessageEvent};
pub use config::{BridgeConfig, ConfigLoader, FrameBridgeSettings};
pub use error::{BridgeError, ChannelError};
pub use events::BridgeEvent;
pub use frame::{FrameState, IsolationFlag, LifecycleState};
