//! Wire shapes exchanged with the embedded context.
//!
//! Both directions use `{ "type", "payload", "requestId"?, "timestamp"? }`.

use crate::channel::RawMessageEvent;
use crate::types::{now_millis, ContextId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message posted into the embedded context. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: u64,
}

impl OutgoingMessage {
    pub fn new(message_type: impl Into<String>, payload: Value, request_id: Option<String>) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
            request_id,
            timestamp: now_millis(),
        }
    }

    /// JSON form handed to the embedded context.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// An inbound message after structural validation. Consumed once by the router.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEnvelope {
    pub message_type: Option<String>,
    pub payload: Value,
    pub request_id: Option<String>,
    pub origin: String,
    pub sender: ContextId,
}

impl IncomingEnvelope {
    /// Structural parse of a raw event.
    ///
    /// Returns `None` when `data` is not an object, or when `type`/`requestId` are
    /// present with a non-string value. A missing `type` is allowed here; the router
    /// decides whether the envelope is usable without one.
    pub fn parse(event: RawMessageEvent) -> Option<Self> {
        let RawMessageEvent {
            data,
            origin,
            source,
        } = event;
        let mut object = match data {
            Value::Object(object) => object,
            _ => return None,
        };

        let message_type = match object.remove("type") {
            None => None,
            Some(Value::String(t)) => Some(t),
            Some(_) => return None,
        };
        let request_id = match object.remove("requestId") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id),
            Some(_) => return None,
        };
        let payload = object.remove("payload").unwrap_or(Value::Null);

        Some(Self {
            message_type,
            payload,
            request_id,
            origin,
            sender: source,
        })
    }
}
