//! Outstanding request/response exchanges.
//!
//! Every entry is settled exactly once: by a matching response, by its own timeout
//! timer, by an explicit rejection, or by teardown. Settlement removes the entry under
//! the table lock, so whichever path removes it first is the only one that fires.

use crate::error::BridgeError;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Outcome = Result<Value, BridgeError>;

struct PendingRequest {
    created_at: Instant,
    timeout: Duration,
    timer: Option<JoinHandle<()>>,
    responder: oneshot::Sender<Outcome>,
}

impl PendingRequest {
    fn settle(mut self, outcome: Outcome) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let _ = self.responder.send(outcome);
    }
}

type Entries = Mutex<HashMap<String, PendingRequest>>;

/// Correlation id generator, unique for the lifetime of one bridge.
#[derive(Debug)]
pub struct CorrelationIds {
    scope: u64,
    counter: AtomicU64,
}

impl CorrelationIds {
    pub fn new(scope: u64) -> Self {
        Self {
            scope,
            counter: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("req-{}-{}", self.scope, seq)
    }
}

/// Table of live requests keyed by correlation id.
#[derive(Clone, Default)]
pub struct PendingRequestTable {
    entries: Arc<Entries>,
}

impl PendingRequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` and arm its timeout timer. Requires a tokio runtime.
    pub fn register(&self, id: String, timeout: Duration) -> Result<PendingResponse, BridgeError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let (responder, receiver) = oneshot::channel();

        let mut entries = self.entries.lock();
        // The timer only touches the table after this lock is released, so the entry is
        // always present before its timer can look for it.
        let timer = {
            let table: Weak<Entries> = Arc::downgrade(&self.entries);
            let id = id.clone();
            runtime.spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(entries) = table.upgrade() {
                    expire(&entries, &id);
                }
            })
        };
        if let Some(previous) = entries.insert(
            id.clone(),
            PendingRequest {
                created_at: Instant::now(),
                timeout,
                timer: Some(timer),
                responder,
            },
        ) {
            // Ids are generated per bridge and never reused.
            warn!(request_id = %id, "Duplicate correlation id replaced a live entry");
            previous.settle(Err(BridgeError::TornDown {
                request_id: id.clone(),
            }));
        }
        debug!(
            request_id = %id,
            timeout_ms = timeout.as_millis() as u64,
            pending = entries.len(),
            "Registered pending request"
        );
        drop(entries);

        Ok(PendingResponse::waiting(id, receiver))
    }

    /// Settle `id` with a response payload. False if no live entry matched.
    pub fn resolve(&self, id: &str, payload: Value) -> bool {
        let entry = self.entries.lock().remove(id);
        match entry {
            Some(entry) => {
                debug!(
                    request_id = %id,
                    elapsed_ms = entry.created_at.elapsed().as_millis() as u64,
                    "Resolved pending request"
                );
                entry.settle(Ok(payload));
                true
            }
            None => false,
        }
    }

    /// Settle `id` with an error. False if no live entry matched.
    pub fn reject(&self, id: &str, error: BridgeError) -> bool {
        let entry = self.entries.lock().remove(id);
        match entry {
            Some(entry) => {
                debug!(request_id = %id, error = %error, "Rejected pending request");
                entry.settle(Err(error));
                true
            }
            None => false,
        }
    }

    /// Reject every live entry with `TornDown`. Returns the number rejected.
    pub fn reject_all(&self) -> usize {
        let drained: Vec<(String, PendingRequest)> = self.entries.lock().drain().collect();
        let count = drained.len();
        for (request_id, entry) in drained {
            entry.settle(Err(BridgeError::TornDown { request_id }));
        }
        count
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Live correlation ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.lock().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}

fn expire(entries: &Entries, id: &str) {
    let entry = entries.lock().remove(id);
    if let Some(mut entry) = entry {
        let timeout_ms = entry.timeout.as_millis() as u64;
        warn!(request_id = %id, timeout_ms, "Pending request timed out");
        // Running inside the timer task itself; nothing to abort.
        entry.timer = None;
        entry.settle(Err(BridgeError::Timeout {
            request_id: id.to_string(),
            timeout_ms,
        }));
    }
}

enum ResponseState {
    Failed(Option<BridgeError>),
    Waiting(oneshot::Receiver<Outcome>),
}

/// Future returned by `FrameBridge::request`. Settles exactly once.
///
/// Dropping it does not cancel the request; the table entry lives until its
/// response or timeout.
pub struct PendingResponse {
    request_id: Option<String>,
    state: ResponseState,
}

impl PendingResponse {
    pub(crate) fn waiting(request_id: String, receiver: oneshot::Receiver<Outcome>) -> Self {
        Self {
            request_id: Some(request_id),
            state: ResponseState::Waiting(receiver),
        }
    }

    /// A response that is already rejected; no table entry exists for it.
    pub(crate) fn failed(error: BridgeError) -> Self {
        Self {
            request_id: None,
            state: ResponseState::Failed(Some(error)),
        }
    }

    /// Correlation id, absent when the request failed before registration.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl Future for PendingResponse {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            ResponseState::Failed(error) => {
                Poll::Ready(Err(error.take().unwrap_or(BridgeError::NoLiveContext)))
            }
            ResponseState::Waiting(receiver) => Pin::new(receiver).poll(cx).map(|received| {
                received.unwrap_or_else(|_| {
                    Err(BridgeError::TornDown {
                        request_id: this.request_id.clone().unwrap_or_default(),
                    })
                })
            }),
        }
    }
}
