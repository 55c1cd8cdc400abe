//! Shared identifiers and time helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static CONTEXT_COUNTER: AtomicU64 = AtomicU64::new(1);
static BRIDGE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of one embedded sub-context.
///
/// Identities are compared, never interpreted: two events come from the same
/// sub-context iff their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate a fresh, process-unique context id.
    pub fn next() -> Self {
        ContextId(CONTEXT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Sequence number distinguishing bridge instances inside one process.
pub(crate) fn next_bridge_seq() -> u64 {
    BRIDGE_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Current time as milliseconds since Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
