//! Lifecycle of the embedded content reference.
//!
//! `FrameHost` is the single source of truth for the embedded context's address and
//! load state. Host-initiated transitions (navigate, reload, retry) enter `Loading`
//! silently; environment signals (`on_loaded`, `on_failed`) emit notifications.

use crate::events::{BridgeEvent, EventBus};
use crate::frame::isolation::IsolationFlag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Load state of the embedded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Unloaded,
    Loading,
    Loaded,
    Errored,
}

/// Snapshot returned by `frame_state()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameState {
    pub address: String,
    pub lifecycle_state: LifecycleState,
    pub last_error: Option<String>,
}

pub struct FrameHost {
    address: String,
    isolation_flags: BTreeSet<IsolationFlag>,
    state: LifecycleState,
    last_error: Option<String>,
    events: EventBus,
}

impl FrameHost {
    pub fn new(address: String, isolation_flags: BTreeSet<IsolationFlag>, events: EventBus) -> Self {
        Self {
            address,
            isolation_flags,
            state: LifecycleState::Unloaded,
            last_error: None,
            events,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn isolation_flags(&self) -> &BTreeSet<IsolationFlag> {
        &self.isolation_flags
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn state(&self) -> FrameState {
        FrameState {
            address: self.address.clone(),
            lifecycle_state: self.state,
            last_error: self.last_error.clone(),
        }
    }

    /// Point the frame at a new address. Valid from any state.
    pub fn navigate(&mut self, address: impl Into<String>) {
        self.address = address.into();
        info!(address = %self.address, from = ?self.state, "Navigating embedded frame");
        self.enter_loading();
    }

    /// Re-enter `Loading` with the current address.
    pub fn reload(&mut self) {
        info!(address = %self.address, from = ?self.state, "Reloading embedded frame");
        self.enter_loading();
    }

    /// Same transition as `reload`, typically invoked after `Errored`.
    pub fn retry(&mut self) {
        info!(address = %self.address, from = ?self.state, "Retrying embedded frame");
        self.enter_loading();
    }

    /// The sub-context signalled a successful load.
    pub fn on_loaded(&mut self) {
        match self.state {
            LifecycleState::Loading => {
                self.state = LifecycleState::Loaded;
                self.last_error = None;
                info!(address = %self.address, "Embedded frame loaded");
                self.events.emit(BridgeEvent::FrameLoaded {
                    address: self.address.clone(),
                });
            }
            other => {
                warn!(
                    address = %self.address,
                    state = ?other,
                    "Ignoring load signal outside of Loading state"
                );
            }
        }
    }

    /// The sub-context failed to load.
    pub fn on_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        match self.state {
            LifecycleState::Loading => {
                self.state = LifecycleState::Errored;
                self.last_error = Some(reason.clone());
                warn!(address = %self.address, reason = %reason, "Embedded frame failed to load");
                self.events.emit(BridgeEvent::FrameError {
                    address: self.address.clone(),
                    reason,
                });
            }
            other => {
                warn!(
                    address = %self.address,
                    state = ?other,
                    reason = %reason,
                    "Ignoring failure signal outside of Loading state"
                );
            }
        }
    }

    /// Return to `Unloaded` when the owning widget detaches.
    pub fn unload(&mut self) {
        self.state = LifecycleState::Unloaded;
        self.last_error = None;
    }

    fn enter_loading(&mut self) {
        self.state = LifecycleState::Loading;
        self.last_error = None;
    }
}
