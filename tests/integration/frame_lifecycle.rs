//! Embedded frame lifecycle as observed through the bridge

use super::test_utils::{attach, trusted_config, ADDRESS, TRUSTED};
use framebridge::events::BridgeEvent;
use framebridge::{FrameBridge, LifecycleState};

#[tokio::test]
async fn test_load_failure_then_retry_then_success() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    assert_eq!(h.bridge.lifecycle_state(), LifecycleState::Loading);

    h.bridge.on_failed("net::ERR_NAME_NOT_RESOLVED");
    let state = h.bridge.frame_state();
    assert_eq!(state.lifecycle_state, LifecycleState::Errored);
    assert_eq!(state.last_error.as_deref(), Some("net::ERR_NAME_NOT_RESOLVED"));
    assert_eq!(
        h.events.try_recv().unwrap(),
        BridgeEvent::FrameError {
            address: ADDRESS.to_string(),
            reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        }
    );

    h.bridge.retry();
    let state = h.bridge.frame_state();
    assert_eq!(state.lifecycle_state, LifecycleState::Loading);
    assert_eq!(state.last_error, None);
    // Entering Loading is silent.
    assert!(h.events.try_recv().is_err());

    h.bridge.on_loaded();
    assert_eq!(h.bridge.lifecycle_state(), LifecycleState::Loaded);
    assert_eq!(
        h.events.try_recv().unwrap(),
        BridgeEvent::FrameLoaded {
            address: ADDRESS.to_string(),
        }
    );
}

#[tokio::test]
async fn test_navigate_changes_address_and_reloads() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    h.bridge.on_loaded();
    let _ = h.events.try_recv();

    h.bridge.navigate("https://trusted.example/other");
    assert_eq!(h.bridge.lifecycle_state(), LifecycleState::Loading);
    h.bridge.on_loaded();
    assert_eq!(
        h.events.try_recv().unwrap(),
        BridgeEvent::FrameLoaded {
            address: "https://trusted.example/other".to_string(),
        }
    );

    h.bridge.reload();
    assert_eq!(h.bridge.lifecycle_state(), LifecycleState::Loading);
    assert_eq!(h.bridge.frame_state().address, "https://trusted.example/other");
}

#[tokio::test]
async fn test_signals_outside_loading_are_ignored() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    h.bridge.on_loaded();
    let _ = h.events.try_recv();

    h.bridge.on_failed("late failure");
    h.bridge.on_loaded();
    assert_eq!(h.bridge.lifecycle_state(), LifecycleState::Loaded);
    assert_eq!(h.bridge.frame_state().last_error, None);
    assert!(h.events.try_recv().is_err());
}

#[test]
fn test_new_bridge_starts_unloaded() {
    let (bridge, _events) = FrameBridge::new(&trusted_config());
    assert_eq!(bridge.lifecycle_state(), LifecycleState::Unloaded);
    assert_eq!(bridge.frame_state().address, ADDRESS);
    assert!(!bridge.is_attached());
}

#[tokio::test]
async fn test_every_reentry_from_errored_clears_last_error() {
    let h = attach(trusted_config(), TRUSTED, false);
    let reentries: [&dyn Fn(&FrameBridge); 3] = [
        &|b| b.retry(),
        &|b| b.reload(),
        &|b| b.navigate("https://trusted.example/fallback"),
    ];
    for reenter in reentries {
        h.bridge.on_failed("timeout");
        assert_eq!(h.bridge.lifecycle_state(), LifecycleState::Errored);
        reenter(&h.bridge);
        let state = h.bridge.frame_state();
        assert_eq!(state.lifecycle_state, LifecycleState::Loading);
        assert_eq!(state.last_error, None);
    }
}
