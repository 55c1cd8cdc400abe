//! Inbound admission: sender identity and origin allow-list

use super::test_utils::{attach, drain_messages, settle, trusted_config, TRUSTED};
use framebridge::bridge::{Admission, AllowedOrigins, RouteOutcome};
use framebridge::channel::{ContextChannel, MemoryChannel, RawMessageEvent};
use framebridge::config::BridgeConfig;
use framebridge::events::BridgeEvent;
use framebridge::InboundOutcome;
use serde_json::json;

#[tokio::test]
async fn test_trusted_notification_is_surfaced() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    h.hub
        .post(h.channel.event(json!({"type": "bridge:resize", "payload": {"height": 320}})));
    settle().await;

    let messages = drain_messages(&mut h.events);
    assert_eq!(
        messages,
        vec![BridgeEvent::FrameMessage {
            message_type: "bridge:resize".to_string(),
            payload: json!({"height": 320}),
            origin: TRUSTED.to_string(),
            request_id: None,
        }]
    );
}

#[tokio::test]
async fn test_disallowed_origin_is_dropped_silently() {
    let mut h = attach(trusted_config(), "https://evil.example", false);
    h.hub.post(h.channel.event(json!({"type": "notify", "payload": {}})));
    settle().await;

    assert!(drain_messages(&mut h.events).is_empty());
    assert_eq!(h.bridge.stats().disallowed_origin, 1);
    // Nothing is posted back to the sender.
    assert!(h.channel.posted().is_empty());
}

#[tokio::test]
async fn test_foreign_sender_is_dropped_even_with_allowed_origin() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    let impostor = MemoryChannel::new(TRUSTED);
    h.hub.post(impostor.event(json!({"type": "notify", "payload": {}})));
    settle().await;

    assert!(drain_messages(&mut h.events).is_empty());
    assert_eq!(h.bridge.stats().foreign_sender, 1);
}

#[tokio::test]
async fn test_wildcard_admits_any_origin_from_tracked_sender() {
    let mut h = attach(BridgeConfig::new("https://any.example/app"), "https://any.example", false);
    assert!(h.bridge.allowed_origins().is_wildcard());

    h.hub.post(RawMessageEvent::new(
        json!({"type": "notify", "payload": 1}),
        "https://elsewhere.example",
        h.channel.id(),
    ));
    settle().await;
    assert_eq!(drain_messages(&mut h.events).len(), 1);
}

#[tokio::test]
async fn test_origin_comparison_is_exact() {
    let h = attach(trusted_config(), TRUSTED, false);
    for origin in [
        "https://trusted.example/",
        "http://trusted.example",
        "https://trusted.example:443",
        "https://TRUSTED.example",
    ] {
        let event = RawMessageEvent::new(json!({"type": "notify"}), origin, h.channel.id());
        assert_eq!(
            h.bridge.handle_event(event),
            InboundOutcome::Rejected(Admission::DisallowedOrigin),
            "{origin} should not match"
        );
    }
}

#[tokio::test]
async fn test_reconfigured_allow_list_applies_to_next_event() {
    let h = attach(trusted_config(), TRUSTED, false);
    h.bridge
        .set_allowed_origins(AllowedOrigins::list(["https://other.example"]));
    assert_eq!(
        h.bridge.handle_event(h.channel.event(json!({"type": "notify"}))),
        InboundOutcome::Rejected(Admission::DisallowedOrigin)
    );

    h.bridge.set_allowed_origins(AllowedOrigins::list([TRUSTED]));
    assert_eq!(
        h.bridge.handle_event(h.channel.event(json!({"type": "notify"}))),
        InboundOutcome::Routed(RouteOutcome::Notified)
    );
}

#[tokio::test]
async fn test_messages_outside_namespace_are_not_surfaced() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    for data in [
        json!({"type": "analytics:track", "payload": {}}),
        json!({"type": "notification", "payload": {}}),
        json!("bridge:string-payload"),
        json!({"payload": {}}),
    ] {
        h.hub.post(h.channel.event(data));
    }
    settle().await;

    assert!(drain_messages(&mut h.events).is_empty());
    let stats = h.bridge.stats();
    assert_eq!(stats.ignored, 2);
    assert_eq!(stats.malformed, 2);
}

#[tokio::test]
async fn test_listed_wildcard_admits_notification() {
    let config = BridgeConfig::new("https://any.example/app")
        .with_allowed_origins(AllowedOrigins::list(["*"]));
    let mut h = attach(config, "https://whoever.example", false);
    h.hub
        .post(h.channel.event(json!({"type": "notify", "payload": {"a": 1}})));
    settle().await;

    match drain_messages(&mut h.events).as_slice() {
        [BridgeEvent::FrameMessage { payload, .. }] => assert_eq!(payload, &json!({"a": 1})),
        other => panic!("expected one frame-message, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_inadmissible_responses_never_settle_requests() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    let response = h.bridge.request("bridge:getState", json!({}), Some(1000));
    let request_id = response.request_id().unwrap().to_string();
    let reply = json!({"requestId": request_id, "payload": {"forged": true}});

    h.hub.post(RawMessageEvent::new(
        reply.clone(),
        "https://evil.example",
        h.channel.id(),
    ));
    let impostor = MemoryChannel::new(TRUSTED);
    h.hub.post(impostor.event(reply));
    settle().await;

    assert_eq!(h.bridge.pending_count(), 1);
    let stats = h.bridge.stats();
    assert_eq!(stats.responses, 0);
    assert_eq!(stats.disallowed_origin, 1);
    assert_eq!(stats.foreign_sender, 1);
    assert!(drain_messages(&mut h.events).is_empty());

    let error = response.await.unwrap_err();
    assert!(error.is_timeout(), "unexpected {error:?}");
    assert_eq!(h.bridge.pending_count(), 0);
}
