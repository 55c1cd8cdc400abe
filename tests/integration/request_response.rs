//! Correlated request/response exchanges

use super::test_utils::{attach, drain_messages, settle, trusted_config, TRUSTED};
use framebridge::bridge::RouteOutcome;
use framebridge::channel::ANY_ORIGIN;
use framebridge::{BridgeError, InboundOutcome};
use serde_json::json;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_request_resolves_with_response_payload() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    let response = h
        .bridge
        .request("bridge:getState", json!({"key": "theme"}), Some(1000));

    let posted = h.channel.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].target_origin, ANY_ORIGIN);
    let request_id = posted[0].message.request_id.clone().unwrap();
    assert_eq!(response.request_id(), Some(request_id.as_str()));
    assert_eq!(posted[0].message.message_type, "bridge:getState");

    // A bare response without `type` is accepted.
    h.hub.post(h.channel.event(json!({
        "requestId": request_id,
        "payload": {"theme": "dark"},
    })));

    let value = response.await.unwrap();
    assert_eq!(value, json!({"theme": "dark"}));
    assert_eq!(h.bridge.pending_count(), 0);
    assert!(drain_messages(&mut h.events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_request_times_out_without_response() {
    let h = attach(trusted_config(), TRUSTED, false);
    let started = tokio::time::Instant::now();
    let error = h
        .bridge
        .request("bridge:getState", json!({}), Some(1000))
        .await
        .unwrap_err();

    assert!(error.is_timeout());
    assert!(started.elapsed() >= Duration::from_millis(1000));
    assert_eq!(h.bridge.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_applies() {
    let h = attach(trusted_config().with_request_timeout_ms(5000), TRUSTED, false);
    let started = tokio::time::Instant::now();
    let error = h
        .bridge
        .request_default("bridge:getState", json!({}))
        .await
        .unwrap_err();

    match error {
        BridgeError::Timeout { timeout_ms, .. } => assert_eq!(timeout_ms, 5000),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_millis(5000));
}

#[tokio::test(start_paused = true)]
async fn test_late_response_after_timeout_is_ignored() {
    let mut h = attach(trusted_config(), TRUSTED, false);
    let response = h.bridge.request("bridge:slow", json!({}), Some(100));
    let request_id = response.request_id().unwrap().to_string();
    assert!(response.await.unwrap_err().is_timeout());

    // The late reply carries a namespaced type but its id is no longer live, so it
    // falls through to notification routing instead of settling anything.
    let outcome = h.bridge.handle_event(h.channel.event(json!({
        "type": "bridge:slow",
        "requestId": request_id,
        "payload": 1,
    })));
    assert_eq!(outcome, InboundOutcome::Routed(RouteOutcome::Notified));
    assert_eq!(h.bridge.stats().responses, 0);

    let late = h.bridge.handle_event(h.channel.event(json!({
        "requestId": request_id,
        "payload": 1,
    })));
    assert_eq!(late, InboundOutcome::Routed(RouteOutcome::Malformed));
    assert_eq!(drain_messages(&mut h.events).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_response_settles_once() {
    let h = attach(trusted_config(), TRUSTED, false);
    let response = h.bridge.request("bridge:ping", json!({}), Some(1000));
    let request_id = response.request_id().unwrap().to_string();

    let first = h.bridge.handle_event(h.channel.event(json!({
        "requestId": request_id, "payload": "first"
    })));
    let second = h.bridge.handle_event(h.channel.event(json!({
        "requestId": request_id, "payload": "second"
    })));

    assert_eq!(first, InboundOutcome::Routed(RouteOutcome::Resolved(request_id.clone())));
    assert_eq!(second, InboundOutcome::Routed(RouteOutcome::Malformed));
    assert_eq!(response.await.unwrap(), json!("first"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_use_distinct_ids() {
    let h = attach(trusted_config(), TRUSTED, true);
    let responses: Vec<_> = (0..5)
        .map(|seq| h.bridge.request("bridge:echo", json!({"seq": seq}), Some(1000)))
        .collect();

    let mut ids: Vec<String> = responses
        .iter()
        .map(|r| r.request_id().unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);

    let results = futures::future::join_all(responses).await;
    for (seq, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!({"seq": seq}));
    }
}

#[tokio::test]
async fn test_request_without_context_rejects_immediately() {
    let (bridge, _events) = framebridge::FrameBridge::new(&trusted_config());
    let error = bridge
        .request("bridge:ping", json!({}), Some(1000))
        .await
        .unwrap_err();
    assert_eq!(error, BridgeError::NoLiveContext);
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_send_message_respects_target_origin() {
    let h = attach(trusted_config(), TRUSTED, false);
    assert!(h.bridge.send_message("bridge:hello", json!({"a": 1}), None));
    assert!(h
        .bridge
        .send_message("bridge:hello", json!({"a": 2}), Some("https://other.example")));
    settle().await;

    let posted = h.channel.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].message.payload, json!({"a": 1}));
    assert!(posted[0].message.request_id.is_none());
    assert_eq!(h.bridge.stats().sent, 2);
}

#[tokio::test(start_paused = true)]
async fn test_responses_in_reverse_order_resolve_their_own_futures() {
    let h = attach(trusted_config(), TRUSTED, false);
    let responses: Vec<_> = (0..4)
        .map(|seq| h.bridge.request("bridge:work", json!({"seq": seq}), Some(5000)))
        .collect();
    let ids: Vec<String> = responses
        .iter()
        .map(|r| r.request_id().unwrap().to_string())
        .collect();

    for (seq, id) in ids.iter().enumerate().rev() {
        h.hub.post(h.channel.event(json!({
            "type": "bridge:work",
            "requestId": id,
            "payload": {"answer": seq},
        })));
    }

    let results = futures::future::join_all(responses).await;
    for (seq, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!({"answer": seq}));
    }
    assert_eq!(h.bridge.stats().responses, 4);
    assert_eq!(h.bridge.stats().notifications, 0);
}
