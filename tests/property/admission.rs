//! Admission properties over arbitrary origins and senders

use framebridge::bridge::origin::{check, is_admitted, Admission};
use framebridge::bridge::AllowedOrigins;
use framebridge::channel::RawMessageEvent;
use framebridge::types::ContextId;
use proptest::prelude::*;
use serde_json::json;

fn origin_strategy() -> impl Strategy<Value = String> {
    ("(https?)", "[a-z]{1,8}", "(\\.example|\\.test)?", "(:[0-9]{2,4})?")
        .prop_map(|(scheme, host, tld, port)| format!("{}://{}{}{}", scheme, host, tld, port))
}

proptest! {
    /// An event is admitted iff it comes from the tracked sender and its origin is
    /// listed verbatim.
    #[test]
    fn test_admission_matches_exact_membership(
        allowed in prop::collection::vec(origin_strategy(), 1..5),
        origin in origin_strategy(),
        from_tracked in any::<bool>(),
    ) {
        let tracked = ContextId::next();
        let source = if from_tracked { tracked } else { ContextId::next() };
        let event = RawMessageEvent::new(json!({"type": "notify"}), origin.clone(), source);
        let list = AllowedOrigins::List(allowed.clone());

        let expected = from_tracked && allowed.contains(&origin);
        prop_assert_eq!(is_admitted(&event, Some(tracked), &list), expected);
    }

    /// The wildcard never overrides the sender check.
    #[test]
    fn test_wildcard_still_requires_tracked_sender(origin in origin_strategy()) {
        let tracked = ContextId::next();
        let stranger = RawMessageEvent::new(json!(null), origin.clone(), ContextId::next());
        prop_assert_eq!(
            check(&stranger, Some(tracked), &AllowedOrigins::Any),
            Admission::ForeignSender
        );

        let own = RawMessageEvent::new(json!(null), origin, tracked);
        prop_assert_eq!(check(&own, Some(tracked), &AllowedOrigins::Any), Admission::Admitted);
    }

    /// A trailing slash or case change is never treated as the listed origin.
    #[test]
    fn test_near_miss_origins_are_rejected(origin in origin_strategy()) {
        let tracked = ContextId::next();
        let list = AllowedOrigins::List(vec![origin.clone()]);
        for variant in [format!("{}/", origin), origin.to_uppercase()] {
            prop_assume!(variant != origin);
            let event = RawMessageEvent::new(json!({}), variant, tracked);
            prop_assert_eq!(check(&event, Some(tracked), &list), Admission::DisallowedOrigin);
        }
    }
}
