//! Admission of inbound events: sender identity, then origin allow-list.

use crate::channel::{RawMessageEvent, ANY_ORIGIN};
use crate::types::ContextId;
use serde::{Deserialize, Serialize};

/// Origins allowed to talk to the bridge.
///
/// Serialised as `"*"` for the wildcard or as a list of exact origin strings. A list
/// containing `"*"` behaves as the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAllowedOrigins", into = "RawAllowedOrigins")]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        AllowedOrigins::Any
    }
}

impl AllowedOrigins {
    pub fn list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowedOrigins::List(origins.into_iter().map(Into::into).collect())
    }

    pub fn is_wildcard(&self) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => origins.iter().any(|o| o == ANY_ORIGIN),
        }
    }

    /// Exact string membership. No pattern matching, subdomain or scheme inference.
    pub fn permits(&self, origin: &str) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => origins.iter().any(|o| o == ANY_ORIGIN || o == origin),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawAllowedOrigins {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<RawAllowedOrigins> for AllowedOrigins {
    type Error = String;

    fn try_from(raw: RawAllowedOrigins) -> Result<Self, Self::Error> {
        match raw {
            RawAllowedOrigins::One(origin) if origin == ANY_ORIGIN => Ok(AllowedOrigins::Any),
            RawAllowedOrigins::One(origin) if origin.trim().is_empty() => {
                Err("allowed_origins must not be an empty string".to_string())
            }
            RawAllowedOrigins::One(origin) => Ok(AllowedOrigins::List(vec![origin])),
            RawAllowedOrigins::Many(origins) if origins.len() == 1 && origins[0] == ANY_ORIGIN => {
                Ok(AllowedOrigins::Any)
            }
            RawAllowedOrigins::Many(origins) => Ok(AllowedOrigins::List(origins)),
        }
    }
}

impl From<AllowedOrigins> for RawAllowedOrigins {
    fn from(origins: AllowedOrigins) -> Self {
        match origins {
            AllowedOrigins::Any => RawAllowedOrigins::One(ANY_ORIGIN.to_string()),
            AllowedOrigins::List(list) => RawAllowedOrigins::Many(list),
        }
    }
}

/// Result of the admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The event did not come from the tracked sub-context.
    ForeignSender,
    /// The sender matched but its origin is not allowed.
    DisallowedOrigin,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }
}

/// Sender identity first, then the allow-list.
pub fn check(
    event: &RawMessageEvent,
    tracked_sender: Option<ContextId>,
    allowed: &AllowedOrigins,
) -> Admission {
    if tracked_sender != Some(event.source) {
        return Admission::ForeignSender;
    }
    if allowed.permits(&event.origin) {
        Admission::Admitted
    } else {
        Admission::DisallowedOrigin
    }
}

pub fn is_admitted(
    event: &RawMessageEvent,
    tracked_sender: Option<ContextId>,
    allowed: &AllowedOrigins,
) -> bool {
    check(event, tracked_sender, allowed).is_admitted()
}
