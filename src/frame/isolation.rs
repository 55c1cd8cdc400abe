//! Isolation capability tokens applied to the embedded context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One capability granted to the sandboxed sub-context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationFlag {
    AllowScripts,
    AllowSameOrigin,
    AllowForms,
    AllowPopups,
    AllowModals,
    AllowDownloads,
    AllowTopNavigation,
    AllowPresentation,
}

impl IsolationFlag {
    pub fn token(self) -> &'static str {
        match self {
            IsolationFlag::AllowScripts => "allow-scripts",
            IsolationFlag::AllowSameOrigin => "allow-same-origin",
            IsolationFlag::AllowForms => "allow-forms",
            IsolationFlag::AllowPopups => "allow-popups",
            IsolationFlag::AllowModals => "allow-modals",
            IsolationFlag::AllowDownloads => "allow-downloads",
            IsolationFlag::AllowTopNavigation => "allow-top-navigation",
            IsolationFlag::AllowPresentation => "allow-presentation",
        }
    }
}

impl fmt::Display for IsolationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for IsolationFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "allow-scripts" => Ok(IsolationFlag::AllowScripts),
            "allow-same-origin" => Ok(IsolationFlag::AllowSameOrigin),
            "allow-forms" => Ok(IsolationFlag::AllowForms),
            "allow-popups" => Ok(IsolationFlag::AllowPopups),
            "allow-modals" => Ok(IsolationFlag::AllowModals),
            "allow-downloads" => Ok(IsolationFlag::AllowDownloads),
            "allow-top-navigation" => Ok(IsolationFlag::AllowTopNavigation),
            "allow-presentation" => Ok(IsolationFlag::AllowPresentation),
            other => Err(format!("Unknown isolation flag: {}", other)),
        }
    }
}

/// Default grant: scripts and same-origin, enough for typical embedded apps.
pub fn default_isolation_flags() -> BTreeSet<IsolationFlag> {
    [IsolationFlag::AllowScripts, IsolationFlag::AllowSameOrigin]
        .into_iter()
        .collect()
}

/// Parse a space- or comma-separated token list.
pub fn parse_isolation_flags(raw: &str) -> Result<BTreeSet<IsolationFlag>, String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(IsolationFlag::from_str)
        .collect()
}

/// Space-separated sandbox attribute value, in token order.
pub fn sandbox_attribute(flags: &BTreeSet<IsolationFlag>) -> String {
    flags
        .iter()
        .map(|flag| flag.token())
        .collect::<Vec<_>>()
        .join(" ")
}
