use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest actor name kept in a record, in characters
pub const MAX_ACTOR_NAME_LEN: usize = 63;

/// The persisted state of one gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRecord {
    /// Fixed identifier naming the gate
    pub key: String,
    /// Whether the reward has ever been dispensed
    pub granted: bool,
    /// Epoch seconds of the most recent grant or loot, 0 when never granted
    #[serde(default)]
    pub granted_at: u64,
    /// Sanitized name of the most recent kill-phase or loot-phase actor
    #[serde(default)]
    pub last_actor: Option<String>,
}

impl GateRecord {
    /// A fresh, never-granted record
    pub fn new(key: impl Into<String>) -> Self {
        GateRecord {
            key: key.into(),
            granted: false,
            granted_at: 0,
            last_actor: None,
        }
    }

    /// Clear the grant and all metadata
    pub(crate) fn clear(&mut self) {
        self.granted = false;
        self.granted_at = 0;
        self.last_actor = None;
    }

    /// Stamp time and actor without touching `granted`
    pub(crate) fn stamp(&mut self, actor: Option<String>, now: u64) {
        self.granted_at = now;
        self.last_actor = actor;
    }
}

impl fmt::Display for GateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} granted={} at={} by={}",
            self.key,
            self.granted,
            self.granted_at,
            self.last_actor.as_deref().unwrap_or("-")
        )
    }
}

/// Bound and clean an actor name before it is persisted.
///
/// Empty names map to `None`. Names are cut to [`MAX_ACTOR_NAME_LEN`]
/// characters and quote or control characters become `_`.
pub fn sanitize_actor_name(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }

    let cleaned = name
        .chars()
        .take(MAX_ACTOR_NAME_LEN)
        .map(|c| {
            if c == '\'' || c == '"' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    Some(cleaned)
}
