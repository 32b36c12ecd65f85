//! View selector state for the two dashboard panels

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two topic areas a citizen can ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Insights,
    Services,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Insights => "insights",
            Topic::Services => "services",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-page view state: which panel is currently shown.
///
/// A fresh session starts on the insights panel and changes only through
/// `select`. The transition is pure and total, so repeated clicks on either
/// navigation control are harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    current_section: Topic,
}

impl Session {
    pub fn new() -> Self {
        Self {
            current_section: Topic::Insights,
        }
    }

    /// Switch to the given panel
    #[must_use]
    pub fn select(self, topic: Topic) -> Self {
        Self {
            current_section: topic,
        }
    }

    pub fn current_section(&self) -> Topic {
        self.current_section
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
