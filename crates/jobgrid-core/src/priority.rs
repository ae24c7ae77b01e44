//! Job priorities.
//!
//! Priorities use the raw values the task runtime already stores in its
//! job headers, so a raw byte read off a job converts losslessly for every
//! known level. Higher values run first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scheduling weight of a job, from background work up to user-interactive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum JobPriority {
    Unspecified = 0x00,
    Background = 0x09,
    Utility = 0x11,
    #[default]
    Default = 0x15,
    UserInitiated = 0x19,
    UserInteractive = 0x21,
}

impl JobPriority {
    /// Every level, lowest first.
    pub const ALL: [JobPriority; 6] = [
        JobPriority::Unspecified,
        JobPriority::Background,
        JobPriority::Utility,
        JobPriority::Default,
        JobPriority::UserInitiated,
        JobPriority::UserInteractive,
    ];

    /// Convert a raw priority byte.
    ///
    /// Values between two levels round down to the lower one; values above
    /// the highest level clamp to [`JobPriority::UserInteractive`].
    pub fn from_raw(raw: u8) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| level.raw() <= raw)
            .unwrap_or(JobPriority::Unspecified)
    }

    /// The raw priority byte.
    pub fn raw(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            JobPriority::Unspecified => "unspecified",
            JobPriority::Background => "background",
            JobPriority::Utility => "utility",
            JobPriority::Default => "default",
            JobPriority::UserInitiated => "user-initiated",
            JobPriority::UserInteractive => "user-interactive",
        }
    }
}

impl From<u8> for JobPriority {
    fn from(raw: u8) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
