//! Navigation between annotations
//!
//! Six sources can move playback to an annotation. Each one treats the
//! triggered set, the location fragment, playback and the overlay
//! differently; [`TriggerPolicy`] is the single table describing how.
//!
//! | Source        | Triggered set          | Fragment | Pause         | Overlay          |
//! |---------------|------------------------|----------|---------------|------------------|
//! | `keyboard`    | clear, mark target     | yes      | always        | if highlight     |
//! | `toc`         | clear, mark target     | yes      | on request    | if highlight     |
//! | `marker`      | clear, mark target     | yes      | on request    | if highlight     |
//! | `hash`        | mark all up to target  | no       | on request    | if highlight     |
//! | `playback`    | mark target            | yes      | if autopause  | if highlight     |
//! | `progressBar` | untouched              | no       | always        | closed           |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RehearseurError;

pub mod engine;
pub mod keyboard;
pub mod player;
pub mod simulation;

pub use engine::{NavigationEngine, NavigationState};
pub use keyboard::KeyCommand;
pub use player::{LocationHash, PlayerHandle};
pub use simulation::{MemoryLocation, SimulatedPlayer};

/// Where a navigation request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationSource {
    Keyboard,
    Hash,
    Playback,
    Toc,
    Marker,
    ProgressBar,
}

impl NavigationSource {
    pub const ALL: [NavigationSource; 6] = [
        NavigationSource::Keyboard,
        NavigationSource::Hash,
        NavigationSource::Playback,
        NavigationSource::Toc,
        NavigationSource::Marker,
        NavigationSource::ProgressBar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationSource::Keyboard => "keyboard",
            NavigationSource::Hash => "hash",
            NavigationSource::Playback => "playback",
            NavigationSource::Toc => "toc",
            NavigationSource::Marker => "marker",
            NavigationSource::ProgressBar => "progressBar",
        }
    }

    pub fn policy(&self) -> TriggerPolicy {
        TriggerPolicy::for_source(*self)
    }
}

impl fmt::Display for NavigationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NavigationSource {
    type Err = RehearseurError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NavigationSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| RehearseurError::UnknownSource(s.to_string()))
    }
}

/// What a navigation does to the set of already-handled annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggeredSetEffect {
    /// Forget everything, then mark the target
    ResetToTarget,
    /// Mark the target and every annotation at or before its timestamp
    MarkThroughTarget,
    /// Mark the target only
    MarkTarget,
    Untouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseRule {
    Always,
    /// Only when the caller passes `should_pause`
    OnRequest,
    /// When the caller asks, or when the annotation's autopause resolves true
    Autopause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayRule {
    /// Open for annotations carrying a highlight script, close otherwise
    IfHighlightScript,
    ForceClosed,
}

/// Side effects of navigating from one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPolicy {
    pub triggered: TriggeredSetEffect,
    pub updates_location: bool,
    pub pause: PauseRule,
    pub overlay: OverlayRule,
}

impl TriggerPolicy {
    pub const fn for_source(source: NavigationSource) -> Self {
        use NavigationSource::*;

        match source {
            Keyboard => TriggerPolicy {
                triggered: TriggeredSetEffect::ResetToTarget,
                updates_location: true,
                pause: PauseRule::Always,
                overlay: OverlayRule::IfHighlightScript,
            },
            Toc | Marker => TriggerPolicy {
                triggered: TriggeredSetEffect::ResetToTarget,
                updates_location: true,
                pause: PauseRule::OnRequest,
                overlay: OverlayRule::IfHighlightScript,
            },
            Hash => TriggerPolicy {
                triggered: TriggeredSetEffect::MarkThroughTarget,
                updates_location: false,
                pause: PauseRule::OnRequest,
                overlay: OverlayRule::IfHighlightScript,
            },
            Playback => TriggerPolicy {
                triggered: TriggeredSetEffect::MarkTarget,
                updates_location: true,
                pause: PauseRule::Autopause,
                overlay: OverlayRule::IfHighlightScript,
            },
            ProgressBar => TriggerPolicy {
                triggered: TriggeredSetEffect::Untouched,
                updates_location: false,
                pause: PauseRule::Always,
                overlay: OverlayRule::ForceClosed,
            },
        }
    }
}
