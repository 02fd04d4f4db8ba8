//! Keyboard shortcuts
//!
//! `ArrowRight` jumps to the next annotation, `ArrowLeft` to the previous one
//! and the space bar toggles playback. Keys typed into form fields never reach
//! the engine; the host filters them with [`is_editable_target`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyCommand {
    NextAnnotation,
    PreviousAnnotation,
    TogglePlayPause,
}

impl KeyCommand {
    /// Map a `KeyboardEvent.key` value to a command
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" => Some(KeyCommand::NextAnnotation),
            "ArrowLeft" => Some(KeyCommand::PreviousAnnotation),
            " " | "Spacebar" => Some(KeyCommand::TogglePlayPause),
            _ => None,
        }
    }
}

/// Whether a key event from an element with this tag name belongs to a form
/// field rather than to the player.
pub fn is_editable_target(tag_name: &str) -> bool {
    tag_name.eq_ignore_ascii_case("input") || tag_name.eq_ignore_ascii_case("textarea")
}
