//! In-memory player and location
//!
//! A virtual-clock stand-in for the replay player, used to dry-run an
//! annotation document without a browser.

use super::player::{LocationHash, PlayerHandle};

#[derive(Debug, Clone, Default)]
pub struct SimulatedPlayer {
    time: u64,
    duration: Option<u64>,
    playing: bool,
    /// Every seek target, in order
    seeks: Vec<u64>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player that stops on its own once `duration` is reached
    pub fn with_duration(duration: u64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Move the clock forward by `ms` if playing.
    pub fn advance(&mut self, ms: u64) {
        if !self.playing {
            return;
        }
        self.time = self.time.saturating_add(ms);
        if let Some(duration) = self.duration {
            if self.time >= duration {
                self.time = duration;
                self.playing = false;
            }
        }
    }

    /// Jump without going through `goto`, as a user scrubbing the native
    /// controls would.
    pub fn set_time(&mut self, ms: u64) {
        self.time = ms;
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn seeks(&self) -> &[u64] {
        &self.seeks
    }

    pub fn is_finished(&self) -> bool {
        self.duration.is_some_and(|duration| self.time >= duration)
    }
}

impl PlayerHandle for SimulatedPlayer {
    fn goto(&mut self, ms: u64) {
        self.time = match self.duration {
            Some(duration) => ms.min(duration),
            None => ms,
        };
        self.seeks.push(ms);
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_time(&self) -> Option<u64> {
        Some(self.time)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    fragment: Option<String>,
    writes: Vec<String>,
}

impl MemoryLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location opened with `#<fragment>`, as from a shared link
    pub fn with_fragment(fragment: impl Into<String>) -> Self {
        Self {
            fragment: Some(fragment.into()),
            writes: Vec::new(),
        }
    }

    /// Replace the fragment without recording a write, as the browser's
    /// back button would.
    pub fn set_fragment(&mut self, fragment: impl Into<String>) {
        self.fragment = Some(fragment.into());
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }
}

impl LocationHash for MemoryLocation {
    fn read(&self) -> Option<String> {
        self.fragment.clone().filter(|fragment| !fragment.is_empty())
    }

    fn write(&mut self, id: &str) {
        self.fragment = Some(id.to_string());
        self.writes.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_only_moves_while_playing() {
        let mut player = SimulatedPlayer::new();
        player.advance(500);
        assert_eq!(player.time(), 0);
        player.play();
        player.advance(500);
        assert_eq!(player.time(), 500);
    }

    #[test]
    fn test_stops_at_duration() {
        let mut player = SimulatedPlayer::with_duration(1000);
        player.play();
        player.advance(1500);
        assert_eq!(player.time(), 1000);
        assert!(!player.is_playing());
        assert!(player.is_finished());
    }

    #[test]
    fn test_location_writes_recorded() {
        let mut location = MemoryLocation::new();
        assert_eq!(location.read(), None);
        location.write("intro");
        assert_eq!(location.read().as_deref(), Some("intro"));
        assert_eq!(location.writes(), ["intro".to_string()]);
    }
}
