//! Navigation engine
//!
//! Owns the player handle and every piece of navigation state. Each trigger
//! source (keyboard, fragment, playback, table of contents, marker, progress
//! bar) goes through one of the methods here, so the player, the overlay and
//! the location fragment always agree.
//!
//! The engine is single-threaded. All calls arrive one at a time from the
//! host's event loop (a timer tick, a key press, a click); hosts that drive
//! it from several threads must put it behind one mutex.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::keyboard::KeyCommand;
use super::player::{LocationHash, PlayerHandle};
use super::{NavigationSource, OverlayRule, PauseRule, TriggeredSetEffect};
use crate::annotations::{find_by_id, next_annotation, previous_annotation, Annotation, AnnotationFile};
use crate::config::PlayerConfig;

/// Snapshot of the engine state for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub current_time: u64,
    pub is_playing: bool,
    pub active_annotation: Option<Annotation>,
    /// Ids of annotations already handled in this pass, sorted
    pub triggered: Vec<String>,
}

pub struct NavigationEngine<P, L> {
    config: PlayerConfig,
    player: Option<P>,
    location: L,
    /// Sorted by timestamp
    annotations: Vec<Annotation>,
    current_time: u64,
    is_playing: bool,
    active_annotation: Option<Annotation>,
    triggered: HashSet<String>,
    /// Previous time sample, used to detect backward seeks
    last_sampled_time: u64,
    initial_hash_handled: bool,
}

impl<P: PlayerHandle, L: LocationHash> NavigationEngine<P, L> {
    /// Create an engine with no player attached yet.
    pub fn new(config: PlayerConfig, file: &AnnotationFile, location: L) -> Self {
        Self {
            config,
            player: None,
            location,
            annotations: file.annotations.clone(),
            current_time: 0,
            is_playing: false,
            active_annotation: None,
            triggered: HashSet::new(),
            last_sampled_time: 0,
            initial_hash_handled: false,
        }
    }

    /// Create an engine whose player is already ready.
    pub fn with_player(config: PlayerConfig, file: &AnnotationFile, player: P, location: L) -> Self {
        let mut engine = Self::new(config, file, location);
        engine.attach_player(player);
        engine
    }

    /// The player is ready; every command becomes live.
    pub fn attach_player(&mut self, player: P) {
        self.is_playing = player.is_playing();
        self.player = Some(player);
    }

    /// The player is being torn down; every command becomes a no-op again.
    pub fn detach_player(&mut self) -> Option<P> {
        self.is_playing = false;
        self.active_annotation = None;
        self.player.take()
    }

    /// Replace the annotation set. Nothing carries over from the previous
    /// document.
    pub fn load_document(&mut self, file: &AnnotationFile) {
        self.annotations = file.annotations.clone();
        self.triggered.clear();
        self.active_annotation = None;
        self.last_sampled_time = self.current_time;
        self.initial_hash_handled = false;
        debug!(annotations = self.annotations.len(), "annotation document replaced");
    }

    /// Move playback to `annotation` with the side effects of `source`.
    pub fn navigate_to_annotation(
        &mut self,
        annotation: &Annotation,
        source: NavigationSource,
        should_pause: bool,
    ) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let policy = source.policy();

        match policy.triggered {
            TriggeredSetEffect::ResetToTarget => {
                self.triggered.clear();
                self.triggered.insert(annotation.id.clone());
            }
            TriggeredSetEffect::MarkThroughTarget => {
                for earlier in &self.annotations {
                    if earlier.timestamp <= annotation.timestamp {
                        self.triggered.insert(earlier.id.clone());
                    }
                }
                // The target itself may not be part of the loaded list
                self.triggered.insert(annotation.id.clone());
            }
            TriggeredSetEffect::MarkTarget => {
                self.triggered.insert(annotation.id.clone());
            }
            TriggeredSetEffect::Untouched => {}
        }

        player.goto(annotation.timestamp);
        // Keeps the backward-seek detector from reading this jump as a scrub
        self.last_sampled_time = annotation.timestamp;

        if policy.updates_location {
            self.location.write(&annotation.id);
        }

        self.active_annotation = match policy.overlay {
            OverlayRule::IfHighlightScript if annotation.has_highlight_script() => {
                Some(annotation.clone())
            }
            _ => None,
        };

        let pause = match policy.pause {
            PauseRule::Always => true,
            PauseRule::OnRequest => should_pause,
            PauseRule::Autopause => {
                should_pause || annotation.should_autopause(self.config.default_autopause)
            }
        };
        if pause {
            player.pause();
            self.is_playing = false;
        }

        debug!(
            id = %annotation.id,
            timestamp = annotation.timestamp,
            source = %source,
            paused = pause,
            overlay = self.active_annotation.is_some(),
            "navigated to annotation"
        );
    }

    /// Navigate to the annotation with `id`. Returns `false` when the id is
    /// not in the loaded document.
    pub fn navigate_to_id(&mut self, id: &str, source: NavigationSource, should_pause: bool) -> bool {
        match find_by_id(&self.annotations, id).cloned() {
            Some(annotation) => {
                self.navigate_to_annotation(&annotation, source, should_pause);
                true
            }
            None => false,
        }
    }

    /// Scrub to `time_ms` from the progress bar.
    ///
    /// Annotations after the target are re-armed; those at or before it keep
    /// whatever state they had.
    pub fn seek_to(&mut self, time_ms: u64) {
        let Some(player) = self.player.as_mut() else {
            return;
        };

        player.goto(time_ms);
        self.active_annotation = None;

        for annotation in &self.annotations {
            if annotation.timestamp > time_ms {
                self.triggered.remove(&annotation.id);
            }
        }

        debug!(time_ms, "seeked from progress bar");
    }

    /// Fire every annotation playback has just reached.
    ///
    /// Called once per polling tick with the sampled player time.
    pub fn check_annotation_triggers(&mut self, time_ms: u64) {
        let Some(player) = self.player.as_ref() else {
            return;
        };

        if !player.is_playing() {
            self.last_sampled_time = time_ms;
            return;
        }

        let backward_limit = self
            .last_sampled_time
            .saturating_sub(self.config.seeking_backward_threshold_ms);
        if time_ms < backward_limit {
            debug!(
                from = self.last_sampled_time,
                to = time_ms,
                "backward seek during playback, re-arming annotations"
            );
            self.triggered.clear();
        }
        self.last_sampled_time = time_ms;

        let showing = self.active_annotation.as_ref().map(|active| active.id.clone());
        let threshold = self.config.trigger_threshold_ms;

        // Index loop: each navigation mutates the triggered set the next
        // iteration reads.
        for index in 0..self.annotations.len() {
            let annotation = &self.annotations[index];
            if showing.as_deref() == Some(annotation.id.as_str()) {
                continue;
            }
            if time_ms.abs_diff(annotation.timestamp) >= threshold {
                continue;
            }
            if self.triggered.contains(&annotation.id) {
                continue;
            }

            trace!(id = %annotation.id, time_ms, "playback reached annotation");
            let annotation = annotation.clone();
            self.navigate_to_annotation(&annotation, NavigationSource::Playback, false);
        }
    }

    /// One polling tick: sample the player and evaluate triggers.
    pub fn tick(&mut self) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let Some(time) = player.current_time() else {
            return;
        };

        self.current_time = time;
        self.is_playing = player.is_playing();
        self.check_annotation_triggers(time);
    }

    /// Close the overlay. Playback position and triggered set are untouched.
    pub fn dismiss_overlay(&mut self) {
        self.active_annotation = None;
    }

    pub fn play(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.play();
        self.is_playing = true;
        self.active_annotation = None;
    }

    pub fn pause(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.pause();
        self.is_playing = false;
    }

    /// Flip playback based on the player's own flag, not the cached one,
    /// which may be stale after the user used the player's native controls.
    pub fn toggle_play_pause(&mut self) {
        let Some(player) = self.player.as_ref() else {
            return;
        };

        if player.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Apply the annotation named by the location fragment.
    ///
    /// The initial navigation (`initial == true`) happens at most once per
    /// document; later fragment changes always navigate. Returns whether a
    /// navigation took place.
    pub fn navigate_to_hash(&mut self, initial: bool) -> bool {
        if self.player.is_none() || self.annotations.is_empty() {
            return false;
        }
        if initial && self.initial_hash_handled {
            return false;
        }

        let Some(fragment) = self.location.read() else {
            return false;
        };
        let id = match urlencoding::decode(&fragment) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => fragment,
        };

        let Some(annotation) = find_by_id(&self.annotations, &id).cloned() else {
            warn!(%id, "location fragment does not name an annotation");
            return false;
        };

        if initial {
            self.initial_hash_handled = true;
        }
        self.navigate_to_annotation(&annotation, NavigationSource::Hash, false);
        true
    }

    /// Dispatch a key press. Returns `true` when the key was handled and the
    /// host should suppress its default action.
    pub fn handle_key(&mut self, key: &str) -> bool {
        if self.player.is_none() {
            return false;
        }
        let Some(command) = KeyCommand::from_key(key) else {
            return false;
        };

        match command {
            KeyCommand::NextAnnotation => {
                if let Some(next) = next_annotation(&self.annotations, self.current_time).cloned() {
                    self.navigate_to_annotation(&next, NavigationSource::Keyboard, false);
                }
            }
            KeyCommand::PreviousAnnotation => {
                // Skip the annotation playback has only just passed
                let before = self.current_time.checked_sub(self.config.trigger_threshold_ms);
                let previous = before
                    .and_then(|before| previous_annotation(&self.annotations, before))
                    .cloned();
                if let Some(previous) = previous {
                    self.navigate_to_annotation(&previous, NavigationSource::Keyboard, false);
                }
            }
            KeyCommand::TogglePlayPause => self.toggle_play_pause(),
        }

        true
    }

    pub fn state(&self) -> NavigationState {
        let mut triggered: Vec<String> = self.triggered.iter().cloned().collect();
        triggered.sort();

        NavigationState {
            current_time: self.current_time,
            is_playing: self.is_playing,
            active_annotation: self.active_annotation.clone(),
            triggered,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn active_annotation(&self) -> Option<&Annotation> {
        self.active_annotation.as_ref()
    }

    pub fn is_triggered(&self, id: &str) -> bool {
        self.triggered.contains(id)
    }

    pub fn triggered_count(&self) -> usize {
        self.triggered.len()
    }

    pub fn player(&self) -> Option<&P> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut P> {
        self.player.as_mut()
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut L {
        &mut self.location
    }
}
