//! Seams to the outside world
//!
//! The engine never talks to a concrete replay player or to the browser
//! location directly. The wasm bindings implement these traits over
//! JavaScript objects; tests and the command line use the in-memory versions
//! from [`super::simulation`].

/// The replay player the annotations are laid over
pub trait PlayerHandle {
    /// Seek to `ms` milliseconds into the recording
    fn goto(&mut self, ms: u64);

    fn play(&mut self);

    fn pause(&mut self);

    /// Live playing flag, read from the player itself
    fn is_playing(&self) -> bool;

    /// Current playback position, `None` while the player cannot report it
    fn current_time(&self) -> Option<u64>;
}

/// The shareable fragment of the current location (`#<annotation-id>`)
pub trait LocationHash {
    /// Fragment without the leading `#`, `None` when empty
    fn read(&self) -> Option<String>;

    fn write(&mut self, id: &str);
}
