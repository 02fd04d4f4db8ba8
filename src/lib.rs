//! Rehearseur
//!
//! A time-indexed annotation layer for session-replay players:
//! - Markdown annotation documents parsed into sorted, sectioned annotations
//! - A navigation engine keeping annotations in step with playback across
//!   keyboard, location fragment, playback, table of contents, marker and
//!   progress-bar triggers
//! - Table of contents and progress-bar marker view models
//!
//! The crate runs in the browser through the `wasm` bindings, and natively
//! through the `rehearse` command line tool.

use wasm_bindgen::prelude::*;

pub mod annotations;
pub mod config;
pub mod error;
pub mod formatting;
pub mod navigation;
pub mod presentation;
pub mod wasm;

// Re-export common types
pub use annotations::{parse_annotations, Annotation, AnnotationFile, TocSection};
pub use config::PlayerConfig;
pub use error::{RehearseurError, Result};
pub use navigation::{NavigationEngine, NavigationSource, NavigationState};
pub use presentation::{build_toc, MarkerLayer, TableOfContents};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in debug mode
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
