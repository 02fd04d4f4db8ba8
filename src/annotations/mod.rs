//! Annotation data model
//!
//! An annotation document is parsed once per load into an immutable
//! [`AnnotationFile`]. The document-level list is sorted by timestamp; each
//! section keeps its annotations in the order they were written.

use serde::{Deserialize, Serialize};

pub mod parser;

pub use parser::{parse_annotations, slugify};

/// Id of the section that collects annotations declared before any section
pub const DEFAULT_SECTION_ID: &str = "_default";

/// Title of the default section, also the default document title
pub const DEFAULT_SECTION_TITLE: &str = "Annotations";

/// Document version used when the frontmatter does not declare one
pub const DEFAULT_VERSION: u32 = 1;

/// A point of interest in the recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub title: String,
    /// Milliseconds into the recording
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// `None` defers to the player's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autopause: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Highlight script shown in the overlay when the annotation is reached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_js_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
}

impl Annotation {
    pub fn new(id: impl Into<String>, title: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            timestamp,
            color: None,
            autopause: None,
            description: None,
            driver_js_code: None,
            section_id: None,
        }
    }

    /// Whether arriving at this annotation opens the overlay
    pub fn has_highlight_script(&self) -> bool {
        self.driver_js_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    /// Resolve `autopause` against the player-wide default
    pub fn should_autopause(&self, default_autopause: bool) -> bool {
        self.autopause.unwrap_or(default_autopause)
    }

    /// Display colour, falling back to the shared default
    pub fn color_or<'a>(&'a self, default_color: &'a str) -> &'a str {
        self.color.as_deref().unwrap_or(default_color)
    }
}

/// A named group of annotations for the table of contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocSection {
    pub id: String,
    pub title: String,
    /// Declaration order, not time order
    pub annotations: Vec<Annotation>,
}

/// Result of parsing an annotation document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationFile {
    pub version: u32,
    pub title: String,
    pub sections: Vec<TocSection>,
    /// Every annotation, sorted ascending by timestamp (stable)
    pub annotations: Vec<Annotation>,
}

impl Default for AnnotationFile {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            title: DEFAULT_SECTION_TITLE.to_string(),
            sections: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

impl AnnotationFile {
    /// Look up an annotation by id.
    ///
    /// Ids are not deduplicated; when several annotations share an id the
    /// last one in time order wins.
    pub fn find_by_id(&self, id: &str) -> Option<&Annotation> {
        find_by_id(&self.annotations, id)
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// Last annotation carrying `id`
pub fn find_by_id<'a>(annotations: &'a [Annotation], id: &str) -> Option<&'a Annotation> {
    annotations.iter().rev().find(|annotation| annotation.id == id)
}

/// The most recent annotation at or before `current_time`.
///
/// Assumes `annotations` is sorted by timestamp and stops at the first
/// annotation that lies in the future.
pub fn find_active_annotation(annotations: &[Annotation], current_time: u64) -> Option<&Annotation> {
    let mut active = None;
    for annotation in annotations {
        if annotation.timestamp <= current_time {
            active = Some(annotation);
        } else {
            break;
        }
    }
    active
}

/// First annotation strictly after `current_time`
pub fn next_annotation(annotations: &[Annotation], current_time: u64) -> Option<&Annotation> {
    annotations
        .iter()
        .find(|annotation| annotation.timestamp > current_time)
}

/// Last annotation strictly before `before`
pub fn previous_annotation(annotations: &[Annotation], before: u64) -> Option<&Annotation> {
    annotations
        .iter()
        .filter(|annotation| annotation.timestamp < before)
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Annotation> {
        vec![
            Annotation::new("a1", "First", 1000),
            Annotation::new("a2", "Second", 5000),
            Annotation::new("a3", "Third", 10000),
        ]
    }

    #[test]
    fn test_find_active_annotation() {
        let annotations = sample();
        assert_eq!(find_active_annotation(&annotations, 6000).map(|a| a.id.as_str()), Some("a2"));
        assert_eq!(find_active_annotation(&annotations, 5000).map(|a| a.id.as_str()), Some("a2"));
        assert_eq!(find_active_annotation(&annotations, 500), None);
        assert_eq!(find_active_annotation(&annotations, 99_999).map(|a| a.id.as_str()), Some("a3"));
        assert_eq!(find_active_annotation(&[], 1000), None);
    }

    #[test]
    fn test_next_and_previous() {
        let annotations = sample();
        assert_eq!(next_annotation(&annotations, 1000).map(|a| a.id.as_str()), Some("a2"));
        assert_eq!(next_annotation(&annotations, 10000), None);
        assert_eq!(previous_annotation(&annotations, 5000).map(|a| a.id.as_str()), Some("a1"));
        assert_eq!(previous_annotation(&annotations, 1000), None);
    }

    #[test]
    fn test_duplicate_ids_last_wins() {
        let mut annotations = sample();
        annotations.push(Annotation::new("a1", "Shadow", 20000));
        let found = find_by_id(&annotations, "a1").unwrap();
        assert_eq!(found.title, "Shadow");
    }

    #[test]
    fn test_highlight_script_presence() {
        let mut annotation = Annotation::new("a", "A", 0);
        assert!(!annotation.has_highlight_script());
        annotation.driver_js_code = Some("  \n".to_string());
        assert!(!annotation.has_highlight_script());
        annotation.driver_js_code = Some("driver.highlight({})".to_string());
        assert!(annotation.has_highlight_script());
    }

    #[test]
    fn test_autopause_default() {
        let mut annotation = Annotation::new("a", "A", 0);
        assert!(annotation.should_autopause(true));
        assert!(!annotation.should_autopause(false));
        annotation.autopause = Some(false);
        assert!(!annotation.should_autopause(true));
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut annotation = Annotation::new("welcome", "Welcome", 0);
        annotation.driver_js_code = Some("driver.highlight({})".to_string());
        annotation.section_id = Some("intro".to_string());
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["driverJsCode"], "driver.highlight({})");
        assert_eq!(json["sectionId"], "intro");
        assert!(json.get("color").is_none());
    }
}
