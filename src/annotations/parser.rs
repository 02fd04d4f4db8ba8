//! Annotation document parser
//!
//! Reads the markdown-like annotation format:
//!
//! ````text
//! ---
//! version: 1
//! title: "My Recording"
//! ---
//!
//! ## Section: Introduction {#intro}
//!
//! ### Annotation: Welcome
//! ---
//! timestamp: 0
//! color: `#2196F3`
//! autopause: true
//! ---
//! Free text description.
//!
//! ```driverjs
//! driver.highlight({ element: '.welcome' });
//! ```
//! ````
//!
//! Parsing never fails. Anything that does not fit the format is skipped and
//! missing values fall back to their defaults.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::{
    Annotation, AnnotationFile, TocSection, DEFAULT_SECTION_ID, DEFAULT_SECTION_TITLE,
    DEFAULT_VERSION,
};

const BLOCK_DELIMITER: &str = "---";
const FENCE: &str = "```";
const HIGHLIGHT_LANGUAGE: &str = "driverjs";

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^##[ \t]+Section:[ \t]*(.*?)[ \t]*$").expect("section header pattern")
});

static ANNOTATION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^###[ \t]+Annotation:[ \t]*(.*?)[ \t]*$").expect("annotation header pattern")
});

static EXPLICIT_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)[ \t]*\{#([^}\s]+)\}$").expect("anchor pattern")
});

/// Parse an annotation document.
pub fn parse_annotations(document: &str) -> AnnotationFile {
    let document = document.strip_prefix('\u{feff}').unwrap_or(document);
    let lines: Vec<&str> = document.lines().collect();

    let mut file = AnnotationFile::default();
    let mut start = 0;

    let first_content = lines.iter().position(|line| !line.trim().is_empty());
    if let Some(first) = first_content {
        if let Some((fields, next)) = read_block(&lines, first) {
            apply_frontmatter(&mut file, &fields);
            start = next;
        }
    }

    let mut builder = DocumentBuilder::default();

    // A header always ends the current body, even inside a fence the author
    // forgot to close.
    for line in &lines[start..] {
        if let Some(caps) = SECTION_HEADER.captures(line) {
            builder.open_section(&caps[1]);
            continue;
        }
        if let Some(caps) = ANNOTATION_HEADER.captures(line) {
            builder.open_annotation(&caps[1]);
            continue;
        }

        builder.push_line(line);
    }

    let (sections, annotations) = builder.finish();
    file.sections = sections;
    file.annotations = annotations;

    report_duplicate_ids(&file);
    debug!(
        title = %file.title,
        version = file.version,
        sections = file.sections.len(),
        annotations = file.annotations.len(),
        "parsed annotation document"
    );

    file
}

/// Turn a title into an id: lowercase, accents folded, every run of
/// non-alphanumeric characters collapsed into one hyphen, no hyphens at
/// either end.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.nfkd() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if !is_combining_mark(c) {
            pending_hyphen = true;
        }
    }

    slug
}

#[derive(Default)]
struct DocumentBuilder {
    sections: Vec<TocSection>,
    current_section: Option<usize>,
    current: Option<PendingAnnotation>,
    declared: Vec<Annotation>,
    section_count: usize,
    annotation_count: usize,
}

/// An annotation whose header has been read but whose block is still open
struct PendingAnnotation {
    id: String,
    title: String,
    section: usize,
    lines: Vec<String>,
}

impl DocumentBuilder {
    fn open_section(&mut self, heading: &str) {
        self.close_annotation();
        self.section_count += 1;

        let (title, id) = split_anchor(heading, "section", self.section_count);
        self.sections.push(TocSection {
            id,
            title,
            annotations: Vec::new(),
        });
        self.current_section = Some(self.sections.len() - 1);
    }

    fn open_annotation(&mut self, heading: &str) {
        self.close_annotation();
        self.annotation_count += 1;

        let section = match self.current_section {
            Some(index) => index,
            None => {
                self.sections.push(TocSection {
                    id: DEFAULT_SECTION_ID.to_string(),
                    title: DEFAULT_SECTION_TITLE.to_string(),
                    annotations: Vec::new(),
                });
                let index = self.sections.len() - 1;
                self.current_section = Some(index);
                index
            }
        };

        let (title, id) = split_anchor(heading, "annotation", self.annotation_count);
        self.current = Some(PendingAnnotation {
            id,
            title,
            section,
            lines: Vec::new(),
        });
    }

    fn push_line(&mut self, line: &str) {
        // Text between a section header and its first annotation has no home
        if let Some(pending) = self.current.as_mut() {
            pending.lines.push(line.to_string());
        }
    }

    fn close_annotation(&mut self) {
        let Some(pending) = self.current.take() else {
            return;
        };

        let section_id = self.sections[pending.section].id.clone();
        let mut annotation = Annotation::new(pending.id, pending.title, 0);
        annotation.section_id = Some(section_id);

        let lines: Vec<&str> = pending.lines.iter().map(String::as_str).collect();
        let body = match lines.iter().position(|line| !line.trim().is_empty()) {
            Some(first) => match read_block(&lines, first) {
                Some((fields, next)) => {
                    apply_metadata(&mut annotation, &fields);
                    &lines[next..]
                }
                None if lines[first].trim() == BLOCK_DELIMITER => {
                    // Unterminated metadata block: everything left is metadata
                    let fields = parse_fields(&lines[first + 1..]);
                    apply_metadata(&mut annotation, &fields);
                    &[][..]
                }
                None => &lines[first..],
            },
            None => &[][..],
        };

        apply_body(&mut annotation, body);

        self.sections[pending.section].annotations.push(annotation.clone());
        self.declared.push(annotation);
    }

    fn finish(mut self) -> (Vec<TocSection>, Vec<Annotation>) {
        self.close_annotation();

        let mut sorted = self.declared;
        // Stable: equal timestamps keep declaration order
        sorted.sort_by_key(|annotation| annotation.timestamp);

        (self.sections, sorted)
    }
}

/// Read a `---` delimited block of `key: value` lines starting at `start`.
///
/// Returns the fields and the index of the first line after the closing
/// delimiter, or `None` if `start` is not an opening delimiter or the block
/// is never closed.
fn read_block(lines: &[&str], start: usize) -> Option<(Vec<(String, String)>, usize)> {
    if lines.get(start)?.trim() != BLOCK_DELIMITER {
        return None;
    }

    let close = lines[start + 1..]
        .iter()
        .position(|line| line.trim() == BLOCK_DELIMITER)?
        + start
        + 1;

    Some((parse_fields(&lines[start + 1..close]), close + 1))
}

fn parse_fields(lines: &[&str]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn apply_frontmatter(file: &mut AnnotationFile, fields: &[(String, String)]) {
    for (key, value) in fields {
        match key.as_str() {
            "version" => {
                file.version = parse_leading_integer(value)
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(DEFAULT_VERSION);
            }
            "title" => {
                let title = strip_quotes(value);
                if !title.is_empty() {
                    file.title = title.to_string();
                }
            }
            _ => {}
        }
    }
}

fn apply_metadata(annotation: &mut Annotation, fields: &[(String, String)]) {
    for (key, value) in fields {
        match key.as_str() {
            "timestamp" => annotation.timestamp = parse_leading_integer(value).unwrap_or(0),
            "color" => {
                let color = value.trim_matches('`').trim();
                annotation.color = (!color.is_empty()).then(|| color.to_string());
            }
            "autopause" => {
                annotation.autopause = match value.as_str() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                };
            }
            _ => {}
        }
    }
}

/// Split the body into the description (text before the highlight fence) and
/// the highlight script (content of the first highlight fence).
fn apply_body(annotation: &mut Annotation, body: &[&str]) {
    let mut in_other_fence = false;
    let mut script_start = None;

    for (index, line) in body.iter().enumerate() {
        if !is_fence(line) {
            continue;
        }
        if in_other_fence {
            in_other_fence = false;
        } else if fence_language(line) == Some(HIGHLIGHT_LANGUAGE) {
            script_start = Some(index);
            break;
        } else {
            in_other_fence = true;
        }
    }

    let description_end = script_start.unwrap_or(body.len());
    let description = body[..description_end].join("\n");
    let description = description.trim();
    if !description.is_empty() {
        annotation.description = Some(description.to_string());
    }

    if let Some(start) = script_start {
        let content = &body[start + 1..];
        let end = content
            .iter()
            .position(|line| line.trim() == FENCE)
            .unwrap_or(content.len());
        let code = content[..end].join("\n");
        if !code.trim().is_empty() {
            annotation.driver_js_code = Some(code);
        }
    }
}

/// Opening or closing fence line. A line that also closes its fence
/// (```` ```npm install``` ````) is inline code, not a fence.
fn is_fence(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(FENCE)
        .is_some_and(|rest| !rest.contains(FENCE))
}

fn fence_language(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(FENCE)?
        .split_whitespace()
        .next()
}

/// Separate an optional `{#id}` anchor from a heading.
///
/// Without an anchor the id is the slug of the title; a title with nothing
/// to slugify gets a positional id.
fn split_anchor(heading: &str, kind: &str, position: usize) -> (String, String) {
    if let Some(caps) = EXPLICIT_ANCHOR.captures(heading) {
        return (caps[1].trim().to_string(), caps[2].to_string());
    }

    let title = heading.trim().to_string();
    let mut id = slugify(&title);
    if id.is_empty() {
        id = format!("{}-{}", kind, position);
    }
    (title, id)
}

/// Integer prefix of a value (`"1500ms"` reads as 1500)
fn parse_leading_integer(value: &str) -> Option<u64> {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn report_duplicate_ids(file: &AnnotationFile) {
    let mut seen = HashSet::new();
    for annotation in &file.annotations {
        if !seen.insert(annotation.id.as_str()) {
            debug!(id = %annotation.id, "duplicate annotation id, later annotation shadows earlier");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_frontmatter() {
        let markdown = "---\nversion: 2\ntitle: Test Recording\n---\n\n## Section: Test Section\n\n### Annotation: Test Annotation\n---\ntimestamp: 1000\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.version, 2);
        assert_eq!(result.title, "Test Recording");
    }

    #[test]
    fn test_missing_frontmatter_uses_defaults() {
        let markdown = "## Section: Test Section\n\n### Annotation: Test Annotation\n---\ntimestamp: 1000\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.version, 1);
        assert_eq!(result.title, "Annotations");
        assert_eq!(result.annotations.len(), 1);
        assert_eq!(result.annotations[0].timestamp, 1000);
    }

    #[test]
    fn test_frontmatter_quotes_stripped() {
        let markdown = "---\nversion: 1\ntitle: \"Recording with quotes\"\n---\n";
        assert_eq!(parse_annotations(markdown).title, "Recording with quotes");

        let markdown = "---\ntitle: 'Single quoted'\n---\n";
        assert_eq!(parse_annotations(markdown).title, "Single quoted");
    }

    #[test]
    fn test_non_numeric_version_defaults() {
        let markdown = "---\nversion: latest\nauthor: someone\n---\n";
        let result = parse_annotations(markdown);
        assert_eq!(result.version, 1);
        assert_eq!(result.title, "Annotations");
    }

    #[test]
    fn test_empty_document() {
        let result = parse_annotations("");
        assert_eq!(result, AnnotationFile::default());
        assert_eq!(result.version, 1);
        assert_eq!(result.title, "Annotations");
        assert!(result.sections.is_empty());
        assert!(result.annotations.is_empty());
    }

    #[test]
    fn test_only_frontmatter() {
        let markdown = "---\nversion: 2\ntitle: Only Frontmatter\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.version, 2);
        assert_eq!(result.title, "Only Frontmatter");
        assert!(result.sections.is_empty());
        assert!(result.annotations.is_empty());
    }

    #[test]
    fn test_sections_in_order() {
        let markdown = "## Section: First Section\n\n### Annotation: Annotation 1\n---\ntimestamp: 1000\n---\n\n## Section: Second Section\n\n### Annotation: Annotation 2\n---\ntimestamp: 2000\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[0].title, "First Section");
        assert_eq!(result.sections[1].title, "Second Section");
    }

    #[test]
    fn test_explicit_anchors() {
        let markdown = "## Section: My Section {#custom-id}\n\n### Annotation: My Annotation {#my-id}\n---\ntimestamp: 1000\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections[0].id, "custom-id");
        assert_eq!(result.sections[0].title, "My Section");
        assert_eq!(result.annotations[0].id, "my-id");
        assert_eq!(result.annotations[0].title, "My Annotation");
        assert_eq!(result.annotations[0].section_id.as_deref(), Some("custom-id"));
    }

    #[test]
    fn test_generated_ids() {
        let markdown = "## Section: Getting Started Guide\n\n### Annotation: Click \"Submit\" Button!\n---\ntimestamp: 1000\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections[0].id, "getting-started-guide");
        assert_eq!(result.annotations[0].title, "Click \"Submit\" Button!");
        assert_eq!(result.annotations[0].id, "click-submit-button");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started Guide"), "getting-started-guide");
        assert_eq!(slugify("Click \"Submit\" Button!"), "click-submit-button");
        assert_eq!(slugify("  --Step 2: Save--  "), "step-2-save");
        assert_eq!(slugify("Café Naïve"), "cafe-naive");
        assert_eq!(slugify("!!!"), "");
        // Combining marks for symbols fold away with the base letter kept
        assert_eq!(slugify("Vector a\u{20D7} b"), "vector-a-b");
        assert_eq!(slugify("x\u{20D7}y"), "xy");
    }

    #[test]
    fn test_positional_id_when_slug_empty() {
        let markdown = "## Section: ???\n\n### Annotation: ...\n---\ntimestamp: 5\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections[0].id, "section-1");
        assert_eq!(result.annotations[0].id, "annotation-1");
    }

    #[test]
    fn test_default_section() {
        let markdown = "### Annotation: Test Annotation\n---\ntimestamp: 1000\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.sections[0].id, DEFAULT_SECTION_ID);
        assert_eq!(result.sections[0].title, DEFAULT_SECTION_TITLE);
        assert_eq!(result.annotations[0].section_id.as_deref(), Some("_default"));
    }

    #[test]
    fn test_default_section_precedes_declared_sections() {
        let markdown = "### Annotation: Loose\n---\ntimestamp: 9000\n---\n\n## Section: Later\n\n### Annotation: Inside\n---\ntimestamp: 100\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[0].id, "_default");
        assert_eq!(result.sections[0].annotations[0].id, "loose");
        assert_eq!(result.sections[1].annotations[0].id, "inside");
    }

    #[test]
    fn test_empty_section_kept() {
        let markdown = "## Section: Empty\n\n## Section: Full\n\n### Annotation: Only\n---\ntimestamp: 1\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections.len(), 2);
        assert!(result.sections[0].annotations.is_empty());
        assert_eq!(result.sections[1].annotations.len(), 1);
    }

    #[test]
    fn test_metadata_fields() {
        let markdown = "### Annotation: Test\n---\ntimestamp: 1500\ncolor: `#FF5733`\nautopause: false\n---";
        let result = parse_annotations(markdown);
        let annotation = &result.annotations[0];
        assert_eq!(annotation.timestamp, 1500);
        assert_eq!(annotation.color.as_deref(), Some("#FF5733"));
        assert_eq!(annotation.autopause, Some(false));
    }

    #[test]
    fn test_autopause_values() {
        let parse = |value: &str| {
            let markdown = format!("### Annotation: Test\n---\ntimestamp: 1000\n{}---", value);
            parse_annotations(&markdown).annotations[0].autopause
        };
        assert_eq!(parse("autopause: true\n"), Some(true));
        assert_eq!(parse("autopause: false\n"), Some(false));
        assert_eq!(parse("autopause: maybe\n"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_bad_timestamp_defaults_to_zero() {
        let markdown = "### Annotation: A\n---\ntimestamp: soon\n---\n\n### Annotation: B\n---\ncolor: red\n---";
        let result = parse_annotations(markdown);
        assert!(result.annotations.iter().all(|a| a.timestamp == 0));
        assert_eq!(result.annotations[1].color.as_deref(), Some("red"));
    }

    #[test]
    fn test_description() {
        let markdown = "### Annotation: Test\n---\ntimestamp: 1000\n---\n\nThis is a description of the annotation.\nIt can span multiple lines.\n\n";
        let result = parse_annotations(markdown);
        assert_eq!(
            result.annotations[0].description.as_deref(),
            Some("This is a description of the annotation.\nIt can span multiple lines.")
        );
        assert!(result.annotations[0].driver_js_code.is_none());
    }

    #[test]
    fn test_highlight_script_verbatim() {
        let markdown = "### Annotation: Test\n---\ntimestamp: 1000\n---\n\n```driverjs\ndriver.highlight({\n  element: '.btn',\n  popover: { title: 'Button' }\n});\n```";
        let result = parse_annotations(markdown);
        assert_eq!(
            result.annotations[0].driver_js_code.as_deref(),
            Some("driver.highlight({\n  element: '.btn',\n  popover: { title: 'Button' }\n});")
        );
        assert!(result.annotations[0].description.is_none());
    }

    #[test]
    fn test_description_and_highlight_script() {
        let markdown = "### Annotation: Test\n---\ntimestamp: 1000\n---\n\nThis is a description.\n\n```driverjs\ndriver.highlight({ element: '.test' });\n```";
        let result = parse_annotations(markdown);
        assert_eq!(result.annotations[0].description.as_deref(), Some("This is a description."));
        assert_eq!(
            result.annotations[0].driver_js_code.as_deref(),
            Some("driver.highlight({ element: '.test' });")
        );
    }

    #[test]
    fn test_indented_header_text_in_script_kept() {
        let markdown = "### Annotation: Outer\n---\ntimestamp: 1\n---\n```driverjs\n// ### Annotation: Not a header\ndriver.go();\n```";
        let result = parse_annotations(markdown);
        assert_eq!(result.annotations.len(), 1);
        assert_eq!(
            result.annotations[0].driver_js_code.as_deref(),
            Some("// ### Annotation: Not a header\ndriver.go();")
        );
    }

    #[test]
    fn test_unterminated_script_fence_ends_at_next_header() {
        let markdown = "## Section: One\n\n### Annotation: A\n---\ntimestamp: 1000\n---\n```driverjs\ndriver.highlight({ element: '.a' });\n\n## Section: Two\n\n### Annotation: B\n---\ntimestamp: 2000\n---\n\n### Annotation: C\n---\ntimestamp: 3000\n---";
        let result = parse_annotations(markdown);

        let sections: Vec<&str> = result.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(sections, vec!["one", "two"]);
        let annotations: Vec<(&str, u64)> = result
            .annotations
            .iter()
            .map(|a| (a.id.as_str(), a.timestamp))
            .collect();
        assert_eq!(annotations, vec![("a", 1000), ("b", 2000), ("c", 3000)]);
        assert_eq!(
            result.annotations[0].driver_js_code.as_deref(),
            Some("driver.highlight({ element: '.a' });\n")
        );
        assert_eq!(result.annotations[1].section_id.as_deref(), Some("two"));
    }

    #[test]
    fn test_inline_backtick_line_is_not_a_fence() {
        let markdown = "### Annotation: A\n---\ntimestamp: 1000\n---\n```npm install``` then click.\n\n### Annotation: B\n---\ntimestamp: 2000\n---\n```driverjs\ndriver.go();\n```";
        let result = parse_annotations(markdown);

        assert_eq!(result.annotations.len(), 2);
        assert_eq!(
            result.annotations[0].description.as_deref(),
            Some("```npm install``` then click.")
        );
        assert!(result.annotations[0].driver_js_code.is_none());
        assert_eq!(result.annotations[1].driver_js_code.as_deref(), Some("driver.go();"));
    }

    #[test]
    fn test_other_fences_stay_in_description() {
        let markdown = "### Annotation: Test\n---\ntimestamp: 1\n---\nRun this:\n```bash\nls\n```\n```driverjs\ndriver.go();\n```";
        let result = parse_annotations(markdown);
        let annotation = &result.annotations[0];
        assert_eq!(annotation.description.as_deref(), Some("Run this:\n```bash\nls\n```"));
        assert_eq!(annotation.driver_js_code.as_deref(), Some("driver.go();"));
    }

    #[test]
    fn test_annotation_without_metadata() {
        let markdown = "### Annotation: Bare\nJust words.";
        let result = parse_annotations(markdown);
        assert_eq!(result.annotations[0].timestamp, 0);
        assert_eq!(result.annotations[0].description.as_deref(), Some("Just words."));
    }

    #[test]
    fn test_sorted_by_timestamp() {
        let markdown = "### Annotation: Third\n---\ntimestamp: 3000\n---\n\n### Annotation: First\n---\ntimestamp: 1000\n---\n\n### Annotation: Second\n---\ntimestamp: 2000\n---";
        let result = parse_annotations(markdown);
        let timestamps: Vec<u64> = result.annotations.iter().map(|a| a.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 2000, 3000]);
        // Declaration order within the section
        let declared: Vec<&str> = result.sections[0].annotations.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(declared, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_equal_timestamps_keep_declaration_order() {
        let markdown = "### Annotation: B\n---\ntimestamp: 500\n---\n### Annotation: A\n---\ntimestamp: 500\n---\n### Annotation: C\n---\ntimestamp: 100\n---";
        let result = parse_annotations(markdown);
        let ids: Vec<&str> = result.annotations.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sections_keep_declared_order_while_list_is_sorted() {
        let markdown = "## Section: First Section\n\n### Annotation: Late annotation\n---\ntimestamp: 5000\n---\n\n## Section: Second Section\n\n### Annotation: Early annotation\n---\ntimestamp: 1000\n---";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections[0].title, "First Section");
        assert_eq!(result.sections[1].title, "Second Section");
        assert_eq!(result.annotations[0].timestamp, 1000);
        assert_eq!(result.annotations[1].timestamp, 5000);
        assert_eq!(result.sections[0].annotations[0].timestamp, 5000);
        assert_eq!(result.sections[1].annotations[0].timestamp, 1000);
    }

    #[test]
    fn test_complex_document() {
        let markdown = r#"---
version: 1
title: Complex Recording
---

## Section: Introduction

### Annotation: Welcome {#welcome}
---
timestamp: 0
color: `#2196F3`
autopause: true
---

Welcome to the recording!

```driverjs
driver.highlight({ element: '.welcome' });
```

### Annotation: Overview
---
timestamp: 5000
---

## Section: Main Content {#main}

### Annotation: First Step
---
timestamp: 10000
autopause: false
---

This is the first step.

### Annotation: Second Step
---
timestamp: 15000
---"#;

        let result = parse_annotations(markdown);
        assert_eq!(result.version, 1);
        assert_eq!(result.title, "Complex Recording");

        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[0].title, "Introduction");
        assert_eq!(result.sections[0].id, "introduction");
        assert_eq!(result.sections[1].id, "main");

        assert_eq!(result.annotations.len(), 4);
        let welcome = &result.annotations[0];
        assert_eq!(welcome.id, "welcome");
        assert_eq!(welcome.color.as_deref(), Some("#2196F3"));
        assert_eq!(welcome.autopause, Some(true));
        assert_eq!(welcome.description.as_deref(), Some("Welcome to the recording!"));
        assert!(welcome.driver_js_code.as_deref().unwrap().contains("driver.highlight"));

        assert!(result.annotations.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(result.sections[0].annotations.len(), 2);
        assert_eq!(result.sections[1].annotations.len(), 2);
        assert_eq!(result.sections[1].annotations[0].id, "first-step");
        assert_eq!(
            result.sections[1].annotations[0].description.as_deref(),
            Some("This is the first step.")
        );
    }

    #[test]
    fn test_section_view_matches_sorted_view() {
        let markdown = "## Section: S {#s}\n### Annotation: X\n---\ntimestamp: 7\ncolor: blue\n---\nText";
        let result = parse_annotations(markdown);
        assert_eq!(result.sections[0].annotations[0], result.annotations[0]);
    }

    #[test]
    fn test_frontmatter_closes_at_first_delimiter() {
        let markdown = "---\ntitle: Never closed\n### Annotation: A\n---\ntimestamp: 10\n---";
        let result = parse_annotations(markdown);
        // The opening delimiter pairs with the annotation's first delimiter
        assert_eq!(result.title, "Never closed");
        assert_eq!(result.annotations.len(), 0);
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(parse_leading_integer("1500ms"), Some(1500));
        assert_eq!(parse_leading_integer(" 42 "), Some(42));
        assert_eq!(parse_leading_integer("-5"), None);
        assert_eq!(parse_leading_integer(""), None);
    }
}
