//! View models for the table of contents and the progress-bar markers
//!
//! Nothing here touches the DOM. The host measures the progress bar and
//! renders whatever these functions return.

use serde::{Deserialize, Serialize};

use crate::annotations::{find_active_annotation, Annotation, AnnotationFile};
use crate::formatting::format_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TocBadge {
    /// The annotation explicitly asks to pause
    Pause,
    /// The annotation carries a highlight script
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocItem {
    pub id: String,
    pub title: String,
    pub color: String,
    pub timestamp: u64,
    /// `M:SS`
    pub time: String,
    pub is_active: bool,
    pub badges: Vec<TocBadge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocSectionView {
    pub id: String,
    pub title: String,
    /// One of this section's items is the active annotation
    pub has_active: bool,
    pub items: Vec<TocItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOfContents {
    pub title: String,
    pub active_id: Option<String>,
    pub sections: Vec<TocSectionView>,
}

/// Build the table of contents for playback position `current_time`.
///
/// The active annotation is the latest one at or before `current_time`,
/// looked up in the time-sorted list; sections keep declaration order.
pub fn build_toc(file: &AnnotationFile, current_time: u64, default_color: &str) -> TableOfContents {
    let active_id = find_active_annotation(&file.annotations, current_time)
        .map(|annotation| annotation.id.clone());

    let sections = file
        .sections
        .iter()
        .map(|section| {
            let items: Vec<TocItem> = section
                .annotations
                .iter()
                .map(|annotation| toc_item(annotation, active_id.as_deref(), default_color))
                .collect();

            TocSectionView {
                id: section.id.clone(),
                title: section.title.clone(),
                has_active: items.iter().any(|item| item.is_active),
                items,
            }
        })
        .collect();

    TableOfContents {
        title: file.title.clone(),
        active_id,
        sections,
    }
}

fn toc_item(annotation: &Annotation, active_id: Option<&str>, default_color: &str) -> TocItem {
    let mut badges = Vec::new();
    if annotation.autopause == Some(true) {
        badges.push(TocBadge::Pause);
    }
    if annotation.has_highlight_script() {
        badges.push(TocBadge::Highlight);
    }

    TocItem {
        id: annotation.id.clone(),
        title: annotation.title.clone(),
        color: annotation.color_or(default_color).to_string(),
        timestamp: annotation.timestamp,
        time: format_time(annotation.timestamp),
        is_active: active_id == Some(annotation.id.as_str()),
        badges,
    }
}

/// Measured position of the player's progress bar, in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressBarBounds {
    pub left: f64,
    pub width: f64,
    /// Vertical centre of the bar
    pub top: f64,
}

impl ProgressBarBounds {
    /// Bounds from a bounding client rect
    pub fn from_rect(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            width,
            top: top + height / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub title: String,
    pub color: String,
    /// Offset from the left edge of the bar, 0 to 100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLayout {
    pub bounds: ProgressBarBounds,
    pub markers: Vec<Marker>,
}

/// Position of a timestamp on the progress bar, in percent
pub fn marker_percentage(timestamp: u64, total_duration: u64) -> f64 {
    if total_duration == 0 {
        return 0.0;
    }
    timestamp as f64 * 100.0 / total_duration as f64
}

/// Marker overlay of one player instance.
///
/// Owns the last good measurement of the progress bar. Bounds are never
/// shared between instances and are forgotten on [`MarkerLayer::reset`].
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    bounds: Option<ProgressBarBounds>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measurement. A zero-width bar is still hidden or animating
    /// and is ignored. Returns whether the bounds were accepted.
    pub fn measure(&mut self, bounds: ProgressBarBounds) -> bool {
        if bounds.width <= 0.0 {
            return false;
        }
        self.bounds = Some(bounds);
        true
    }

    /// Forget the measurement, on unmount or when the player is replaced
    pub fn reset(&mut self) {
        self.bounds = None;
    }

    pub fn bounds(&self) -> Option<ProgressBarBounds> {
        self.bounds
    }

    /// The host should keep measuring until this turns false.
    pub fn needs_measurement(&self, controls_visible: bool) -> bool {
        controls_visible && self.bounds.is_none()
    }

    /// Markers to draw, or `None` when nothing should be shown.
    pub fn layout(
        &self,
        annotations: &[Annotation],
        total_duration: u64,
        controls_visible: bool,
        default_color: &str,
    ) -> Option<MarkerLayout> {
        if total_duration == 0 || annotations.is_empty() || !controls_visible {
            return None;
        }
        let bounds = self.bounds?;

        let markers = annotations
            .iter()
            .map(|annotation| Marker {
                id: annotation.id.clone(),
                title: annotation.title.clone(),
                color: annotation.color_or(default_color).to_string(),
                percentage: marker_percentage(annotation.timestamp, total_duration),
            })
            .collect();

        Some(MarkerLayout { bounds, markers })
    }
}
