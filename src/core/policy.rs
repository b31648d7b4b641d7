//! Tunable thresholds for the layout heuristics.
//!
//! The defaults are calibrated to the exam layout the tool was written for:
//! a purple (#9c28b0) rectangle around each diagram and a vertical rule
//! between the two text columns.

use serde::{Deserialize, Serialize};

use crate::core::color::{ColorClassifier, Rgb};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerPolicy {
    pub color: Rgb,
    /// Maximum Euclidean distance (exclusive) in normalized RGB.
    pub color_threshold: f64,
    /// Extra points captured around each rectangle when rasterizing.
    pub margin: f64,
    pub dpi: u32,
    /// Pixel color recolored to white in the rendered clip.
    pub pixel_color: [u8; 3],
    /// Per-channel tolerance (exclusive) for the pixel recolor.
    pub pixel_tolerance: u8,
}

impl Default for MarkerPolicy {
    fn default() -> Self {
        Self {
            color: Rgb::new(0.6118, 0.1569, 0.6902),
            color_threshold: 0.15,
            margin: 3.0,
            dpi: 200,
            pixel_color: [156, 40, 176],
            pixel_tolerance: 50,
        }
    }
}

impl MarkerPolicy {
    pub fn classifier(&self) -> ColorClassifier {
        ColorClassifier::new(self.color, self.color_threshold)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnPolicy {
    /// Maximum |x1 - x0| for a segment to count as vertical (exclusive).
    pub max_skew: f64,
    /// Minimum vertical extent as a fraction of page height (exclusive).
    pub min_height_ratio: f64,
    /// Rulings must lie strictly inside `[band_start, band_end]` of the width.
    pub band_start: f64,
    pub band_end: f64,
    /// Horizontal rules below this fraction of the height are footer rules.
    pub footer_ratio: f64,
    pub min_gap: f64,
    pub gap_ratio: f64,
    /// Words whose tops differ by at most this belong to the same line.
    pub line_tolerance: f64,
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        Self {
            max_skew: 4.0,
            min_height_ratio: 0.3,
            band_start: 0.25,
            band_end: 0.75,
            footer_ratio: 0.95,
            min_gap: 4.0,
            gap_ratio: 0.01,
            line_tolerance: 3.0,
        }
    }
}

impl ColumnPolicy {
    pub fn gap(&self, page_width: f64) -> f64 {
        self.min_gap.max(page_width * self.gap_ratio)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchPolicy {
    /// Height assumed for a question body below its first line.
    pub assumed_height: f64,
    /// Slack above the question top and below the assumed end.
    pub tolerance: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            assumed_height: 100.0,
            tolerance: 50.0,
        }
    }
}

impl MatchPolicy {
    /// Closed vertical window `[start, end]` for a question starting at `top`.
    pub fn window(&self, top: f64) -> (f64, f64) {
        (
            top - self.tolerance,
            top + self.assumed_height + self.tolerance,
        )
    }
}
