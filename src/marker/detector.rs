use crate::core::color::ColorClassifier;
use crate::core::geometry::Rect;
use crate::core::model::{PaintChannel, PathObject};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedMarker {
    pub rect: Rect,
    pub channel: PaintChannel,
}

/// Finds marker-colored drawings on a page.
#[derive(Debug, Clone, Copy)]
pub struct MarkerRegionDetector {
    classifier: ColorClassifier,
}

impl MarkerRegionDetector {
    pub fn new(classifier: ColorClassifier) -> Self {
        Self { classifier }
    }

    /// Fill is checked before stroke. Overlapping markers are reported
    /// independently, in drawing order.
    pub fn detect(&self, drawings: &[PathObject]) -> Vec<DetectedMarker> {
        drawings
            .iter()
            .filter_map(|drawing| {
                let channel = if self.classifier.is_marker(drawing.fill.as_ref()) {
                    PaintChannel::Fill
                } else if self.classifier.is_marker(drawing.stroke.as_ref()) {
                    PaintChannel::Stroke
                } else {
                    return None;
                };
                Some(DetectedMarker {
                    rect: drawing.bbox,
                    channel,
                })
            })
            .collect()
    }
}
