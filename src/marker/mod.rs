//! Diagram placeholders: purple rectangles drawn around each figure.

pub mod detector;
pub mod extractor;
pub mod renderer;

pub use detector::{DetectedMarker, MarkerRegionDetector};
pub use extractor::RegionImageExtractor;
pub use renderer::{ClipRasterizer, PageRenderer};
