use serde::{Deserialize, Serialize};

/// RGB color with channels normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }

    pub fn from_cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::new(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )
    }

    /// Interprets raw color operands by component count: 1 = gray,
    /// 3 = RGB, 4 = CMYK. Anything else has no RGB reading.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match *components {
            [g] => Some(Self::gray(g)),
            [r, g, b] => Some(Self::new(r, g, b)),
            [c, m, y, k] => Some(Self::from_cmyk(c, m, y, k)),
            _ => None,
        }
    }

    /// Builds a color from 8-bit channels.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    pub fn distance(&self, other: &Self) -> f64 {
        ((self.r - other.r).powi(2) + (self.g - other.g).powi(2) + (self.b - other.b).powi(2))
            .sqrt()
    }
}

/// Decides whether a drawing color is the marker hue.
#[derive(Debug, Clone, Copy)]
pub struct ColorClassifier {
    reference: Rgb,
    threshold: f64,
}

impl ColorClassifier {
    pub fn new(reference: Rgb, threshold: f64) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    /// A color matches when its distance to the reference is strictly
    /// below the threshold. Absent colors never match.
    pub fn is_marker(&self, color: Option<&Rgb>) -> bool {
        color.is_some_and(|c| c.distance(&self.reference) < self.threshold)
    }

    /// Same as [`is_marker`](Self::is_marker) for raw components; fewer
    /// than three components never match.
    pub fn is_marker_components(&self, components: &[f64]) -> bool {
        match components {
            [r, g, b, ..] => self.is_marker(Some(&Rgb::new(*r, *g, *b))),
            _ => false,
        }
    }
}
