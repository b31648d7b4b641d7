use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::color::Rgb;
use crate::core::geometry::{LineSegment, Rect};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Left,
    Right,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Left => f.write_str("left"),
            Column::Right => f.write_str("right"),
        }
    }
}

/// Which paint channel of a drawing carried the marker color.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaintChannel {
    Fill,
    Stroke,
}

impl fmt::Display for PaintChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaintChannel::Fill => f.write_str("fill"),
            PaintChannel::Stroke => f.write_str("stroke"),
        }
    }
}

/// A painted vector path as seen on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PathObject {
    pub bbox: Rect,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    /// Straight segments, only for stroked paths.
    pub segments: Vec<LineSegment>,
}

/// A whitespace-delimited word with its box on the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) * 0.5
    }
}

/// Everything the analysis pass needs to know about one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// 1-based.
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
    pub segments: Vec<LineSegment>,
    pub words: Vec<Word>,
}

/// A diagram placeholder extracted from the document.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRegion {
    /// 1-based.
    pub page: usize,
    pub rect: Rect,
    /// Base64 PNG.
    pub image: String,
    pub y_center: f64,
    pub column: Column,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionPosition {
    pub page: usize,
    pub top: f64,
    pub column: Column,
}

/// Final serialized form of one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionRecord {
    #[serde(rename = "numero_questao")]
    pub number: u32,
    #[serde(rename = "enunciado")]
    pub statement: String,
    #[serde(rename = "imagem")]
    pub image: String,
    #[serde(rename = "alternativas")]
    pub alternatives: IndexMap<String, String>,
    #[serde(rename = "alternativa_correta")]
    pub correct_alternative: String,
}

impl QuestionRecord {
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}
