use log::{debug, warn};

use crate::core::geometry::LineSegment;
use crate::core::model::{Column, PageContent, Word};
use crate::core::policy::ColumnPolicy;

/// Words and text of one column of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnContent {
    pub column: Column,
    /// Horizontal extent `[x0, x1]`.
    pub x0: f64,
    pub x1: f64,
    pub words: Vec<Word>,
    pub text: String,
}

impl ColumnContent {
    fn collect(column: Column, x0: f64, x1: f64, words: &[Word], tolerance: f64) -> Self {
        let words: Vec<Word> = words
            .iter()
            .filter(|w| {
                let center = w.center_x();
                center >= x0 && center <= x1
            })
            .cloned()
            .collect();
        let text = layout_text(&words, tolerance);
        Self {
            column,
            x0,
            x1,
            words,
            text,
        }
    }
}

/// A page cut into its two columns at one split point.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSplit {
    pub split_x: f64,
    pub left: ColumnContent,
    pub right: ColumnContent,
}

impl ColumnSplit {
    pub fn columns(&self) -> [&ColumnContent; 2] {
        [&self.left, &self.right]
    }

    /// Left column text followed by the right column text.
    pub fn page_text(&self) -> String {
        format!("{}\n{}", self.left.text.trim(), self.right.text.trim())
            .trim()
            .to_string()
    }
}

/// Rebuilds reading-order text from word boxes: words whose tops are within
/// `tolerance` form a line, lines are ordered top to bottom.
pub fn layout_text(words: &[Word], tolerance: f64) -> String {
    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<(f64, Vec<&Word>)> = Vec::new();
    for word in sorted {
        match lines.last_mut() {
            Some((top, line)) if (word.top - *top).abs() <= tolerance => line.push(word),
            _ => lines.push((word.top, vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut line)| {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            line.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Picks the split point between the two text columns of a page.
#[derive(Debug, Clone, Default)]
pub struct ColumnSplitter {
    policy: ColumnPolicy,
}

impl ColumnSplitter {
    pub fn new(policy: ColumnPolicy) -> Self {
        Self { policy }
    }

    fn is_footer_rule(&self, segment: &LineSegment, height: f64) -> bool {
        segment.vertical_extent() < 2.0 && segment.top() > height * self.policy.footer_ratio
    }

    fn is_column_ruling(&self, segment: &LineSegment, width: f64, height: f64) -> bool {
        segment.horizontal_deviation() < self.policy.max_skew
            && segment.vertical_extent() > self.policy.min_height_ratio * height
            && segment.x0 > self.policy.band_start * width
            && segment.x0 < self.policy.band_end * width
    }

    /// The vertical ruling closest to the middle of the page, if any.
    pub fn find_ruling(&self, width: f64, height: f64, segments: &[LineSegment]) -> Option<f64> {
        let middle = width / 2.0;
        segments
            .iter()
            .filter(|s| !self.is_footer_rule(s, height))
            .filter(|s| self.is_column_ruling(s, width, height))
            .map(|s| s.x0)
            .fold(None, |best: Option<f64>, x| match best {
                Some(b) if (b - middle).abs() <= (x - middle).abs() => Some(b),
                _ => Some(x),
            })
    }

    pub fn split_at(&self, page: &PageContent, split_x: f64) -> ColumnSplit {
        let gap = self.policy.gap(page.width);
        let tolerance = self.policy.line_tolerance;
        let left_end = (split_x - gap).max(0.0);
        let right_start = (split_x + gap).min(page.width);
        ColumnSplit {
            split_x,
            left: ColumnContent::collect(Column::Left, 0.0, left_end, &page.words, tolerance),
            right: ColumnContent::collect(
                Column::Right,
                right_start,
                page.width,
                &page.words,
                tolerance,
            ),
        }
    }

    /// Splits a page at its ruling, falling back to the exact midpoint when
    /// there is none or when the ruling leaves one column without text.
    pub fn split(&self, page: &PageContent) -> ColumnSplit {
        let middle = page.width / 2.0;
        let split_x = match self.find_ruling(page.width, page.height, &page.segments) {
            Some(x) => {
                debug!("page {}: column ruling at x={x:.1}", page.page_number);
                x
            }
            None => {
                debug!("page {}: no column ruling, using the midpoint", page.page_number);
                middle
            }
        };

        let split = self.split_at(page, split_x);
        let one_side_empty =
            split.left.text.trim().is_empty() || split.right.text.trim().is_empty();
        if one_side_empty && split_x != middle {
            warn!(
                "page {}: ruling at x={split_x:.1} leaves an empty column, retrying at the midpoint",
                page.page_number
            );
            return self.split_at(page, middle);
        }
        split
    }
}
