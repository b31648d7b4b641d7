use std::collections::HashSet;
use std::sync::LazyLock;

use log::{debug, trace, warn};
use regex::Regex;

/// `12. ` at the start of a line (group 1), or right after the end of a
/// sentence (group 2).
static QUESTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^[ \t]*(\d+)|[.?!][ \t]+(\d+))\.(?:\s|$)")
        .expect("valid question marker")
});

pub const DEFAULT_MAX_QUESTIONS: usize = 100;

/// A numbered question and its raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub number: u32,
    pub body: String,
}

/// Cuts the normalized document text into numbered questions.
#[derive(Debug, Clone)]
pub struct QuestionSegmenter {
    max_questions: usize,
}

impl Default for QuestionSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUESTIONS)
    }
}

impl QuestionSegmenter {
    pub fn new(max_questions: usize) -> Self {
        Self { max_questions }
    }

    /// Questions in document order. Repeated numbers are kept as separate
    /// entries; only the first `max_questions` are returned.
    pub fn segment(&self, text: &str) -> Vec<Segment> {
        // (number, start of the number, end of the marker)
        let mut markers: Vec<(u32, usize, usize)> = Vec::new();
        let mut previous = 0u32;
        for caps in QUESTION_MARKER.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let (digits, inline) = match (caps.get(1), caps.get(2)) {
                (Some(digits), _) => (digits, false),
                (None, Some(digits)) => (digits, true),
                (None, None) => continue,
            };
            let Ok(number) = digits.as_str().parse::<u32>() else {
                debug!("ignoring out-of-range question number {}", digits.as_str());
                continue;
            };
            // Mid-line numbers only count when they continue the sequence.
            if inline && Some(number) != previous.checked_add(1) {
                trace!("ignoring inline number {number} after question {previous}");
                continue;
            }
            markers.push((number, digits.start(), whole.end()));
            previous = number;
        }

        let mut segments: Vec<Segment> = markers
            .iter()
            .enumerate()
            .map(|(i, &(number, _, body_start))| {
                let body_end = markers.get(i + 1).map_or(text.len(), |next| next.1);
                Segment {
                    number,
                    body: text[body_start..body_end.max(body_start)].trim().to_string(),
                }
            })
            .collect();

        let mut seen = HashSet::new();
        for segment in &segments {
            if !seen.insert(segment.number) {
                warn!("question number {} appears more than once", segment.number);
            }
        }

        if segments.len() > self.max_questions {
            debug!(
                "keeping the first {} of {} questions",
                self.max_questions,
                segments.len()
            );
            segments.truncate(self.max_questions);
        }
        segments
    }
}
