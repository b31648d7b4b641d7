use std::collections::HashMap;
use std::sync::LazyLock;

use log::{debug, trace};
use regex::Regex;

use crate::core::model::QuestionPosition;
use crate::layout::columns::ColumnSplit;

/// Question number → where that question starts.
pub type PositionIndex = HashMap<u32, QuestionPosition>;

// A word is whitespace-free, so the end of the token stands in for the
// whitespace that follows the period.
static QUESTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.(?:\s|$)").expect("valid question start pattern"));

/// Number of the question a word opens, if the word looks like `12.`.
pub fn question_number(token: &str) -> Option<u32> {
    QUESTION_START
        .captures(token)
        .and_then(|caps| caps[1].parse().ok())
}

/// Records where each numbered question starts on the page. Left column
/// first, then right; a number seen again replaces the earlier entry.
pub fn index_page(page: usize, split: &ColumnSplit, index: &mut PositionIndex) {
    for column in split.columns() {
        for word in &column.words {
            let Some(number) = question_number(&word.text) else {
                continue;
            };
            let position = QuestionPosition {
                page,
                top: word.top,
                column: column.column,
            };
            if let Some(previous) = index.insert(number, position) {
                debug!(
                    "question {number} seen again on page {page} ({}), replacing page {} ({})",
                    column.column, previous.page, previous.column
                );
            } else {
                trace!("question {number} starts on page {page} at y={:.1}", word.top);
            }
        }
    }
}
