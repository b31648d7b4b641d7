use std::sync::LazyLock;

use indexmap::IndexMap;
use log::warn;
use regex::Regex;

// Context around the letter is checked by hand: a marker may be directly
// followed by the next one ("a) b) c)"), so the surrounding whitespace
// cannot be consumed by the pattern.
static LETTER_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-fA-F]\)").expect("valid alternative marker"));

/// A question body split into its stem and lettered alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedQuestion {
    pub stem: String,
    /// Lower-case letter → raw value, in order of first appearance.
    pub alternatives: IndexMap<char, String>,
}

fn opens_alternative(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| c.is_whitespace() || c == '.');
    let after_ok = text[end..].chars().next().map_or(true, char::is_whitespace);
    before_ok && after_ok
}

/// Byte ranges of every `x)` marker, in order.
fn marker_spans(text: &str) -> Vec<(char, usize, usize)> {
    LETTER_PAREN
        .find_iter(text)
        .filter(|m| opens_alternative(text, m.start(), m.end()))
        .filter_map(|m| {
            let letter = m.as_str().chars().next()?.to_ascii_lowercase();
            Some((letter, m.start(), m.end()))
        })
        .collect()
}

/// Splits a question body into stem and alternatives. Without any marker
/// the whole body is the stem. A repeated letter keeps its first position
/// and takes the last value.
pub fn parse_alternatives(body: &str) -> ParsedQuestion {
    let markers = marker_spans(body);
    let Some(&(_, first_start, _)) = markers.first() else {
        return ParsedQuestion {
            stem: body.trim().to_string(),
            alternatives: IndexMap::new(),
        };
    };

    let mut alternatives = IndexMap::new();
    for (i, &(letter, _, value_start)) in markers.iter().enumerate() {
        let value_end = markers.get(i + 1).map_or(body.len(), |next| next.1);
        let value = body[value_start..value_end].trim().to_string();
        if let Some(previous) = alternatives.insert(letter, value) {
            warn!("alternative {letter}) repeated, replacing {previous:?}");
        }
    }

    ParsedQuestion {
        stem: body[..first_start].trim().to_string(),
        alternatives,
    }
}
