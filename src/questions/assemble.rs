use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::model::{MarkerRegion, QuestionRecord};
use crate::core::policy::MatchPolicy;
use crate::layout::PositionIndex;
use crate::questions::alternatives::parse_alternatives;
use crate::questions::matcher::RegionQuestionMatcher;
use crate::questions::segment::Segment;

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid blank line pattern"));

/// How statement and alternative texts are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Paragraphs wrapped in `<p>` tags, images attached.
    #[default]
    Markup,
    /// Flowing text, paragraphs separated by a blank line, no images.
    Plain,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Markup => f.write_str("markup"),
            OutputMode::Plain => f.write_str("plain"),
        }
    }
}

fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
}

pub fn wrap_paragraphs(text: &str) -> String {
    paragraphs(text).map(|p| format!("<p>{p}</p>")).collect()
}

pub fn flow_paragraphs(text: &str) -> String {
    paragraphs(text)
        .map(|p| {
            p.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl OutputMode {
    pub fn render(self, text: &str) -> String {
        match self {
            OutputMode::Markup => wrap_paragraphs(text),
            OutputMode::Plain => flow_paragraphs(text),
        }
    }
}

/// Builds the final question records.
#[derive(Debug, Clone, Default)]
pub struct RecordAssembler {
    mode: OutputMode,
    matching: MatchPolicy,
}

impl RecordAssembler {
    pub fn new(mode: OutputMode, matching: MatchPolicy) -> Self {
        Self { mode, matching }
    }

    pub fn assemble(
        &self,
        segments: &[Segment],
        positions: &PositionIndex,
        regions: &[MarkerRegion],
    ) -> Vec<QuestionRecord> {
        let mut matcher = RegionQuestionMatcher::new(regions, self.matching.clone());
        let records: Vec<QuestionRecord> = segments
            .iter()
            .map(|segment| {
                let parsed = parse_alternatives(&segment.body);
                let image = match self.mode {
                    OutputMode::Markup => matcher
                        .claim(positions.get(&segment.number))
                        .map(|region| region.image.clone())
                        .unwrap_or_default(),
                    OutputMode::Plain => String::new(),
                };
                if !positions.contains_key(&segment.number) {
                    debug!("question {} has no recorded position", segment.number);
                }

                let alternatives: IndexMap<String, String> = parsed
                    .alternatives
                    .iter()
                    .map(|(letter, value)| {
                        (format!("alternativa_{letter}"), self.mode.render(value))
                    })
                    .collect();

                QuestionRecord {
                    number: segment.number,
                    statement: self.mode.render(&parsed.stem),
                    image,
                    alternatives,
                    correct_alternative: String::new(),
                }
            })
            .collect();

        info!(
            "assembled {} questions ({} mode), images matched {}/{}",
            records.len(),
            self.mode,
            matcher.claimed_count(),
            regions.len()
        );
        records
    }
}
