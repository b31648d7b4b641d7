//! Read-only analysis pass over the cleaned document.

pub mod columns;
pub mod positions;

pub use columns::{ColumnSplit, ColumnSplitter};
pub use positions::{index_page, PositionIndex};

use anyhow::Result;
use log::{debug, info};

use crate::parser::ParserTrack;

#[derive(Debug, Clone, Default)]
pub struct DocumentLayout {
    /// Page texts (left column, then right) separated by blank lines.
    pub text: String,
    pub positions: PositionIndex,
}

/// Splits every page into columns, collects the running text and indexes
/// where each question starts.
pub fn analyze_document(
    track: &dyn ParserTrack,
    splitter: &ColumnSplitter,
    page_limit: Option<usize>,
) -> Result<DocumentLayout> {
    let total = track.page_count();
    let limit = page_limit.map_or(total, |limit| limit.min(total));
    info!("reading {limit} of {total} pages");

    let mut pages_text = Vec::with_capacity(limit);
    let mut positions = PositionIndex::new();
    for page_idx in 0..limit {
        let page = track.analyze_page(page_idx)?;
        let split = splitter.split(&page);
        index_page(page.page_number, &split, &mut positions);
        let text = split.page_text();
        debug!(
            "page {}/{}: split at x={:.1}, {} chars",
            page.page_number,
            limit,
            split.split_x,
            text.len()
        );
        if !text.is_empty() {
            pages_text.push(text);
        }
    }

    info!("question starts located: {}", positions.len());
    Ok(DocumentLayout {
        text: pages_text.join("\n\n"),
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{PageContent, Word};

    struct StaticPages(Vec<PageContent>);

    impl ParserTrack for StaticPages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn analyze_page(&self, page_idx: usize) -> Result<PageContent> {
            Ok(self.0[page_idx].clone())
        }
    }

    fn page(number: usize, words: Vec<Word>) -> PageContent {
        PageContent {
            page_number: number,
            width: 600.0,
            height: 800.0,
            segments: vec![],
            words,
        }
    }

    #[test]
    fn joins_pages_and_skips_empty_ones() -> Result<()> {
        let pages = StaticPages(vec![
            page(
                1,
                vec![
                    Word::new("1.", 40.0, 100.0, 50.0, 110.0),
                    Word::new("Left", 55.0, 100.0, 80.0, 110.0),
                    Word::new("Right", 320.0, 100.0, 350.0, 110.0),
                ],
            ),
            page(2, vec![]),
            page(3, vec![Word::new("2.", 320.0, 50.0, 330.0, 60.0)]),
        ]);

        let layout = analyze_document(&pages, &ColumnSplitter::default(), None)?;
        assert_eq!(layout.text, "1. Left\nRight\n\n2.");
        assert_eq!(layout.positions[&2].page, 3);

        let limited = analyze_document(&pages, &ColumnSplitter::default(), Some(1))?;
        assert_eq!(limited.text, "1. Left\nRight");
        assert!(!limited.positions.contains_key(&2));
        Ok(())
    }
}
