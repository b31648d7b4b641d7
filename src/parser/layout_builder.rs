use anyhow::Result;
use log::{trace, warn};

use crate::core::model::PageContent;
use crate::parser::pdf_reader::PdfReader;
use crate::parser::text_extractor::WordSource;
use crate::parser::ParserTrack;

/// Reads page geometry and ruling segments with lopdf and the words of the
/// page from a [`WordSource`].
#[derive(Debug)]
pub struct ParserLayoutBuilder<W> {
    reader: PdfReader,
    words: W,
}

impl<W: WordSource> ParserLayoutBuilder<W> {
    pub fn new(reader: PdfReader, words: W) -> Self {
        Self { reader, words }
    }
}

impl<W: WordSource> ParserTrack for ParserLayoutBuilder<W> {
    fn page_count(&self) -> usize {
        self.reader.page_count()
    }

    fn analyze_page(&self, page_idx: usize) -> Result<PageContent> {
        let media_box = self.reader.media_box(page_idx)?;
        let rotation = self.reader.rotation(page_idx)?;
        if rotation != 0 {
            warn!(
                "page {} is rotated by {rotation} degrees; word boxes may not line up with rulings",
                page_idx + 1
            );
        }
        let segments = self.reader.line_segments(page_idx)?;
        let words = self.words.page_words(self.reader.path(), page_idx)?;
        trace!(
            "page {}: {} segments, {} words",
            page_idx + 1,
            segments.len(),
            words.len()
        );

        Ok(PageContent {
            page_number: page_idx + 1,
            width: media_box.width(),
            height: media_box.height(),
            segments,
            words,
        })
    }
}
