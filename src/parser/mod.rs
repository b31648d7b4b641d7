pub mod content;
pub mod layout_builder;
pub mod pdf_reader;
pub mod text_extractor;

pub use pdf_reader::PdfReader;
pub use text_extractor::{PdftotextWords, WordSource};

use anyhow::Result;

use crate::core::model::PageContent;

pub trait ParserTrack {
    fn page_count(&self) -> usize;
    fn analyze_page(&self, page_idx: usize) -> Result<PageContent>;
}
