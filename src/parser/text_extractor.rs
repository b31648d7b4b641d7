use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use unicode_normalization::UnicodeNormalization;

use crate::core::model::Word;

/// Supplies the positioned words of a page.
pub trait WordSource {
    /// Words of page `page_idx` (0-based) in page space.
    fn page_words(&self, pdf_path: &Path, page_idx: usize) -> Result<Vec<Word>>;
}

/// Word boxes from poppler's `pdftotext -bbox`.
#[derive(Debug, Clone, Default)]
pub struct PdftotextWords;

impl PdftotextWords {
    pub fn new() -> Self {
        Self
    }
}

impl WordSource for PdftotextWords {
    fn page_words(&self, pdf_path: &Path, page_idx: usize) -> Result<Vec<Word>> {
        // pdftotext uses 1-based page indices
        let page_number = (page_idx + 1).to_string();
        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg("-enc")
            .arg("UTF-8")
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg(pdf_path)
            .arg("-")
            .output()
            .with_context(|| "failed to invoke pdftotext; is poppler-utils installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pdftotext failed with status {}: {stderr}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_bbox_words(&stdout)
    }
}

fn word_from_attributes(start: &BytesStart<'_>) -> Result<Word> {
    let mut word = Word::new(String::new(), 0.0, 0.0, 0.0, 0.0);
    for attr in start.attributes() {
        let attr = attr?;
        let slot = match attr.key.as_ref() {
            b"xMin" => &mut word.x0,
            b"yMin" => &mut word.top,
            b"xMax" => &mut word.x1,
            b"yMax" => &mut word.bottom,
            _ => continue,
        };
        *slot = attr
            .unescape_value()?
            .trim()
            .parse()
            .with_context(|| "non-numeric word coordinate in pdftotext output")?;
    }
    Ok(word)
}

/// Parses the XHTML produced by `pdftotext -bbox`. Word text is NFC
/// normalized so accented letters compare equal however the PDF encoded
/// them.
pub fn parse_bbox_words(xhtml: &str) -> Result<Vec<Word>> {
    let mut reader = Reader::from_str(xhtml);
    reader.config_mut().trim_text(true);

    let mut words = Vec::new();
    let mut current: Option<Word> = None;
    loop {
        match reader
            .read_event()
            .with_context(|| format!("malformed pdftotext output at {}", reader.buffer_position()))?
        {
            Event::Start(start) if start.name().as_ref() == b"word" => {
                current = Some(word_from_attributes(&start)?);
            }
            Event::Text(text) => {
                if let Some(word) = current.as_mut() {
                    word.text.push_str(&text.unescape()?);
                }
            }
            Event::End(end) if end.name().as_ref() == b"word" => {
                if let Some(mut word) = current.take() {
                    word.text = word.text.nfc().collect();
                    if !word.text.is_empty() {
                        words.push(word);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(words)
}
