use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::core::geometry::{LineSegment, Rect};
use crate::core::model::PathObject;
use crate::parser::content::{operand_f64, scan_operations, PageScan, PageSpace};

/// Edge slack when deciding whether a redaction covers a drawing.
const COVER_TOLERANCE: f64 = 1.0;

/// Page media box in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl MediaBox {
    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    pub fn space(&self) -> PageSpace {
        PageSpace {
            origin_x: self.x0.min(self.x1),
            top: self.y0.max(self.y1),
        }
    }
}

/// What a redaction removed from one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedactionSummary {
    pub paths_removed: usize,
    pub texts_removed: usize,
    pub rects_painted: usize,
}

/// A PDF loaded in memory.
#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        let document = Document::load(&path)
            .with_context(|| format!("failed to parse PDF {}", path.display()))?;
        let page_ids = document.get_pages().values().copied().collect();
        Ok(Self {
            path,
            document,
            page_ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_id(&self, page_idx: usize) -> Result<ObjectId> {
        self.page_ids.get(page_idx).copied().with_context(|| {
            format!(
                "page {} out of range ({} pages)",
                page_idx + 1,
                self.page_ids.len()
            )
        })
    }

    pub fn media_box(&self, page_idx: usize) -> Result<MediaBox> {
        let page_id = self.page_id(page_idx)?;
        let obj = resolve_inherited(&self.document, page_id, b"MediaBox")?
            .with_context(|| format!("page {} has no MediaBox", page_idx + 1))?;
        let array = self.resolve(obj).as_array().with_context(|| {
            format!("MediaBox of page {} is not an array", page_idx + 1)
        })?;
        let values: Vec<f64> = array
            .iter()
            .filter_map(|o| operand_f64(self.resolve(o)))
            .collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Ok(MediaBox {
                x0: *x0,
                y0: *y0,
                x1: *x1,
                y1: *y1,
            }),
            _ => anyhow::bail!("malformed MediaBox on page {}", page_idx + 1),
        }
    }

    /// Page rotation in degrees, normalized to `0..360`. Geometry read by
    /// this type is unrotated while poppler output is not.
    pub fn rotation(&self, page_idx: usize) -> Result<i64> {
        let page_id = self.page_id(page_idx)?;
        let degrees = match resolve_inherited(&self.document, page_id, b"Rotate")? {
            Some(obj) => self
                .resolve(obj)
                .as_i64()
                .with_context(|| format!("Rotate of page {} is not an integer", page_idx + 1))?,
            None => 0,
        };
        Ok(degrees.rem_euclid(360))
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn page_content(&self, page_idx: usize) -> Result<Content> {
        let page_id = self.page_id(page_idx)?;
        let bytes = self
            .document
            .get_page_content(page_id)
            .with_context(|| format!("failed to read content of page {}", page_idx + 1))?;
        Content::decode(&bytes)
            .with_context(|| format!("failed to decode content of page {}", page_idx + 1))
    }

    fn scan(&self, page_idx: usize) -> Result<(Content, PageScan)> {
        let content = self.page_content(page_idx)?;
        let space = self.media_box(page_idx)?.space();
        let scan = scan_operations(&content.operations, space);
        Ok((content, scan))
    }

    /// Painted vector paths of a page, in content order.
    pub fn drawings(&self, page_idx: usize) -> Result<Vec<PathObject>> {
        let (_, scan) = self.scan(page_idx)?;
        Ok(scan
            .paths
            .into_iter()
            .filter(|p| !p.clipping)
            .map(|p| p.object)
            .collect())
    }

    /// Straight stroked segments of a page (ruling candidates).
    pub fn line_segments(&self, page_idx: usize) -> Result<Vec<LineSegment>> {
        let (_, scan) = self.scan(page_idx)?;
        Ok(scan
            .paths
            .into_iter()
            .filter(|p| !p.clipping)
            .flat_map(|p| p.object.segments)
            .collect())
    }

    /// Erases `rects` (page space) from a page: drawings they cover and
    /// text starting inside them are dropped and each rectangle is painted
    /// white over the remaining content.
    pub fn redact(&mut self, page_idx: usize, rects: &[Rect]) -> Result<RedactionSummary> {
        if rects.is_empty() {
            return Ok(RedactionSummary::default());
        }
        let page_id = self.page_id(page_idx)?;
        let media_box = self.media_box(page_idx)?;
        let (content, scan) = self.scan(page_idx)?;

        let mut dropped: HashSet<usize> = HashSet::new();
        let mut summary = RedactionSummary::default();
        for path in scan.paths.iter().filter(|p| !p.clipping) {
            if rects
                .iter()
                .any(|r| r.covers(&path.object.bbox, COVER_TOLERANCE))
            {
                dropped.extend(path.ops.clone());
                summary.paths_removed += 1;
            }
        }
        let mut texts: HashSet<usize> = HashSet::new();
        for text in &scan.texts {
            if rects.iter().any(|r| r.contains_point(text.x, text.y)) {
                texts.insert(text.op);
                summary.texts_removed += 1;
            }
        }

        let mut operations = Vec::with_capacity(content.operations.len() + rects.len() * 5 + 2);
        operations.push(Operation::new("q", vec![]));
        for (idx, operation) in content.operations.into_iter().enumerate() {
            if dropped.contains(&idx) {
                continue;
            }
            if texts.contains(&idx) {
                operations.extend(line_advance_only(operation));
                continue;
            }
            operations.push(operation);
        }
        operations.push(Operation::new("Q", vec![]));

        let space = media_box.space();
        for rect in rects {
            let (x, y) = space.to_user(rect.x0, rect.y1);
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
                Operation::new(
                    "re",
                    vec![
                        real(x),
                        real(y),
                        real(rect.width()),
                        real(rect.height()),
                    ],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ]);
            summary.rects_painted += 1;
        }

        let bytes = Content { operations }
            .encode()
            .with_context(|| format!("failed to encode content of page {}", page_idx + 1))?;
        let stream_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), bytes));
        self.document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .with_context(|| format!("page {} is not a dictionary", page_idx + 1))?
            .set("Contents", Object::Reference(stream_id));

        Ok(summary)
    }

    /// Writes the (possibly redacted) document to `path`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.document
            .save(path)
            .with_context(|| format!("failed to write PDF {}", path.display()))?;
        Ok(())
    }
}

fn real(value: f64) -> Object {
    (value as f32).into()
}

/// Replacement for a dropped text-show operator that keeps its line
/// movement so later lines stay in place.
fn line_advance_only(operation: Operation) -> Vec<Operation> {
    match operation.operator.as_str() {
        "'" => vec![Operation::new("T*", vec![])],
        "\"" => {
            let mut operands = operation.operands.into_iter();
            let mut ops = Vec::with_capacity(3);
            if let Some(word_spacing) = operands.next() {
                ops.push(Operation::new("Tw", vec![word_spacing]));
            }
            if let Some(char_spacing) = operands.next() {
                ops.push(Operation::new("Tc", vec![char_spacing]));
            }
            ops.push(Operation::new("T*", vec![]));
            ops
        }
        _ => Vec::new(),
    }
}

/// Looks a key up on the page dictionary, walking `/Parent` links when the
/// page inherits it.
fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut current_id = page_id;
    loop {
        let dict = doc
            .get_object(current_id)
            .and_then(Object::as_dict)
            .context("failed to get page dictionary")?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent) => {
                current_id = parent
                    .as_reference()
                    .context("invalid /Parent reference")?;
            }
            Err(_) => return Ok(None),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::{dictionary, Document, Object, ObjectId, Stream};

    /// Builds a PDF whose pages carry the given raw content streams.
    pub fn build_pdf(pages: &[&str], width: i64, height: i64) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids: Vec<Object> = Vec::new();
        for content in pages {
            let content_id = doc.add_object(Stream::new(
                lopdf::Dictionary::new(),
                content.as_bytes().to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::build_pdf;
    use super::*;
    use crate::core::color::Rgb;
    use pretty_assertions::assert_eq;

    fn reader(pages: &[&str]) -> (tempfile::TempDir, PdfReader) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        build_pdf(pages, 612, 792).save(&path).unwrap();
        let reader = PdfReader::new(path).unwrap();
        (dir, reader)
    }

    #[test]
    fn reads_inherited_media_box() {
        let (_dir, reader) = reader(&["", ""]);
        assert_eq!(reader.page_count(), 2);
        let media_box = reader.media_box(1).unwrap();
        assert_eq!(media_box.width(), 612.0);
        assert_eq!(media_box.height(), 792.0);
    }

    #[test]
    fn reads_page_rotation() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("rotated.pdf");
        let mut doc = build_pdf(&["", ""], 612, 792);
        let first_page = doc.get_pages()[&1];
        doc.get_object_mut(first_page)
            .and_then(Object::as_dict_mut)?
            .set("Rotate", -90);
        doc.save(&path)?;

        let reader = PdfReader::new(path)?;
        assert_eq!(reader.rotation(0)?, 270);
        assert_eq!(reader.rotation(1)?, 0);
        Ok(())
    }

    #[test]
    fn lists_drawings_and_segments() {
        let (_dir, reader) = reader(&["1 0 0 rg 10 10 50 50 re f 0 G 306 72 m 306 720 l S"]);
        let drawings = reader.drawings(0).unwrap();
        assert_eq!(drawings.len(), 2);
        assert_eq!(drawings[0].fill, Some(Rgb::new(1.0, 0.0, 0.0)));
        assert_eq!(drawings[0].bbox, Rect::new(10.0, 732.0, 60.0, 782.0));
        let segments = reader.line_segments(0).unwrap();
        assert_eq!(segments, vec![LineSegment::new(306.0, 720.0, 306.0, 72.0)]);
    }

    #[test]
    fn redaction_drops_covered_content_and_survives_reload() -> Result<()> {
        let (dir, mut reader) = reader(&[
            "0.6 0.16 0.69 RG 100 500 200 100 re S \
             BT /F1 10 Tf 120 550 Td (inside) Tj ET \
             BT /F1 10 Tf 120 300 Td (outside) Tj ET",
        ]);
        let rect = Rect::new(100.0, 192.0, 300.0, 292.0);
        let summary = reader.redact(0, &[rect])?;
        assert_eq!(
            summary,
            RedactionSummary {
                paths_removed: 1,
                texts_removed: 1,
                rects_painted: 1,
            }
        );

        let cleaned = dir.path().join("cleaned.pdf");
        reader.save(&cleaned)?;
        let reloaded = PdfReader::new(cleaned)?;
        let drawings = reloaded.drawings(0)?;
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].fill, Some(Rgb::gray(1.0)));
        assert_eq!(drawings[0].bbox, rect);

        let content = reloaded.page_content(0)?;
        let shows = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .count();
        assert_eq!(shows, 1);
        Ok(())
    }

    #[test]
    fn empty_redaction_leaves_page_untouched() {
        let (_dir, mut reader) = reader(&["0 0 10 10 re f"]);
        assert_eq!(reader.redact(0, &[]).unwrap(), RedactionSummary::default());
        assert_eq!(reader.drawings(0).unwrap().len(), 1);
    }
}
