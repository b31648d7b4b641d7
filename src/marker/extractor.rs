use std::io::Cursor;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgb as Pixel, RgbImage};
use log::{debug, info, warn};

use crate::core::geometry::Rect;
use crate::core::model::{Column, MarkerRegion};
use crate::core::policy::MarkerPolicy;
use crate::marker::detector::MarkerRegionDetector;
use crate::marker::renderer::ClipRasterizer;
use crate::parser::pdf_reader::PdfReader;

/// Forces every pixel close to `color` (each channel strictly within
/// `tolerance`) to white. Returns how many pixels changed.
pub fn recolor_marker_pixels(image: &mut RgbImage, color: [u8; 3], tolerance: u8) -> usize {
    let near = |value: u8, target: u8| value.abs_diff(target) < tolerance;
    let mut changed = 0;
    for pixel in image.pixels_mut() {
        let [r, g, b] = pixel.0;
        if near(r, color[0]) && near(g, color[1]) && near(b, color[2]) {
            *pixel = Pixel([255, 255, 255]);
            changed += 1;
        }
    }
    changed
}

/// PNG-encodes the image and wraps it in standard base64.
pub fn encode_png_base64(image: &RgbImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("failed to encode PNG")?;
    Ok(STANDARD.encode(buffer.into_inner()))
}

/// Column a region belongs to, judged by its horizontal center.
pub fn column_hint(rect: &Rect, page_width: f64) -> Column {
    if rect.center().0 < page_width / 2.0 {
        Column::Left
    } else {
        Column::Right
    }
}

/// Turns marker rectangles into images and erases them from the document.
pub struct RegionImageExtractor<'a, R> {
    rasterizer: &'a R,
    policy: &'a MarkerPolicy,
}

impl<'a, R: ClipRasterizer> RegionImageExtractor<'a, R> {
    pub fn new(rasterizer: &'a R, policy: &'a MarkerPolicy) -> Self {
        Self { rasterizer, policy }
    }

    /// Renders one marker rectangle of page `page_idx` into a region.
    pub fn extract_region(
        &self,
        reader: &PdfReader,
        page_idx: usize,
        page_size: (f64, f64),
        rect: Rect,
    ) -> Result<MarkerRegion> {
        let (width, height) = page_size;
        let clip = rect.expand(self.policy.margin).clamp_to(width, height);
        let mut image = self
            .rasterizer
            .render_clip(reader.path(), page_idx, clip, self.policy.dpi)
            .with_context(|| format!("failed to render marker region on page {}", page_idx + 1))?;
        let recolored = recolor_marker_pixels(
            &mut image,
            self.policy.pixel_color,
            self.policy.pixel_tolerance,
        );
        let encoded = encode_png_base64(&image)?;

        let region = MarkerRegion {
            page: page_idx + 1,
            rect,
            image: encoded,
            y_center: rect.center().1,
            column: column_hint(&rect, width),
        };
        debug!(
            "page {}: region ({:.1}, {:.1}, {:.1}, {:.1}) column={} pixels_recolored={} size={} chars",
            region.page,
            rect.x0,
            rect.y0,
            rect.x1,
            rect.y1,
            region.column,
            recolored,
            region.image.len()
        );
        Ok(region)
    }

    /// Mutation pass: extracts every marker region of the document, then
    /// redacts the page's rectangles once all of them were rendered. The
    /// rasterizer always reads the untouched file on disk.
    pub fn extract_and_erase(
        &self,
        reader: &mut PdfReader,
        page_limit: Option<usize>,
    ) -> Result<Vec<MarkerRegion>> {
        let detector = MarkerRegionDetector::new(self.policy.classifier());
        let page_count = page_limit.map_or(reader.page_count(), |limit| {
            limit.min(reader.page_count())
        });

        let mut regions = Vec::new();
        for page_idx in 0..page_count {
            let media_box = reader.media_box(page_idx)?;
            let drawings = reader.drawings(page_idx)?;
            let markers = detector.detect(&drawings);
            debug!(
                "page {}/{}: {} drawings, {} markers",
                page_idx + 1,
                page_count,
                drawings.len(),
                markers.len()
            );
            if markers.is_empty() {
                continue;
            }

            let rotation = reader.rotation(page_idx)?;
            if rotation != 0 {
                warn!(
                    "page {} is rotated by {rotation} degrees; rendered regions may be misplaced",
                    page_idx + 1
                );
            }
            let page_size = (media_box.width(), media_box.height());
            for marker in &markers {
                debug!("page {}: marker found on {} channel", page_idx + 1, marker.channel);
                regions.push(self.extract_region(reader, page_idx, page_size, marker.rect)?);
            }

            let rects: Vec<Rect> = markers.iter().map(|m| m.rect).collect();
            let summary = reader.redact(page_idx, &rects)?;
            debug!(
                "page {}: erased {} rectangles ({} drawings, {} text runs removed)",
                page_idx + 1,
                summary.rects_painted,
                summary.paths_removed,
                summary.texts_removed
            );
        }

        info!("extracted {} marker regions", regions.len());
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;

    use super::*;
    use crate::parser::pdf_reader::test_support::build_pdf;
    use pretty_assertions::assert_eq;

    /// Solid image whose size follows the clip, recording each request.
    #[derive(Default)]
    struct SolidRasterizer {
        calls: RefCell<Vec<(usize, Rect)>>,
    }

    impl ClipRasterizer for SolidRasterizer {
        fn render_clip(
            &self,
            _pdf_path: &Path,
            page_idx: usize,
            clip: Rect,
            _dpi: u32,
        ) -> Result<RgbImage> {
            self.calls.borrow_mut().push((page_idx, clip));
            Ok(RgbImage::from_pixel(4, 4, Pixel([156, 40, 176])))
        }
    }

    #[test]
    fn recolors_only_near_marker_pixels() {
        let mut image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Pixel([156, 40, 176]),
            1 => Pixel([200, 80, 210]),
            _ => Pixel([206, 40, 176]),
        });
        let changed = recolor_marker_pixels(&mut image, [156, 40, 176], 50);
        assert_eq!(changed, 2);
        assert_eq!(image.get_pixel(0, 0), &Pixel([255, 255, 255]));
        assert_eq!(image.get_pixel(1, 0), &Pixel([255, 255, 255]));
        assert_eq!(image.get_pixel(2, 0), &Pixel([206, 40, 176]));
    }

    #[test]
    fn encodes_png_signature() {
        let image = RgbImage::from_pixel(2, 2, Pixel([0, 0, 0]));
        let encoded = encode_png_base64(&image).unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn hints_column_from_center() {
        assert_eq!(column_hint(&Rect::new(50.0, 0.0, 250.0, 10.0), 612.0), Column::Left);
        assert_eq!(column_hint(&Rect::new(300.0, 0.0, 320.0, 10.0), 612.0), Column::Right);
    }

    #[test]
    fn extracts_and_erases_per_page() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.pdf");
        build_pdf(
            &[
                "0.612 0.157 0.69 rg 50 600 200 100 re f 0.612 0.157 0.69 RG 350 100 200 50 re S",
                "0 0 0 rg 0 0 10 10 re f",
            ],
            612,
            792,
        )
        .save(&path)?;
        let mut reader = PdfReader::new(path)?;
        let rasterizer = SolidRasterizer::default();
        let policy = MarkerPolicy::default();

        let regions = RegionImageExtractor::new(&rasterizer, &policy)
            .extract_and_erase(&mut reader, None)?;

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].page, 1);
        assert_eq!(regions[0].rect, Rect::new(50.0, 92.0, 250.0, 192.0));
        assert_eq!(regions[0].y_center, 142.0);
        assert_eq!(regions[0].column, Column::Left);
        assert_eq!(regions[1].column, Column::Right);
        assert_eq!(
            rasterizer.calls.borrow()[0],
            (0, Rect::new(47.0, 89.0, 253.0, 195.0))
        );

        // rendered marker pixels were whitened before encoding
        let png = STANDARD.decode(&regions[0].image)?;
        let decoded = image::load_from_memory(&png)?.to_rgb8();
        assert!(decoded.pixels().all(|p| p.0 == [255, 255, 255]));

        // only white cover rectangles remain on the first page
        let detector = MarkerRegionDetector::new(policy.classifier());
        assert!(detector.detect(&reader.drawings(0)?).is_empty());
        assert_eq!(reader.drawings(1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn page_limit_skips_later_pages() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.pdf");
        let marker = "0.612 0.157 0.69 rg 50 600 200 100 re f";
        build_pdf(&[marker, marker, marker], 612, 792).save(&path)?;
        let mut reader = PdfReader::new(path)?;
        let rasterizer = SolidRasterizer::default();
        let policy = MarkerPolicy::default();

        let regions = RegionImageExtractor::new(&rasterizer, &policy)
            .extract_and_erase(&mut reader, Some(2))?;
        assert_eq!(regions.iter().map(|r| r.page).collect::<Vec<_>>(), vec![1, 2]);
        Ok(())
    }
}
