use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use image::RgbImage;

use crate::core::geometry::Rect;

/// Renders a rectangular clip of a page to pixels.
pub trait ClipRasterizer {
    fn render_clip(&self, pdf_path: &Path, page_idx: usize, clip: Rect, dpi: u32)
        -> Result<RgbImage>;
}

/// Pixel window `(x, y, width, height)` covering `clip` at `dpi`.
pub fn pixel_window(clip: &Rect, dpi: u32) -> (u32, u32, u32, u32) {
    let scale = dpi as f64 / 72.0;
    let x = (clip.x0 * scale).floor().max(0.0);
    let y = (clip.y0 * scale).floor().max(0.0);
    let width = ((clip.x1 * scale).ceil() - x).max(1.0);
    let height = ((clip.y1 * scale).ceil() - y).max(1.0);
    (x as u32, y as u32, width as u32, height as u32)
}

/// Clip rendering through poppler's `pdftoppm`.
#[derive(Debug, Clone, Default)]
pub struct PageRenderer;

impl PageRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ClipRasterizer for PageRenderer {
    fn render_clip(
        &self,
        pdf_path: &Path,
        page_idx: usize,
        clip: Rect,
        dpi: u32,
    ) -> Result<RgbImage> {
        let out_dir = tempfile::tempdir().context("failed to create render directory")?;

        // pdftoppm uses 1-based page indices
        let page_number = (page_idx + 1).to_string();
        let prefix = out_dir.path().join("clip");
        let (x, y, width, height) = pixel_window(&clip, dpi);

        let status = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-x")
            .arg(x.to_string())
            .arg("-y")
            .arg(y.to_string())
            .arg("-W")
            .arg(width.to_string())
            .arg("-H")
            .arg(height.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .status()
            .with_context(|| "failed to invoke pdftoppm; is poppler-utils installed?")?;

        if !status.success() {
            anyhow::bail!("pdftoppm failed with status: {status}");
        }

        // -singlefile writes `<prefix>.png`
        let image_path = prefix.with_extension("png");
        if !image_path.exists() {
            anyhow::bail!(
                "expected rendered image not found: {}",
                image_path.display()
            );
        }

        let image = image::open(&image_path)
            .with_context(|| format!("failed to decode {}", image_path.display()))?;
        Ok(image.to_rgb8())
    }
}
