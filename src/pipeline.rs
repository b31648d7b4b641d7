use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use tempfile::NamedTempFile;

use crate::core::model::{MarkerRegion, QuestionRecord};
use crate::core::policy::{ColumnPolicy, MarkerPolicy, MatchPolicy};
use crate::export::{default_output_path, Exporter, JsonExporter};
use crate::layout::{analyze_document, ColumnSplitter};
use crate::marker::{ClipRasterizer, PageRenderer, RegionImageExtractor};
use crate::parser::{layout_builder::ParserLayoutBuilder, PdfReader, PdftotextWords, WordSource};
use crate::questions::{
    normalize_text, OutputMode, QuestionSegmenter, RecordAssembler, DEFAULT_MAX_QUESTIONS,
};

/// External programs the default collaborators shell out to.
pub const REQUIRED_TOOLS: [&str; 2] = ["pdftoppm", "pdftotext"];

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: OutputMode,
    /// Only the first `n` pages are read when set.
    pub max_pages: Option<usize>,
    pub max_questions: usize,
    pub markers: MarkerPolicy,
    pub columns: ColumnPolicy,
    pub matching: MatchPolicy,
}

impl PipelineConfig {
    /// Default settings; the output lands next to the input unless given.
    pub fn new(input: PathBuf, output: Option<PathBuf>) -> Self {
        let output = output.unwrap_or_else(|| default_output_path(&input));
        Self {
            input,
            output,
            mode: OutputMode::default(),
            max_pages: None,
            max_questions: DEFAULT_MAX_QUESTIONS,
            markers: MarkerPolicy::default(),
            columns: ColumnPolicy::default(),
            matching: MatchPolicy::default(),
        }
    }
}

/// Fails unless `tool` can be started.
pub fn ensure_tool(tool: &str) -> Result<()> {
    match Command::new(tool).arg("-v").output() {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            bail!("{tool} not found on PATH; is poppler-utils installed?")
        }
        Err(err) => Err(err).with_context(|| format!("failed to invoke {tool}")),
    }
}

/// Runs the whole conversion with the poppler-backed collaborators.
pub fn build_questions(config: &PipelineConfig) -> Result<Vec<QuestionRecord>> {
    for tool in REQUIRED_TOOLS {
        ensure_tool(tool)?;
    }
    run_pipeline(config, &PageRenderer::new(), PdftotextWords::new())
}

/// Mutation pass then analysis pass. The cleaned snapshot only lives for
/// the duration of this call.
pub fn run_pipeline<R, W>(
    config: &PipelineConfig,
    rasterizer: &R,
    words: W,
) -> Result<Vec<QuestionRecord>>
where
    R: ClipRasterizer,
    W: WordSource,
{
    let (regions, snapshot) = clean_document(config, rasterizer)?;

    let reader = PdfReader::new(snapshot.path().to_path_buf())
        .context("failed to reopen the cleaned document")?;
    let track = ParserLayoutBuilder::new(reader, words);
    let splitter = ColumnSplitter::new(config.columns.clone());
    let layout = analyze_document(&track, &splitter, config.max_pages)?;

    let text = normalize_text(&layout.text);
    debug!("normalized text: {} chars", text.len());
    let segments = QuestionSegmenter::new(config.max_questions).segment(&text);
    info!("segmented {} questions", segments.len());

    let assembler = RecordAssembler::new(config.mode, config.matching.clone());
    Ok(assembler.assemble(&segments, &layout.positions, &regions))
}

/// Extracts the marker regions and saves the document with them erased.
fn clean_document<R: ClipRasterizer>(
    config: &PipelineConfig,
    rasterizer: &R,
) -> Result<(Vec<MarkerRegion>, NamedTempFile)> {
    let mut reader = PdfReader::new(config.input.clone())?;
    let regions = RegionImageExtractor::new(rasterizer, &config.markers)
        .extract_and_erase(&mut reader, config.max_pages)?;

    let snapshot = tempfile::Builder::new()
        .prefix("cleaned_")
        .suffix(".pdf")
        .tempfile()
        .context("failed to create the cleaned document")?;
    reader.save(snapshot.path())?;
    debug!("cleaned document written to {}", snapshot.path().display());
    Ok((regions, snapshot))
}

pub fn export_questions(records: &[QuestionRecord], output: &Path) -> Result<()> {
    JsonExporter::new(output.to_path_buf()).export(records)?;
    let with_image = records.iter().filter(|r| r.has_image()).count();
    info!(
        "saved {} questions ({} with images) to {}",
        records.len(),
        with_image,
        output.display()
    );
    Ok(())
}
