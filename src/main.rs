use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use log::{error, LevelFilter};

use examparse::pipeline::{build_questions, export_questions, PipelineConfig};
use examparse::OutputMode;

#[derive(Parser, Debug)]
#[command(name = "examparse")]
#[command(version, about = "Convert a two-column PDF exam into structured question records", long_about = None)]
struct Cli {
    /// Input PDF file path
    input: Option<PathBuf>,

    /// Output JSON file (default: <input_stem>_output.json next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How statements and alternatives are written
    #[arg(short, long, value_enum, default_value_t = Mode::Markup)]
    mode: Mode,

    /// Rendering DPI for diagram images
    #[arg(long, default_value_t = 200)]
    dpi: u32,

    /// Only read the first N pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Keep at most N questions
    #[arg(long, default_value_t = 100)]
    max_questions: usize,

    /// Vertical slack (points) when matching images to questions
    #[arg(long, default_value_t = 50.0)]
    match_tolerance: f64,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// <p>-wrapped paragraphs with images
    Markup,
    /// Flowing text without images
    Plain,
}

impl From<Mode> for OutputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Markup => OutputMode::Markup,
            Mode::Plain => OutputMode::Plain,
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Warn,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    init_logging(cli.verbose, cli.quiet);

    let Some(input) = cli.input.clone() else {
        eprintln!("{}", Cli::command().render_usage());
        return ExitCode::FAILURE;
    };

    match convert(input, cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn convert(input: PathBuf, cli: Cli) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("input file does not exist: {}", input.display());
    }

    let mut config = PipelineConfig::new(input.clone(), cli.output);
    config.mode = cli.mode.into();
    config.markers.dpi = cli.dpi;
    config.max_pages = cli.max_pages;
    config.max_questions = cli.max_questions;
    config.matching.tolerance = cli.match_tolerance;

    log::info!("processing {} ({} mode)", input.display(), config.mode);
    let records = build_questions(&config)
        .with_context(|| format!("failed to process PDF: {}", input.display()))?;
    export_questions(&records, &config.output)
        .with_context(|| format!("failed to export to: {}", config.output.display()))?;
    Ok(())
}
