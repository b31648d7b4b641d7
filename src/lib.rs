pub mod core;
pub mod export;
pub mod layout;
pub mod marker;
pub mod parser;
pub mod pipeline;
pub mod questions;

pub use core::model::{MarkerRegion, QuestionRecord};
pub use pipeline::{build_questions, export_questions, run_pipeline, PipelineConfig};
pub use questions::OutputMode;
