pub mod json_export;

use anyhow::Result;

use crate::core::model::QuestionRecord;

pub use json_export::{default_output_path, JsonExporter};

pub trait Exporter {
    fn export(&self, records: &[QuestionRecord]) -> Result<()>;
}
