use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::model::QuestionRecord;
use crate::export::Exporter;

/// `<dir>/<stem>_output.json` next to the input document.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "questions".to_string());
    input.with_file_name(format!("{stem}_output.json"))
}

/// Writes the records as one pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, records: &[QuestionRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
