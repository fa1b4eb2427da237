//! Evaluation output files.

use crate::dataset::decode_bytes;
use crate::result::{EvalResult, COLUMNS};
use crate::{EvalError, Result};
use std::path::Path;
use tracing::info;

/// Write results in input order under the fixed header
pub fn write_results<P: AsRef<Path>>(path: P, results: &[EvalResult]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(COLUMNS)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    info!(rows = results.len(), path = %path.display(), "Saved evaluation results");
    Ok(())
}

/// Read results back, decoding with the same fallback chain as the dataset
pub fn read_results<P: AsRef<Path>>(path: P) -> Result<Vec<EvalResult>> {
    let path = path.as_ref();
    let text = decode_bytes(&std::fs::read(path)?);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let results = reader
        .deserialize()
        .collect::<std::result::Result<Vec<EvalResult>, csv::Error>>()?;
    if results.is_empty() {
        return Err(EvalError::EmptyDataset(path.display().to_string()));
    }
    Ok(results)
}
