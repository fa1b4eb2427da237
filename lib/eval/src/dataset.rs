//! Ground-truth loading.
//!
//! Input files are header-having CSV. Bytes are decoded as UTF-8 (BOM
//! optional), then windows-1251, then UTF-8 with replacement characters;
//! decoding never fails.

use crate::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const COL_INPUT_TEXT: &str = "Input text";
pub const COL_BUSINESS: &str = "Business";
pub const COL_DATETIME: &str = "Datetime";
pub const COL_DESCRIPTION: &str = "Description";
pub const COL_AMOUNT: &str = "Amount";
pub const COL_CURRENCY: &str = "Currency";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// The one byte windows-1251 leaves unassigned
const CP1251_UNASSIGNED: u8 = 0x98;

/// One labeled example: the spoken text and the expected field values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthRow {
    pub input_text: String,
    pub business: String,
    pub datetime: String,
    pub description: String,
    pub amount: String,
    pub currency: String,
}

/// Decode raw file bytes through the fallback chain
pub fn decode_bytes(raw: &[u8]) -> String {
    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    if let Some(text) = encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(body) {
        return text.into_owned();
    }
    if !raw.contains(&CP1251_UNASSIGNED) {
        if let Some(text) = encoding_rs::WINDOWS_1251.decode_without_bom_handling_and_without_replacement(raw) {
            return text.into_owned();
        }
    }
    String::from_utf8_lossy(raw).into_owned()
}

/// Split decoded CSV text into header and data rows
pub fn read_table(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    if rows.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let header = rows.remove(0);
    Ok((header, rows))
}

/// Case-insensitive, whitespace-trimmed column lookup
pub fn column_index(header: &[String], name: &str) -> Result<usize> {
    let wanted = name.trim().to_lowercase();
    header
        .iter()
        .position(|h| h.trim().to_lowercase() == wanted)
        .ok_or_else(|| EvalError::MissingColumn(name.to_string()))
}

/// Map raw rows onto ground truth. Short rows read as empty cells.
pub fn rows_from_table(header: &[String], rows: &[Vec<String>]) -> Result<Vec<GroundTruthRow>> {
    let i_input = column_index(header, COL_INPUT_TEXT)?;
    let i_business = column_index(header, COL_BUSINESS)?;
    let i_datetime = column_index(header, COL_DATETIME)?;
    let i_description = column_index(header, COL_DESCRIPTION)?;
    let i_amount = column_index(header, COL_AMOUNT)?;
    let i_currency = column_index(header, COL_CURRENCY)?;

    let cell = |row: &[String], i: usize| row.get(i).cloned().unwrap_or_default();
    Ok(rows
        .iter()
        .map(|row| GroundTruthRow {
            input_text: cell(row, i_input),
            business: cell(row, i_business),
            datetime: cell(row, i_datetime),
            description: cell(row, i_description),
            amount: cell(row, i_amount),
            currency: cell(row, i_currency),
        })
        .collect())
}

/// Load the evaluation dataset. An empty file or a missing column is fatal.
pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<Vec<GroundTruthRow>> {
    let path = path.as_ref();
    let text = decode_bytes(&std::fs::read(path)?);
    let (header, rows) = read_table(&text)?;
    if header.is_empty() || rows.is_empty() {
        return Err(EvalError::EmptyDataset(path.display().to_string()));
    }
    rows_from_table(&header, &rows)
}
