// 🏗️ CSV Parser - header-keyed rows
// Splits the archive's tabular text into one map per data row.
// Rows with the wrong number of columns are rejected and counted, never realigned.

use crate::error::{SkyError, SkyResult};
use csv::ReaderBuilder;
use std::collections::HashMap;

/// One data row keyed by the header's column names (verbatim)
pub type RawRow = HashMap<String, String>;

/// A row that could not be mapped onto the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-indexed line in the source text (header is line 1)
    pub line: u64,
    pub expected_columns: usize,
    pub found_columns: usize,
    pub message: String,
}

/// Output of [`parse_table`]
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub errors: Vec<RowError>,
}

impl ParsedTable {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse CSV text whose first line is the header row.
///
/// Quoted fields may contain commas (the archive's reference column does).
/// Blank lines, including the trailing terminator line, produce no rows.
///
/// # Returns
/// * `Ok(ParsedTable)` - accepted rows plus one [`RowError`] per rejected row
/// * `Err(SkyError::ParseMismatch)` - the header row is missing
pub fn parse_table(text: &str) -> SkyResult<ParsedTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SkyError::ParseMismatch("missing header row".to_string()));
    }

    let mut table = ParsedTable {
        headers,
        rows: Vec::new(),
        errors: Vec::new(),
    };

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                table.errors.push(RowError {
                    line,
                    expected_columns: table.headers.len(),
                    found_columns: 0,
                    message: err.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != table.headers.len() {
            table.errors.push(RowError {
                line,
                expected_columns: table.headers.len(),
                found_columns: record.len(),
                message: format!(
                    "expected {} columns, found {}",
                    table.headers.len(),
                    record.len()
                ),
            });
            continue;
        }

        let row: RawRow = table
            .headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.to_string()))
            .collect();

        table.rows.push(row);
    }

    Ok(table)
}

// ============================================================================
// TESTS
// ============================================================================
