//! Tabular decoder for CSV and XLSX uploads.
//!
//! Produces loosely-typed rows keyed by header, with no knowledge of
//! question semantics. Any decoding failure aborts the whole file.

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use calamine::{Data, Reader, Xlsx};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Rows tagged with their 1-based line (CSV) or sheet row (XLSX).
type Table = Vec<(u64, Vec<String>)>;

/// Declared format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    Csv,
    Xlsx,
}

impl TabularFormat {
    /// Guess the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }
}

impl fmt::Display for TabularFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabularFormat::Csv => write!(f, "csv"),
            TabularFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

impl FromStr for TabularFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(TabularFormat::Csv),
            "xlsx" => Ok(TabularFormat::Xlsx),
            other => Err(format!("unsupported file format: {other}")),
        }
    }
}

/// One decoded data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based position among the data rows (the header is not counted).
    pub index: usize,
    /// Lower-cased, trimmed header → trimmed cell value.
    cells: HashMap<String, String>,
}

impl RawRow {
    pub fn new(index: usize, cells: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            index,
            cells: cells
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                .collect(),
        }
    }

    /// Value of the first header alias present with a non-empty value.
    ///
    /// Aliases match headers case-insensitively.
    pub fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.cells
                .get(&alias.to_lowercase())
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        })
    }

    /// Like [`RawRow::get`] but returns `""` when absent.
    pub fn get_or_empty(&self, aliases: &[&str]) -> &str {
        self.get(aliases).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.is_empty())
    }
}

/// Decode `bytes` into rows.
///
/// Rows whose cells are all empty are skipped but keep their slot in the
/// numbering, so an index always names the same row an operator sees in a
/// spreadsheet view of the file.
pub fn decode(bytes: &[u8], format: TabularFormat) -> Result<Vec<RawRow>, DecodeError> {
    let table = match format {
        TabularFormat::Csv => read_csv(bytes)?,
        TabularFormat::Xlsx => read_xlsx(bytes)?,
    };
    let rows = assemble_rows(table)?;
    tracing::debug!(format = %format, rows = rows.len(), "decoded tabular upload");
    Ok(rows)
}

fn read_csv(bytes: &[u8]) -> Result<Table, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    // The reader drops empty lines without yielding a record, so the gap
    // between where a record starts and where the previous one ended is
    // the number of lines it skipped.
    let mut table = Vec::new();
    let mut row = 0u64;
    let mut expected_line = None;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line());
        let skipped = match (line, expected_line) {
            (Some(line), Some(expected)) => line.saturating_sub(expected),
            _ => 0,
        };
        row += 1 + skipped;
        let embedded: u64 = record.iter().map(|f| f.matches('\n').count() as u64).sum();
        expected_line = line.map(|l| l + 1 + embedded);
        table.push((row, record.iter().map(str::to_string).collect()));
    }
    Ok(table)
}

fn read_xlsx(bytes: &[u8]) -> Result<Table, DecodeError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoWorksheet)??;

    // The range starts at the first used cell, not at A1.
    let first_row = range.start().map(|(row, _)| u64::from(row)).unwrap_or(0);
    Ok(range
        .rows()
        .enumerate()
        .map(|(i, row)| {
            (
                first_row + i as u64 + 1,
                row.iter().map(cell_to_string).collect(),
            )
        })
        .collect())
}

/// Render a spreadsheet cell the way it would appear in a CSV export.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn assemble_rows(table: Table) -> Result<Vec<RawRow>, DecodeError> {
    let mut lines = table.into_iter();
    let (header_row, header) = lines.next().ok_or(DecodeError::MissingHeader)?;
    let header: Vec<String> = header
        .into_iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(DecodeError::MissingHeader);
    }

    let mut rows = Vec::new();
    for (line, values) in lines {
        let row = RawRow::new(
            (line - header_row) as usize,
            header
                .iter()
                .zip(values.into_iter().chain(std::iter::repeat(String::new())))
                .filter(|(h, _)| !h.is_empty())
                .map(|(h, v)| (h.clone(), v)),
        );
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}
