// ============================================================
// CSV PARSER
// ============================================================
// Parse budget exports with UTF-8 -> Latin-1 encoding fallback

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::WINDOWS_1252;
use tracing::{debug, warn};

use crate::domain::csv::{CsvField, CsvRow, CsvTable};
use crate::domain::error::AppError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// CSV parser with encoding fallback
pub struct CsvParser {
    /// Delimiter character (default: semicolon)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b';',
            trim: true,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read and parse a CSV file
    pub fn parse_file(&self, path: &Path) -> Result<CsvTable, AppError> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let (content, encoding) = decode_with_fallback(&bytes);
        if encoding != "UTF-8" {
            warn!(
                path = %path.display(),
                encoding,
                "File is not valid UTF-8, decoded with fallback encoding"
            );
        }

        let mut table = self.parse_content(&content)?;
        table.encoding = encoding.to_string();
        debug!(path = %path.display(), rows = table.len(), "Parsed CSV file");
        Ok(table)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<CsvTable, AppError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            rows.push(Self::parse_row(rows.len(), &headers, &record));
        }

        Ok(CsvTable {
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
            rows,
            encoding: "UTF-8".to_string(),
        })
    }

    fn parse_row(index: usize, headers: &StringRecord, record: &StringRecord) -> CsvRow {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = record.get(idx).unwrap_or("").to_string();
                CsvField::new(header.to_string(), value)
            })
            .collect();

        CsvRow::new(index, fields)
    }
}

/// Decode as UTF-8 (BOM stripped); fall back to Latin-1 when the bytes are
/// not valid UTF-8. Returns the text and the encoding name used.
fn decode_with_fallback(bytes: &[u8]) -> (String, &'static str) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(content) = std::str::from_utf8(body) {
        return (content.to_string(), "UTF-8");
    }

    // windows-1252 is the WHATWG mapping for the latin-1 label
    let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(body);
    (decoded.into_owned(), "Latin-1")
}
