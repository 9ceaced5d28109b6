// ============================================================
// CSV ROW TYPES
// ============================================================
// Data structures representing parsed CSV content

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single field in a CSV row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvField {
    /// Header name (trimmed)
    pub name: String,

    /// Field value
    pub value: String,

    /// Whether the value is empty
    pub is_empty: bool,
}

impl CsvField {
    pub fn new(name: String, value: String) -> Self {
        let is_empty = value.trim().is_empty();
        Self {
            name: name.trim().to_string(),
            value,
            is_empty,
        }
    }
}

/// A single row in a CSV file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvRow {
    /// Row index (0-based, header excluded)
    pub index: usize,

    pub fields: Vec<CsvField>,

    /// Header -> value lookup
    pub field_map: HashMap<String, String>,
}

impl CsvRow {
    pub fn new(index: usize, fields: Vec<CsvField>) -> Self {
        let field_map = fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();

        Self { index, fields, field_map }
    }

    /// Value under `header`, or "" when the column is absent
    pub fn get(&self, header: &str) -> &str {
        self.field_map.get(header).map(String::as_str).unwrap_or("")
    }

    /// Value under `header`, None when the column is absent
    pub fn get_opt(&self, header: &str) -> Option<&str> {
        self.field_map.get(header).map(String::as_str)
    }
}

/// A decoded CSV file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
    /// Name of the text encoding the file was decoded with
    pub encoding: String,
}

impl CsvTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All raw values of one column, in row order
    pub fn column(&self, header: &str) -> Vec<&str> {
        self.rows.iter().filter_map(|r| r.get_opt(header)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_by_trimmed_header() {
        let row = CsvRow::new(
            0,
            vec![
                CsvField::new(" CODRE ".to_string(), "1112.50".to_string()),
                CsvField::new("NOME".to_string(), "".to_string()),
            ],
        );

        assert_eq!(row.get("CODRE"), "1112.50");
        assert_eq!(row.get("NOME"), "");
        assert!(row.fields[1].is_empty);
        assert_eq!(row.get("MISSING"), "");
        assert!(row.get_opt("MISSING").is_none());
    }
}
