// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Generic decoded-CSV types shared by every budget dataset
// No I/O, no async

mod csv_row;

pub use csv_row::{CsvField, CsvRow, CsvTable};
