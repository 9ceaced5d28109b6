// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing, encoding fallback, and record mapping

mod csv_parser;
pub mod record_mapper;

pub use csv_parser::CsvParser;
