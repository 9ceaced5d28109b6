pub mod config;
pub mod storage;

// CSV ingestion module
pub mod csv;
