pub mod error;
pub mod money;

// Budget datasets and classification
pub mod budget;

// Decoded CSV content
pub mod csv;
