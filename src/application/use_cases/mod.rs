pub mod data_diagnostics;
pub mod dataset_loader;
pub mod detail_search;
pub mod execution_summary;
pub mod expense_analysis;
pub mod fiscal_metrics;
pub mod indicator;
pub mod insights;
pub mod loa_analysis;
pub mod loa_reconciliation;
pub mod revenue_execution;
