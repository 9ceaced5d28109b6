// ============================================================
// DATASET LOADER USE CASE
// ============================================================
// Load the CSV exports into typed datasets, failing softly

use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{error, info};

use crate::domain::budget::{
    DashboardConfig, ExecutedExpense, ExecutedRevenue, PlannedRevenue, StructureEntry,
};
use crate::domain::csv::CsvTable;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::{record_mapper, CsvParser};
use crate::infrastructure::storage;

/// Message shown in place of a dashboard whose data failed to load
pub const LOAD_ERROR_MESSAGE: &str = "Erro ao carregar os dados. Verifique os arquivos CSV.";

/// Planned revenue (LOA) and the revenue classification tree
#[derive(Debug, Clone, Serialize)]
pub struct LoaData {
    pub planned: Vec<PlannedRevenue>,
    pub structure: Vec<StructureEntry>,
    pub source_modified: String,
}

/// Executed revenue and expense, plus the LOA they are measured against
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionData {
    pub revenues: Vec<ExecutedRevenue>,
    pub expenses: Vec<ExecutedExpense>,
    pub planned: Vec<PlannedRevenue>,
    pub source_modified: String,
}

pub struct DatasetLoader {
    config: DashboardConfig,
    parser: CsvParser,
}

impl DatasetLoader {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            config: config.clone(),
            parser: CsvParser::new().with_delimiter(config.delimiter_byte()),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Read one export, logging the failure before it is returned
    pub fn load_table(&self, path: &Path) -> Result<CsvTable> {
        self.parser.parse_file(path).map_err(|err| {
            error!(error = %err, path = %path.display(), "Failed to load CSV export");
            err
        })
    }

    pub fn load_loa(&self) -> Result<LoaData> {
        let planned_table = self.load_required(&self.config.planned_revenue_path())?;
        let structure_table = self.load_required(&self.config.revenue_structure_path())?;

        let data = LoaData {
            planned: record_mapper::planned_revenues(&planned_table),
            structure: record_mapper::structure_entries(&structure_table),
            source_modified: self.source_modified(&[
                self.config.planned_revenue_path(),
                self.config.revenue_structure_path(),
            ]),
        };

        info!(
            planned = data.planned.len(),
            structure = data.structure.len(),
            "LOA datasets loaded"
        );
        Ok(data)
    }

    pub fn load_execution(&self) -> Result<ExecutionData> {
        let revenue_table = self.load_required(&self.config.executed_revenue_path())?;
        let expense_table = self.load_required(&self.config.executed_expense_path())?;
        let planned_table = self.load_required(&self.config.planned_revenue_path())?;

        let data = ExecutionData {
            revenues: record_mapper::executed_revenues(&revenue_table),
            expenses: record_mapper::executed_expenses(&expense_table),
            planned: record_mapper::planned_revenues(&planned_table),
            source_modified: self.source_modified(&storage::source_paths(&self.config)),
        };

        info!(
            revenues = data.revenues.len(),
            expenses = data.expenses.len(),
            planned = data.planned.len(),
            "Execution datasets loaded"
        );
        Ok(data)
    }

    /// Load a table that must exist and hold at least one row
    fn load_required(&self, path: &Path) -> Result<CsvTable> {
        let table = self.load_table(path).map_err(|err| {
            AppError::DataUnavailable(format!("{} ({})", LOAD_ERROR_MESSAGE, err))
        })?;

        if table.is_empty() {
            error!(path = %path.display(), "CSV export has no rows");
            return Err(AppError::DataUnavailable(format!(
                "{} ({} está vazio)",
                LOAD_ERROR_MESSAGE,
                path.display()
            )));
        }

        Ok(table)
    }

    fn source_modified(&self, paths: &[std::path::PathBuf]) -> String {
        let latest: Option<DateTime<Local>> = storage::latest_modification(paths);
        storage::format_modification(latest)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_loa_and_execution() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_all(dir.path());
        let loader = DatasetLoader::new(&config);

        let loa = loader.load_loa().unwrap();
        assert_eq!(loa.planned.len(), 9);
        assert_eq!(loa.structure.len(), 4);
        assert_ne!(loa.source_modified, storage::UNAVAILABLE);

        let execution = loader.load_execution().unwrap();
        assert_eq!(execution.revenues.len(), 6);
        assert_eq!(execution.expenses.len(), 4);
        assert_eq!(execution.planned.len(), 9);
    }

    #[test]
    fn test_missing_file_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();

        let err = DatasetLoader::new(&config).load_loa().unwrap_err();
        match err {
            AppError::DataUnavailable(msg) => assert!(msg.starts_with(LOAD_ERROR_MESSAGE)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_header_only_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_all(dir.path());
        std::fs::write(config.executed_expense_path(), "Empenho;Data\n").unwrap();

        let loader = DatasetLoader::new(&config);
        assert!(loader.load_loa().is_ok());
        assert!(matches!(
            loader.load_execution(),
            Err(AppError::DataUnavailable(_))
        ));
    }
}
