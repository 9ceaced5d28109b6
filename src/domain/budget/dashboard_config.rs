// ============================================================
// DASHBOARD CONFIGURATION
// ============================================================
// Source file names, municipality facts and server settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Names of the four CSV exports, relative to `data_dir`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFiles {
    /// Planned revenue (LOA): CODRE / NOME / TOTOR
    pub planned_revenue: String,

    /// Revenue structure: CODRE / NOMRE / NIVEL
    pub revenue_structure: String,

    /// Executed revenue from the transparency portal
    pub executed_revenue: String,

    /// Executed expense (commitments) from the transparency portal
    pub executed_expense: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            planned_revenue: "download-123842.557.csv".to_string(),
            revenue_structure: "download-123701.452.csv".to_string(),
            executed_revenue: "Portal Transparencia Receitas Acumuladas - Exercício 2025 (1).csv"
                .to_string(),
            executed_expense: "Portal Transparencia Despesas Gerais - Exercício 2025.csv"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Directory the CSV exports live in
    pub data_dir: PathBuf,

    pub files: DataFiles,

    /// Field delimiter of every export (default: ';')
    pub delimiter: char,

    pub municipality: String,

    pub fiscal_year: i32,

    /// Estimated population used for per-capita figures (default: 5000)
    pub population: u32,

    pub server: ServerConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            files: DataFiles::default(),
            delimiter: ';',
            municipality: "Rifaina".to_string(),
            fiscal_year: 2025,
            population: 5000,
            server: ServerConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn planned_revenue_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.planned_revenue)
    }

    pub fn revenue_structure_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.revenue_structure)
    }

    pub fn executed_revenue_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.executed_revenue)
    }

    pub fn executed_expense_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.executed_expense)
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.population == 0 {
            return Err("population must be > 0".to_string());
        }
        if !self.delimiter.is_ascii() {
            return Err(format!("delimiter must be ASCII, got {:?}", self.delimiter));
        }
        let files = [
            &self.files.planned_revenue,
            &self.files.revenue_structure,
            &self.files.executed_revenue,
            &self.files.executed_expense,
        ];
        if files.iter().any(|f| f.trim().is_empty()) {
            return Err("data file names must not be empty".to_string());
        }
        if self.server.port == 0 {
            return Err("server.port must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.delimiter_byte(), b';');
        assert_eq!(config.population, 5000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DashboardConfig::default();
        config.population = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.delimiter = 'ç';
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.files.executed_expense = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paths_are_joined_to_data_dir() {
        let mut config = DashboardConfig::default();
        config.data_dir = PathBuf::from("/data");
        assert_eq!(
            config.planned_revenue_path(),
            PathBuf::from("/data/download-123842.557.csv")
        );
    }
}
