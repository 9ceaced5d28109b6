use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::domain::budget::DashboardConfig;

pub const UNAVAILABLE: &str = "Não disponível";

/// Every source export the dashboards read, in load order
pub fn source_paths(config: &DashboardConfig) -> Vec<PathBuf> {
    vec![
        config.planned_revenue_path(),
        config.revenue_structure_path(),
        config.executed_revenue_path(),
        config.executed_expense_path(),
    ]
}

pub fn missing_files(config: &DashboardConfig) -> Vec<PathBuf> {
    source_paths(config)
        .into_iter()
        .filter(|path| !path.is_file())
        .collect()
}

/// Most recent modification time across `paths`; unreadable files are
/// skipped
pub fn latest_modification(paths: &[PathBuf]) -> Option<DateTime<Local>> {
    paths
        .iter()
        .filter_map(|path| modified_at(path))
        .max()
}

fn modified_at(path: &Path) -> Option<DateTime<Local>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified))
}

pub fn format_modification(modified: Option<DateTime<Local>>) -> String {
    modified
        .map(|m| m.format("%d/%m/%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_modification_skips_missing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let paths = vec![PathBuf::from("/nonexistent.csv"), file.path().to_path_buf()];

        assert!(latest_modification(&paths).is_some());
        assert!(latest_modification(&[PathBuf::from("/nonexistent.csv")]).is_none());
    }

    #[test]
    fn test_format_modification_unavailable() {
        assert_eq!(format_modification(None), UNAVAILABLE);
    }

    #[test]
    fn test_missing_files_reports_all_when_dir_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();

        assert_eq!(missing_files(&config).len(), 4);
    }
}
