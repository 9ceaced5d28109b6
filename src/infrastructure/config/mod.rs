use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::info;

use crate::domain::budget::DashboardConfig;
use crate::domain::error::{AppError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "loa-dashboard.toml";
pub const ENV_PREFIX: &str = "LOA_";

/// Layered configuration: defaults -> TOML file -> `LOA_*` environment
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn figment(&self) -> Figment {
        Figment::from(Serialized::defaults(DashboardConfig::default()))
            .merge(Toml::file(&self.path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(&self) -> Result<DashboardConfig> {
        let config: DashboardConfig = self.figment().extract()?;
        config.validate().map_err(AppError::ConfigError)?;

        info!(
            config_file = %self.path.display(),
            data_dir = %config.data_dir.display(),
            municipality = %config.municipality,
            "Configuration loaded"
        );
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let service = ConfigService::with_path("/nonexistent/loa-dashboard.toml");
        let config = service.load().unwrap();
        assert_eq!(config.files, DashboardConfig::default().files);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "municipality = \"Franca\"\npopulation = 355000\n\n[server]\nport = 8088\n"
        )
        .unwrap();

        let config = ConfigService::with_path(file.path()).load().unwrap();
        assert_eq!(config.municipality, "Franca");
        assert_eq!(config.population, 355000);
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "population = 0").unwrap();

        let result = ConfigService::with_path(file.path()).load();
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
