use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::features::IncomeScale;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "HOUSING_APP_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "housing.json";

/// File locations and unit conventions.
///
/// ```json
/// {
///   "clean_data": "data/housing_clean.parquet",
///   "geo_data": "data/geo_median.parquet",
///   "model": "models/model.json",
///   "county_income_divisor": 10.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clean_data: PathBuf,
    pub geo_data: PathBuf,
    pub model: PathBuf,
    /// County forms use a slider in thousands of US$.
    pub county_income_divisor: f64,
    /// The manual form takes income already in tens of thousands.
    pub manual_income_divisor: f64,
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clean_data: PathBuf::from("data/housing_clean.parquet"),
            geo_data: PathBuf::from("data/geo_median.parquet"),
            model: PathBuf::from("models/model.json"),
            county_income_divisor: 10.0,
            manual_income_divisor: 1.0,
            currency_symbol: "US$".to_string(),
        }
    }
}

impl Config {
    /// Config from `$HOUSING_APP_CONFIG`, else `./housing.json` if present, else defaults.
    /// Per-path env overrides are applied last.
    pub fn discover() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var_os(key).map(PathBuf::from));
        Ok(config)
    }

    /// Parse a config file; relative paths resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if let Some(dir) = path.parent() {
            for p in [&mut config.clean_data, &mut config.geo_data, &mut config.model] {
                if p.is_relative() {
                    *p = dir.join(&*p);
                }
            }
        }
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<PathBuf>) {
        if let Some(p) = var("HOUSING_CLEAN_DATA") {
            self.clean_data = p;
        }
        if let Some(p) = var("HOUSING_GEO_DATA") {
            self.geo_data = p;
        }
        if let Some(p) = var("HOUSING_MODEL") {
            self.model = p;
        }
    }

    pub fn county_scale(&self) -> IncomeScale {
        IncomeScale {
            divisor: self.county_income_divisor,
        }
    }

    pub fn manual_scale(&self) -> IncomeScale {
        IncomeScale {
            divisor: self.manual_income_divisor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths_resolve_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("housing.json");
        std::fs::write(
            &path,
            r#"{ "clean_data": "clean.csv", "model": "/abs/model.json", "county_income_divisor": 1.0 }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.clean_data, dir.path().join("clean.csv"));
        assert_eq!(config.geo_data, dir.path().join("data/geo_median.parquet"));
        assert_eq!(config.model, PathBuf::from("/abs/model.json"));
        assert_eq!(config.county_scale().apply(45.0), 45.0);
        assert_eq!(config.manual_scale().apply(4.5), 4.5);
        assert_eq!(config.currency_symbol, "US$");
    }

    #[test]
    fn env_overrides_replace_paths() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| (key == "HOUSING_MODEL").then(|| PathBuf::from("m.json")));
        assert_eq!(config.model, PathBuf::from("m.json"));
        assert_eq!(config.clean_data, Config::default().clean_data);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
