use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::config::Config;
use crate::error::{AppError, Resource};

use super::loader;
use super::model::{GeoSummary, HousingTable};
use super::predictor::Predictor;

// ---------------------------------------------------------------------------
// ResourceStore – static files, read once, shared read-only
// ---------------------------------------------------------------------------

/// Owns the three static resources for the lifetime of the application.
///
/// Each accessor reads its file on first use and hands out the same `Arc`
/// afterwards. A failed read is not memoized.
pub struct ResourceStore {
    config: Config,
    clean: OnceLock<Arc<HousingTable>>,
    geo: OnceLock<Arc<GeoSummary>>,
    model: OnceLock<Arc<dyn Predictor>>,
}

impl ResourceStore {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clean: OnceLock::new(),
            geo: OnceLock::new(),
            model: OnceLock::new(),
        }
    }

    /// Create the store and load everything up front.
    pub fn open(config: Config) -> Result<Self, AppError> {
        let store = Self::new(config);
        store.clean_table()?;
        store.geo_summary()?;
        store.model()?;
        Ok(store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clean_table(&self) -> Result<Arc<HousingTable>, AppError> {
        cached(&self.clean, Resource::CleanTable, &self.config.clean_data, |p| {
            let table = loader::load_clean_table(p)?;
            log::info!("Loaded {} housing records from {}", table.len(), p.display());
            Ok(Arc::new(table))
        })
    }

    pub fn geo_summary(&self) -> Result<Arc<GeoSummary>, AppError> {
        cached(&self.geo, Resource::GeoSummary, &self.config.geo_data, |p| {
            let summary = loader::load_geo_summary(p)?;
            log::info!("Loaded {} counties from {}", summary.len(), p.display());
            Ok(Arc::new(summary))
        })
    }

    pub fn model(&self) -> Result<Arc<dyn Predictor>, AppError> {
        cached(&self.model, Resource::Model, &self.config.model, |p| {
            let model = loader::load_model(p)?;
            log::info!(
                "Loaded model with {} features from {}",
                model.columns().len(),
                p.display()
            );
            Ok(model)
        })
    }
}

fn cached<T: Clone>(
    cell: &OnceLock<T>,
    resource: Resource,
    path: &Path,
    load: impl FnOnce(&Path) -> anyhow::Result<T>,
) -> Result<T, AppError> {
    if let Some(v) = cell.get() {
        return Ok(v.clone());
    }
    let value = load(path).map_err(|source| {
        log::error!("Failed to load {resource} from {}: {source:#}", path.display());
        AppError::DataUnavailable {
            resource,
            path: PathBuf::from(path),
            source,
        }
    })?;
    // another caller may have won the race; keep whichever landed first
    Ok(cell.get_or_init(|| value).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::write_geo_summary;
    use crate::data::predictor::tests::sample_model_json;

    fn write_fixture(dir: &Path) -> Config {
        std::fs::write(
            dir.join("clean.csv"),
            "longitude,latitude,housing_median_age,total_rooms,total_bedrooms,population,households,median_income,ocean_proximity\n\
             -122.23,37.88,41,880,129,322,126,8.3252,NEAR BAY\n",
        )
        .unwrap();
        write_geo_summary(&dir.join("geo.parquet"), &["Alameda", "Kern"]);
        std::fs::write(dir.join("model.json"), sample_model_json()).unwrap();
        Config {
            clean_data: dir.join("clean.csv"),
            geo_data: dir.join("geo.parquet"),
            model: dir.join("model.json"),
            ..Config::default()
        }
    }

    #[test]
    fn repeated_calls_share_one_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::open(write_fixture(dir.path())).unwrap();

        assert!(Arc::ptr_eq(&store.geo_summary().unwrap(), &store.geo_summary().unwrap()));
        assert!(Arc::ptr_eq(&store.clean_table().unwrap(), &store.clean_table().unwrap()));
        assert!(Arc::ptr_eq(&store.model().unwrap(), &store.model().unwrap()));

        // files are not re-read once cached
        std::fs::remove_file(dir.path().join("geo.parquet")).unwrap();
        assert_eq!(store.geo_summary().unwrap().len(), 2);
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_fixture(dir.path());
        config.model = dir.path().join("absent.json");

        match ResourceStore::open(config) {
            Err(AppError::DataUnavailable { resource, path, .. }) => {
                assert_eq!(resource, Resource::Model);
                assert!(path.ends_with("absent.json"));
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected a load failure"),
        }
    }
}
