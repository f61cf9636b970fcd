use std::sync::Arc;

use crate::config::Config;
use crate::data::features::{
    assemble_and_predict, CountyInputs, IncomeScale, ManualInputs, Prediction, UserInputs,
};
use crate::data::geometry::{normalize_layer, MapLayer};
use crate::data::model::{GeoSummary, ModelInputRow, NUMERIC_COLUMNS};
use crate::data::store::ResourceStore;
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Form variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Every field typed in by hand.
    Manual,
    /// County lookup plus age and income.
    County,
    /// County form with the polygon map.
    CountyMap,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Manual, Variant::County, Variant::CountyMap];

    pub fn label(self) -> &'static str {
        match self {
            Variant::Manual => "Manual entry",
            Variant::County => "By county",
            Variant::CountyMap => "By county + map",
        }
    }
}

/// Inputs of the county forms.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyForm {
    pub county: String,
    pub housing_median_age: f64,
    /// Slider value, in the units given by the county income scale.
    pub median_income: f64,
}

impl CountyForm {
    pub const AGE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=50.0;
    pub const INCOME_RANGE: std::ops::RangeInclusive<f64> = 5.0..=100.0;
    pub const INCOME_STEP: f64 = 5.0;
}

impl Default for CountyForm {
    fn default() -> Self {
        Self {
            county: String::new(),
            housing_median_age: 10.0,
            median_income: 45.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded resources (None when loading failed).
    pub store: Option<Arc<ResourceStore>>,

    /// Load failure; nothing but this message renders while set.
    pub fatal: Option<String>,

    pub variant: Variant,

    /// Sorted county names for the selector.
    pub counties: Vec<String>,

    /// Known `ocean_proximity` labels for the manual form.
    pub ocean_categories: Vec<String>,

    pub county_form: CountyForm,
    pub manual_form: ManualInputs,

    /// Result of the last successful submission.
    pub prediction: Option<Prediction>,

    /// Error of the last submission, with the row it was computed from if any.
    pub prediction_error: Option<(String, Option<ModelInputRow>)>,

    /// Built the first time the map variant is shown.
    pub map_layer: Option<Result<MapLayer, AppError>>,

    /// County under the pointer on the map.
    pub hovered_county: Option<String>,

    /// Move the map view to the selected county on the next frame.
    pub recenter_map: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: None,
            fatal: None,
            variant: Variant::CountyMap,
            counties: Vec::new(),
            ocean_categories: Vec::new(),
            county_form: CountyForm::default(),
            manual_form: default_manual_inputs(),
            prediction: None,
            prediction_error: None,
            map_layer: None,
            hovered_county: None,
            recenter_map: true,
        }
    }
}

fn default_manual_inputs() -> ManualInputs {
    ManualInputs {
        longitude: -119.0,
        latitude: 35.0,
        housing_median_age: 10.0,
        total_rooms: 2000.0,
        total_bedrooms: 400.0,
        population: 1100.0,
        households: 400.0,
        median_income: 3.5,
        ocean_proximity: String::new(),
    }
}

impl AppState {
    /// State for a freshly opened (or failed) resource store.
    pub fn from_store(store: Result<ResourceStore, AppError>) -> Self {
        let mut state = Self::default();
        match store {
            Ok(store) => state.set_store(store),
            Err(e) => state.fatal = Some(e.to_string()),
        }
        state
    }

    /// Ingest loaded resources and reset the forms to their defaults.
    pub fn set_store(&mut self, store: ResourceStore) {
        let (geo, clean) = match (store.geo_summary(), store.clean_table()) {
            (Ok(geo), Ok(clean)) => (geo, clean),
            (Err(e), _) | (_, Err(e)) => {
                self.fatal = Some(e.to_string());
                self.store = None;
                return;
            }
        };

        self.counties = geo.names().map(str::to_string).collect();
        self.ocean_categories = clean.ocean_categories();

        self.county_form = CountyForm {
            county: self.counties.first().cloned().unwrap_or_default(),
            ..CountyForm::default()
        };

        let mut manual = default_manual_inputs();
        for column in NUMERIC_COLUMNS {
            if let Some(median) = clean.median(column) {
                set_manual_field(&mut manual, column, median);
            }
        }
        manual.housing_median_age = 10.0;
        manual.ocean_proximity = self.ocean_categories.first().cloned().unwrap_or_default();
        self.manual_form = manual;

        self.store = Some(Arc::new(store));
        self.fatal = None;
        self.prediction = None;
        self.prediction_error = None;
        self.map_layer = None;
        self.hovered_county = None;
        self.recenter_map = true;
    }

    /// Replace resources from another configuration.
    pub fn reload(&mut self, config: Config) {
        match ResourceStore::open(config) {
            Ok(store) => self.set_store(store),
            Err(e) => {
                self.store = None;
                self.fatal = Some(e.to_string());
            }
        }
    }

    pub fn set_variant(&mut self, variant: Variant) {
        if self.variant != variant {
            self.variant = variant;
            self.prediction = None;
            self.prediction_error = None;
            self.recenter_map = true;
        }
    }

    pub fn select_county(&mut self, name: &str) {
        if self.county_form.county != name {
            self.county_form.county = name.to_string();
            self.recenter_map = true;
        }
    }

    fn current_inputs(&self) -> (UserInputs, IncomeScale) {
        let config = self.store.as_ref().map(|s| s.config().clone()).unwrap_or_default();
        match self.variant {
            Variant::Manual => (
                UserInputs::Manual(self.manual_form.clone()),
                config.manual_scale(),
            ),
            Variant::County | Variant::CountyMap => (
                UserInputs::County(CountyInputs {
                    county: self.county_form.county.clone(),
                    housing_median_age: self.county_form.housing_median_age,
                    median_income: self.county_form.median_income,
                }),
                config.county_scale(),
            ),
        }
    }

    /// Run one prediction from the current form. Inputs are left untouched.
    pub fn submit(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let (inputs, scale) = self.current_inputs();
        let result = store.geo_summary().and_then(|geo| {
            let model = store.model()?;
            assemble_and_predict(
                &inputs,
                &geo,
                model.as_ref(),
                scale,
                &store.config().currency_symbol,
            )
        });

        match result {
            Ok(prediction) => {
                log::info!("Predicted price {}", prediction.amount);
                self.prediction = Some(prediction);
                self.prediction_error = None;
            }
            Err(e) => {
                log::error!("Prediction failed: {e}");
                let row = match &e {
                    AppError::PredictionFailed { row, .. } => Some(row.as_ref().clone()),
                    _ => None,
                };
                self.prediction = None;
                self.prediction_error = Some((e.to_string(), row));
            }
        }
    }

    /// Build the map layer once, from a borrow of the shared summary.
    pub fn ensure_map_layer(&mut self) {
        if self.map_layer.is_some() {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };
        let layer = store.geo_summary().and_then(|geo| map_layer_for(&geo));
        if let Err(e) = &layer {
            log::error!("Map layer unavailable: {e}");
        }
        self.map_layer = Some(layer);
    }

    /// Median coordinates of the selected county, for centring the map.
    pub fn selected_center(&self) -> Option<(f64, f64)> {
        let store = self.store.as_ref()?;
        let geo = store.geo_summary().ok()?;
        let county = geo.lookup(&self.county_form.county)?;
        Some((county.attributes.longitude, county.attributes.latitude))
    }
}

/// Geometry failures only disable the map; the forms keep working.
fn map_layer_for(geo: &GeoSummary) -> Result<MapLayer, AppError> {
    Ok(normalize_layer(geo)?)
}

fn set_manual_field(inputs: &mut ManualInputs, column: &str, value: f64) {
    let slot = match column {
        "longitude" => &mut inputs.longitude,
        "latitude" => &mut inputs.latitude,
        "housing_median_age" => &mut inputs.housing_median_age,
        "total_rooms" => &mut inputs.total_rooms,
        "total_bedrooms" => &mut inputs.total_bedrooms,
        "population" => &mut inputs.population,
        "households" => &mut inputs.households,
        "median_income" => &mut inputs.median_income,
        _ => return,
    };
    *slot = value;
}
