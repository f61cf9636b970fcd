use crate::error::AppError;

use super::currency::CurrencyAmount;
use super::model::{GeoSummary, ModelInputRow};
use super::predictor::Predictor;

/// Upper boundaries of the income categories, in tens of thousands of US$.
pub const INCOME_BINS: [f64; 6] = [0.0, 1.5, 3.0, 4.5, 6.0, f64::INFINITY];

/// Ordinal income category (`digitize` semantics, right-open bins).
///
/// The category is the number of boundaries `<= income`, so 1.5 lands in
/// category 2 and anything from 6 upward in category 5. Negative or
/// non-finite incomes have no category.
pub fn income_category(income: f64) -> Option<u8> {
    if !income.is_finite() || income < 0.0 {
        return None;
    }
    Some(INCOME_BINS.iter().filter(|&&b| b <= income).count() as u8)
}

/// How the income control's units map onto the model's tens of thousands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeScale {
    pub divisor: f64,
}

impl IncomeScale {
    pub fn apply(&self, raw: f64) -> f64 {
        raw / self.divisor
    }
}

// ---------------------------------------------------------------------------
// User inputs
// ---------------------------------------------------------------------------

/// Every raw field typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualInputs {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    pub total_bedrooms: f64,
    pub population: f64,
    pub households: f64,
    pub median_income: f64,
    pub ocean_proximity: String,
}

/// County choice plus the few fields the user may adjust.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyInputs {
    pub county: String,
    pub housing_median_age: f64,
    pub median_income: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserInputs {
    Manual(ManualInputs),
    County(CountyInputs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub row: ModelInputRow,
    pub amount: CurrencyAmount,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Build the model row. Income is converted with `scale` before binning.
pub fn assemble(
    inputs: &UserInputs,
    geo: &GeoSummary,
    scale: IncomeScale,
) -> Result<ModelInputRow, AppError> {
    match inputs {
        UserInputs::Manual(m) => {
            let median_income = scale.apply(m.median_income);
            let ratio = |num: f64, den: f64, what: &str| {
                if den == 0.0 {
                    Err(AppError::InvalidInput(format!("{what} must not be zero")))
                } else {
                    Ok(num / den)
                }
            };
            Ok(ModelInputRow {
                longitude: m.longitude,
                latitude: m.latitude,
                housing_median_age: m.housing_median_age,
                total_rooms: m.total_rooms,
                total_bedrooms: m.total_bedrooms,
                population: m.population,
                households: m.households,
                median_income,
                ocean_proximity: m.ocean_proximity.clone(),
                median_income_cat: category_for(median_income)?,
                rooms_per_household: ratio(m.total_rooms, m.households, "households")?,
                population_per_household: ratio(m.population, m.households, "households")?,
                bedrooms_per_room: ratio(m.total_bedrooms, m.total_rooms, "total_rooms")?,
            })
        }
        UserInputs::County(c) => {
            let county = geo
                .lookup(&c.county)
                .ok_or_else(|| AppError::CountyNotFound(c.county.clone()))?;
            let a = &county.attributes;
            let median_income = scale.apply(c.median_income);
            Ok(ModelInputRow {
                longitude: a.longitude,
                latitude: a.latitude,
                housing_median_age: c.housing_median_age,
                total_rooms: a.total_rooms,
                total_bedrooms: a.total_bedrooms,
                population: a.population,
                households: a.households,
                median_income,
                ocean_proximity: a.ocean_proximity.clone(),
                median_income_cat: category_for(median_income)?,
                rooms_per_household: a.rooms_per_household,
                population_per_household: a.population_per_household,
                bedrooms_per_room: a.bedrooms_per_room,
            })
        }
    }
}

fn category_for(median_income: f64) -> Result<u8, AppError> {
    income_category(median_income).ok_or_else(|| {
        AppError::InvalidInput(format!("median income {median_income} has no income category"))
    })
}

/// Assemble the row and run exactly one inference.
pub fn assemble_and_predict(
    inputs: &UserInputs,
    geo: &GeoSummary,
    predictor: &dyn Predictor,
    scale: IncomeScale,
    currency_symbol: &str,
) -> Result<Prediction, AppError> {
    let row = assemble(inputs, geo, scale)?;
    let result = predictor.predict(&row).and_then(|value| {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(anyhow::anyhow!("model returned a non-finite price ({value})"))
        }
    });
    match result {
        Ok(value) => {
            log::debug!("Predicted {value} for {row:?}");
            Ok(Prediction {
                amount: CurrencyAmount::new(value, currency_symbol),
                row,
            })
        }
        Err(source) => Err(AppError::PredictionFailed {
            row: Box::new(row),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::bail;
    use geo::Geometry;

    use super::*;
    use crate::data::model::{CountyAttributes, CountySummary};

    /// Records every row it is asked to score.
    struct RecordingPredictor {
        columns: Vec<String>,
        calls: Mutex<Vec<ModelInputRow>>,
        fail: bool,
        value: f64,
    }

    impl RecordingPredictor {
        fn new(fail: bool) -> Self {
            Self {
                columns: ModelInputRow::COLUMNS.iter().map(|c| c.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                fail,
                value: 123456.7,
            }
        }
    }

    impl Predictor for RecordingPredictor {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        fn predict(&self, row: &ModelInputRow) -> anyhow::Result<f64> {
            self.calls.lock().unwrap().push(row.clone());
            if self.fail {
                bail!("shape mismatch");
            }
            Ok(self.value)
        }
    }

    fn sacramento() -> GeoSummary {
        GeoSummary::from_counties(vec![CountySummary {
            name: "Sacramento".into(),
            attributes: CountyAttributes {
                longitude: -121.4,
                latitude: 38.6,
                housing_median_age: 27.0,
                total_rooms: 2100.0,
                total_bedrooms: 420.0,
                population: 1150.0,
                households: 400.0,
                median_income: 3.1,
                ocean_proximity: "INLAND".into(),
                rooms_per_household: 5.25,
                population_per_household: 2.875,
                bedrooms_per_room: 0.2,
            },
            geometry: Geometry::Point(geo::Point::new(-121.4, 38.6)),
        }])
        .unwrap()
    }

    const THOUSANDS: IncomeScale = IncomeScale { divisor: 10.0 };

    #[test]
    fn income_categories_match_bins() {
        let cases = [(1.0, 1), (1.5, 2), (3.0, 3), (4.5, 4), (6.0, 5), (10.0, 5), (0.0, 1)];
        let mut last = 0;
        for (income, expected) in cases.iter().take(6) {
            let cat = income_category(*income).unwrap();
            assert_eq!(cat, *expected, "income {income}");
            assert!(cat >= last);
            last = cat;
        }
        assert_eq!(income_category(cases[6].0), Some(cases[6].1));
        assert_eq!(income_category(-0.5), None);
        assert_eq!(income_category(f64::NAN), None);
    }

    #[test]
    fn county_submission_builds_row_and_predicts_once() {
        let geo = sacramento();
        let predictor = RecordingPredictor::new(false);
        let inputs = UserInputs::County(CountyInputs {
            county: "Sacramento".into(),
            housing_median_age: 10.0,
            median_income: 45.0,
        });

        let prediction = assemble_and_predict(&inputs, &geo, &predictor, THOUSANDS, "US$").unwrap();

        let calls = predictor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let row = &calls[0];
        assert_eq!(row, &prediction.row);
        assert_eq!(row.median_income, 4.5);
        assert_eq!(row.median_income_cat, 4);
        assert_eq!(row.housing_median_age, 10.0);
        assert_eq!(row.total_rooms, 2100.0);
        assert_eq!(row.ocean_proximity, "INLAND");
        assert_eq!(prediction.amount.to_string(), "US$ 123.456,70");
    }

    #[test]
    fn unknown_county_is_reported() {
        let predictor = RecordingPredictor::new(false);
        let inputs = UserInputs::County(CountyInputs {
            county: "Atlantis".into(),
            housing_median_age: 10.0,
            median_income: 45.0,
        });
        let err = assemble_and_predict(&inputs, &sacramento(), &predictor, THOUSANDS, "US$")
            .unwrap_err();
        assert!(matches!(err, AppError::CountyNotFound(ref n) if n == "Atlantis"));
        assert!(predictor.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn predictor_failure_carries_the_row() {
        let predictor = RecordingPredictor::new(true);
        let inputs = UserInputs::County(CountyInputs {
            county: "Sacramento".into(),
            housing_median_age: 12.0,
            median_income: 20.0,
        });
        match assemble_and_predict(&inputs, &sacramento(), &predictor, THOUSANDS, "US$") {
            Err(AppError::PredictionFailed { row, source }) => {
                assert_eq!(row.housing_median_age, 12.0);
                assert_eq!(row.median_income_cat, 2);
                assert!(source.to_string().contains("shape mismatch"));
            }
            other => panic!("expected PredictionFailed, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_price_is_a_prediction_failure() {
        let mut predictor = RecordingPredictor::new(false);
        predictor.value = f64::NAN;
        let inputs = UserInputs::County(CountyInputs {
            county: "Sacramento".into(),
            housing_median_age: 10.0,
            median_income: 45.0,
        });
        match assemble_and_predict(&inputs, &sacramento(), &predictor, THOUSANDS, "US$") {
            Err(AppError::PredictionFailed { row, source }) => {
                assert_eq!(row.median_income_cat, 4);
                assert!(source.to_string().contains("non-finite"));
            }
            other => panic!("expected PredictionFailed, got {other:?}"),
        }
    }

    #[test]
    fn manual_inputs_derive_ratios() {
        let inputs = UserInputs::Manual(ManualInputs {
            longitude: -122.2,
            latitude: 37.8,
            housing_median_age: 41.0,
            total_rooms: 880.0,
            total_bedrooms: 132.0,
            population: 330.0,
            households: 110.0,
            median_income: 8.3,
            ocean_proximity: "NEAR BAY".into(),
        });
        let row = assemble(&inputs, &GeoSummary::default(), IncomeScale { divisor: 1.0 }).unwrap();
        assert_eq!(row.rooms_per_household, 8.0);
        assert_eq!(row.population_per_household, 3.0);
        assert_eq!(row.bedrooms_per_room, 0.15);
        assert_eq!(row.median_income_cat, 5);

        let UserInputs::Manual(mut zero) = inputs else { unreachable!() };
        zero.households = 0.0;
        let err = assemble(&UserInputs::Manual(zero), &GeoSummary::default(), IncomeScale { divisor: 1.0 })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
