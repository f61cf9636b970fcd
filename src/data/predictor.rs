use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use super::model::{FeatureValue, ModelInputRow};

// ---------------------------------------------------------------------------
// Predictor – the opaque regression model seam
// ---------------------------------------------------------------------------

/// A pre-trained regression model taking one [`ModelInputRow`].
pub trait Predictor: Send + Sync {
    /// Feature names the model was trained on, in order.
    fn columns(&self) -> &[String];

    fn predict(&self, row: &ModelInputRow) -> Result<f64>;
}

// ---------------------------------------------------------------------------
// LinearModel – JSON export of a scaled/one-hot linear pipeline
// ---------------------------------------------------------------------------

/// Standard-scaled numeric term: `weight * (x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct NumericTerm {
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "one")]
    pub scale: f64,
    pub weight: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTransform {
    #[default]
    Identity,
    /// Model was fit on `ln(1 + y)`.
    Log1p,
}

/// Expected JSON layout:
///
/// ```json
/// {
///   "features": ["longitude", "latitude", ...],
///   "intercept": 206855.8,
///   "numeric": { "longitude": { "mean": -119.57, "scale": 2.0, "weight": -8600.0 }, ... },
///   "categorical": { "ocean_proximity": { "INLAND": -65000.0, ... }, ... },
///   "target": "identity"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub features: Vec<String>,
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, NumericTerm>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub target: TargetTransform,
}

impl LinearModel {
    pub fn from_json(text: &str) -> Result<Self> {
        let model: LinearModel = serde_json::from_str(text).context("parsing model JSON")?;
        for feature in &model.features {
            let numeric = model.numeric.contains_key(feature);
            let categorical = model.categorical.contains_key(feature);
            if numeric == categorical {
                bail!("feature '{feature}' must be exactly one of numeric or categorical");
            }
        }
        if let Some((name, _)) = model.numeric.iter().find(|(_, t)| t.scale == 0.0) {
            bail!("feature '{name}' has a zero scale");
        }
        Ok(model)
    }
}

impl Predictor for LinearModel {
    fn columns(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, row: &ModelInputRow) -> Result<f64> {
        let features = row.features();
        if features.len() != self.features.len()
            || features
                .iter()
                .zip(&self.features)
                .any(|((got, _), want)| *got != want.as_str())
        {
            let got: Vec<&str> = features.iter().map(|(n, _)| *n).collect();
            bail!(
                "input columns {got:?} do not match the trained columns {:?}",
                self.features
            );
        }

        let mut y = self.intercept;
        for (name, value) in &features {
            y += match value {
                FeatureValue::Number(x) => {
                    let term = self
                        .numeric
                        .get(*name)
                        .ok_or_else(|| anyhow!("column '{name}' was trained as categorical"))?;
                    term.weight * (x - term.mean) / term.scale
                }
                FeatureValue::Category(c) => {
                    let levels = self
                        .categorical
                        .get(*name)
                        .ok_or_else(|| anyhow!("column '{name}' was trained as numeric"))?;
                    *levels
                        .get(c)
                        .ok_or_else(|| anyhow!("unknown category '{c}' for column '{name}'"))?
                }
            };
        }

        let y = match self.target {
            TargetTransform::Identity => y,
            TargetTransform::Log1p => y.exp_m1(),
        };
        if !y.is_finite() {
            bail!("model produced a non-finite prediction");
        }
        Ok(y)
    }
}
