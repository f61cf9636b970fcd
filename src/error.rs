use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::ModelInputRow;

// ---------------------------------------------------------------------------
// Error taxonomy surfaced to the UI
// ---------------------------------------------------------------------------

/// Which static resource failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    CleanTable,
    GeoSummary,
    Model,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::CleanTable => write!(f, "clean housing table"),
            Resource::GeoSummary => write!(f, "county geo summary"),
            Resource::Model => write!(f, "model artifact"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or corrupt static file. Fatal: nothing else renders.
    #[error("{resource} unavailable at {}: {source:#}", path.display())]
    DataUnavailable {
        resource: Resource,
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("county '{0}' not found in geo summary")]
    CountyNotFound(String),

    /// Map rendering only; never blocks a prediction.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Inputs that cannot form a model row (zero households, negative income...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("prediction failed: {source:#}")]
    PredictionFailed {
        row: Box<ModelInputRow>,
        source: anyhow::Error,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("county '{name}': geometry contains non-finite coordinates")]
    NonFinite { name: String },

    #[error("county '{name}': invalid geometry could not be repaired")]
    Unrepairable { name: String },

    #[error("county '{name}': unsupported geometry type {kind}")]
    Unsupported { name: String, kind: &'static str },
}
