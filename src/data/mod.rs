/// Data layer: static resources, geometry preparation and feature assembly.
///
/// Architecture:
/// ```text
///  clean .parquet   geo .parquet (WKB)   model .json
///        │                │                  │
///        ▼                ▼                  ▼
///   ┌──────────────────────────────────────────────┐
///   │ store / loader   read once → Arc<…>          │
///   └──────────────────────────────────────────────┘
///        │                │                  │
///        │          ┌─────┴──────┐           │
///        │          ▼            ▼           │
///        │     ┌──────────┐ ┌──────────┐     │
///        │     │ geometry │ │ features │◄────┘
///        │     └──────────┘ └──────────┘
///        │       MapLayer     ModelInputRow → predictor → currency
///        ▼
///   manual form defaults
/// ```

pub mod currency;
pub mod features;
pub mod geometry;
pub mod loader;
pub mod model;
pub mod predictor;
pub mod store;
pub mod wkb;
