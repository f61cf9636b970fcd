//! Writes a small, self-consistent sample data set:
//! `data/housing_clean.parquet`, `data/geo_median.parquet`, `models/model.json`
//! and a `housing.json` config pointing at them.
//!
//! Usage: `cargo run --bin generate_sample [OUTPUT_DIR]`

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BinaryArray, Float64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

/// Minimal deterministic PRNG (splitmix64)
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + unit * (hi - lo)
    }
}

struct County {
    name: &'static str,
    ocean_proximity: &'static str,
    /// One exterior ring per part, as (lon, lat).
    parts: Vec<Vec<(f64, f64)>>,
    income: f64,
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<(f64, f64)> {
    vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]
}

fn counties() -> Vec<County> {
    vec![
        County {
            name: "Alameda",
            ocean_proximity: "NEAR BAY",
            parts: vec![rect(-122.35, 37.45, -121.45, 37.90)],
            income: 5.2,
        },
        County {
            name: "Fresno",
            ocean_proximity: "INLAND",
            // clockwise on purpose
            parts: vec![vec![
                (-120.9, 36.2),
                (-120.9, 37.5),
                (-118.4, 37.5),
                (-118.4, 36.2),
                (-120.9, 36.2),
            ]],
            income: 2.6,
        },
        County {
            name: "Los Angeles",
            ocean_proximity: "<1H OCEAN",
            parts: vec![
                rect(-118.95, 33.70, -117.65, 34.82),
                // Santa Catalina
                rect(-118.60, 33.30, -118.30, 33.48),
                // San Clemente
                rect(-118.60, 32.80, -118.35, 33.03),
            ],
            income: 3.9,
        },
        County {
            name: "Marin",
            ocean_proximity: "NEAR OCEAN",
            parts: vec![vec![
                (-123.0, 37.85),
                (-122.45, 37.85),
                (-122.45, 38.32),
                (-123.0, 37.85),
            ]],
            income: 6.8,
        },
        County {
            name: "Sacramento",
            ocean_proximity: "INLAND",
            parts: vec![rect(-121.85, 38.0, -121.0, 38.75)],
            income: 3.1,
        },
    ]
}

fn polygon_wkb(ring: &[(f64, f64)]) -> Vec<u8> {
    let mut out = vec![1u8];
    out.extend_from_slice(&3u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(ring.len() as u32).to_le_bytes());
    for &(x, y) in ring {
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
    }
    out
}

fn geometry_wkb(parts: &[Vec<(f64, f64)>]) -> Vec<u8> {
    if let [single] = parts {
        return polygon_wkb(single);
    }
    let mut out = vec![1u8];
    out.extend_from_slice(&6u32.to_le_bytes());
    out.extend_from_slice(&(parts.len() as u32).to_le_bytes());
    for part in parts {
        out.extend(polygon_wkb(part));
    }
    out
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[derive(Default)]
struct Columns {
    longitude: Vec<f64>,
    latitude: Vec<f64>,
    housing_median_age: Vec<f64>,
    total_rooms: Vec<f64>,
    total_bedrooms: Vec<f64>,
    population: Vec<f64>,
    households: Vec<f64>,
    median_income: Vec<f64>,
    median_house_value: Vec<f64>,
}

impl Columns {
    fn arrays(&self) -> Vec<(&'static str, ArrayRef)> {
        let f = |v: &Vec<f64>| -> ArrayRef { Arc::new(Float64Array::from(v.clone())) };
        vec![
            ("longitude", f(&self.longitude)),
            ("latitude", f(&self.latitude)),
            ("housing_median_age", f(&self.housing_median_age)),
            ("total_rooms", f(&self.total_rooms)),
            ("total_bedrooms", f(&self.total_bedrooms)),
            ("population", f(&self.population)),
            ("households", f(&self.households)),
            ("median_income", f(&self.median_income)),
        ]
    }
}

fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) -> Result<()> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), false))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, a)| a).collect(),
    )?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn model_json() -> serde_json::Value {
    json!({
        "features": [
            "longitude", "latitude", "housing_median_age", "total_rooms",
            "total_bedrooms", "population", "households", "median_income",
            "ocean_proximity", "median_income_cat", "rooms_per_household",
            "population_per_household", "bedrooms_per_room"
        ],
        "intercept": 12.0,
        "numeric": {
            "longitude": { "mean": -119.6, "scale": 2.0, "weight": -0.18 },
            "latitude": { "mean": 35.6, "scale": 2.1, "weight": -0.20 },
            "housing_median_age": { "mean": 28.6, "scale": 12.6, "weight": 0.03 },
            "total_rooms": { "mean": 2636.0, "scale": 2185.0, "weight": 0.01 },
            "total_bedrooms": { "mean": 538.0, "scale": 421.0, "weight": 0.02 },
            "population": { "mean": 1425.0, "scale": 1132.0, "weight": -0.04 },
            "households": { "mean": 500.0, "scale": 382.0, "weight": 0.03 },
            "median_income": { "mean": 3.87, "scale": 1.9, "weight": 0.28 },
            "rooms_per_household": { "mean": 5.4, "scale": 2.5, "weight": 0.02 },
            "population_per_household": { "mean": 3.07, "scale": 10.4, "weight": -0.03 },
            "bedrooms_per_room": { "mean": 0.21, "scale": 0.06, "weight": 0.05 }
        },
        "categorical": {
            "ocean_proximity": {
                "<1H OCEAN": 0.05, "INLAND": -0.28, "ISLAND": 0.4,
                "NEAR BAY": 0.08, "NEAR OCEAN": 0.06
            },
            "median_income_cat": { "1": -0.1, "2": -0.03, "3": 0.0, "4": 0.03, "5": 0.06 }
        },
        "target": "log1p"
    })
}

fn main() -> Result<()> {
    let out = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let out = Path::new(&out);
    std::fs::create_dir_all(out.join("data"))?;
    std::fs::create_dir_all(out.join("models"))?;

    let mut rng = SampleRng(42);
    let counties = counties();

    let mut clean = Columns::default();
    let mut clean_ocean: Vec<&str> = Vec::new();

    let mut geo = Columns::default();
    let mut geo_names = Vec::new();
    let mut geo_ocean = Vec::new();
    let mut geo_wkb = Vec::new();
    let mut ratios: [Vec<f64>; 3] = Default::default();

    for county in &counties {
        let (x0, y0, x1, y1) = county.parts[0].iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(a, b, c, d), &(x, y)| (a.min(x), b.min(y), c.max(x), d.max(y)),
        );

        let mut block = Columns::default();
        for _ in 0..40 {
            let households = rng.uniform(150.0, 900.0).round();
            let rooms = (households * rng.uniform(4.0, 7.0)).round();
            let income = (county.income * rng.uniform(0.6, 1.4) * 1e4).round() / 1e4;
            block.longitude.push(rng.uniform(x0, x1));
            block.latitude.push(rng.uniform(y0, y1));
            block.housing_median_age.push(rng.uniform(2.0, 52.0).round());
            block.total_rooms.push(rooms);
            block.total_bedrooms.push((rooms * rng.uniform(0.17, 0.25)).round());
            block.population.push((households * rng.uniform(2.2, 3.6)).round());
            block.households.push(households);
            block.median_income.push(income);
            block
                .median_house_value
                .push((income * 45_000.0 + rng.uniform(20_000.0, 90_000.0)).min(500_001.0));
        }

        // county medians
        let med = |v: &Vec<f64>| median(&mut v.clone());
        let rooms = med(&block.total_rooms);
        let bedrooms = med(&block.total_bedrooms);
        let population = med(&block.population);
        let households = med(&block.households);
        geo.longitude.push(med(&block.longitude));
        geo.latitude.push(med(&block.latitude));
        geo.housing_median_age.push(med(&block.housing_median_age));
        geo.total_rooms.push(rooms);
        geo.total_bedrooms.push(bedrooms);
        geo.population.push(population);
        geo.households.push(households);
        geo.median_income.push(med(&block.median_income));
        ratios[0].push(rooms / households);
        ratios[1].push(population / households);
        ratios[2].push(bedrooms / rooms);
        geo_names.push(county.name);
        geo_ocean.push(county.ocean_proximity);
        geo_wkb.push(geometry_wkb(&county.parts));

        clean_ocean.extend(std::iter::repeat(county.ocean_proximity).take(40));
        clean.longitude.extend(block.longitude);
        clean.latitude.extend(block.latitude);
        clean.housing_median_age.extend(block.housing_median_age);
        clean.total_rooms.extend(block.total_rooms);
        clean.total_bedrooms.extend(block.total_bedrooms);
        clean.population.extend(block.population);
        clean.households.extend(block.households);
        clean.median_income.extend(block.median_income);
        clean.median_house_value.extend(block.median_house_value);
    }

    let clean_path = out.join("data/housing_clean.parquet");
    let mut clean_cols = clean.arrays();
    clean_cols.push(("ocean_proximity", Arc::new(StringArray::from(clean_ocean)) as ArrayRef));
    clean_cols.push((
        "median_house_value",
        Arc::new(Float64Array::from(clean.median_house_value.clone())) as ArrayRef,
    ));
    write_parquet(&clean_path, clean_cols)?;

    let geo_path = out.join("data/geo_median.parquet");
    let mut geo_cols = vec![("name", Arc::new(StringArray::from(geo_names)) as ArrayRef)];
    geo_cols.extend(geo.arrays());
    geo_cols.push(("ocean_proximity", Arc::new(StringArray::from(geo_ocean)) as ArrayRef));
    let [rph, pph, bpr] = ratios;
    geo_cols.push(("rooms_per_household", Arc::new(Float64Array::from(rph)) as ArrayRef));
    geo_cols.push(("population_per_household", Arc::new(Float64Array::from(pph)) as ArrayRef));
    geo_cols.push(("bedrooms_per_room", Arc::new(Float64Array::from(bpr)) as ArrayRef));
    geo_cols.push(("geometry", Arc::new(BinaryArray::from_iter_values(geo_wkb)) as ArrayRef));
    write_parquet(&geo_path, geo_cols)?;

    let model_path = out.join("models/model.json");
    std::fs::write(&model_path, serde_json::to_string_pretty(&model_json())?)?;

    let config = json!({
        "clean_data": "data/housing_clean.parquet",
        "geo_data": "data/geo_median.parquet",
        "model": "models/model.json",
        "county_income_divisor": 10.0,
        "manual_income_divisor": 1.0,
        "currency_symbol": "US$"
    });
    std::fs::write(out.join("housing.json"), serde_json::to_string_pretty(&config)?)?;

    println!(
        "Wrote {} records and {} counties to {}",
        counties.len() * 40,
        counties.len(),
        out.display()
    );
    Ok(())
}
