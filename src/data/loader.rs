use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{
    Array, AsArray, BinaryArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeBinaryArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{
    CountyAttributes, CountySummary, GeoSummary, HousingRecord, HousingTable,
};
use super::predictor::{LinearModel, Predictor};
use super::wkb::geometry_from_wkb;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the clean housing table.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – the table written by the cleaning notebook (recommended)
/// * `.csv`     – same columns, header row required
pub fn load_clean_table(path: &Path) -> Result<HousingTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_clean_parquet(path),
        "csv" => load_clean_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load the per-county summary (GeoPandas parquet with a WKB `geometry` column).
pub fn load_geo_summary(path: &Path) -> Result<GeoSummary> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let name = column(&batch, "name")?;
        let geometry = column(&batch, "geometry")?;
        let longitude = column(&batch, "longitude")?;
        let latitude = column(&batch, "latitude")?;
        let age = column(&batch, "housing_median_age")?;
        let rooms = column(&batch, "total_rooms")?;
        let bedrooms = column(&batch, "total_bedrooms")?;
        let population = column(&batch, "population")?;
        let households = column(&batch, "households")?;
        let income = column(&batch, "median_income")?;
        let ocean = column(&batch, "ocean_proximity")?;
        let rph = column(&batch, "rooms_per_household")?;
        let pph = column(&batch, "population_per_household")?;
        let bpr = column(&batch, "bedrooms_per_room")?;

        for row in 0..batch.num_rows() {
            let county = string_value(name, row).with_context(|| format!("Row {row}: 'name'"))?;
            let wkb = binary_value(geometry, row)
                .with_context(|| format!("Row {row} ({county}): 'geometry'"))?;
            let geometry = geometry_from_wkb(wkb)
                .with_context(|| format!("Row {row} ({county}): decoding geometry"))?;

            let f = |col: &Arc<dyn Array>, label: &str| {
                f64_value(col, row).with_context(|| format!("Row {row} ({county}): '{label}'"))
            };
            let attributes = CountyAttributes {
                longitude: f(longitude, "longitude")?,
                latitude: f(latitude, "latitude")?,
                housing_median_age: f(age, "housing_median_age")?,
                total_rooms: f(rooms, "total_rooms")?,
                total_bedrooms: f(bedrooms, "total_bedrooms")?,
                population: f(population, "population")?,
                households: f(households, "households")?,
                median_income: f(income, "median_income")?,
                ocean_proximity: string_value(ocean, row)
                    .with_context(|| format!("Row {row} ({county}): 'ocean_proximity'"))?,
                rooms_per_household: f(rph, "rooms_per_household")?,
                population_per_household: f(pph, "population_per_household")?,
                bedrooms_per_room: f(bpr, "bedrooms_per_room")?,
            };

            rows.push(CountySummary {
                name: county,
                attributes,
                geometry,
            });
        }
    }

    GeoSummary::from_counties(rows).map_err(|e| anyhow!(e))
}

/// Load the serialized regression model.
pub fn load_model(path: &Path) -> Result<Arc<dyn Predictor>> {
    let text = std::fs::read_to_string(path).context("reading model artifact")?;
    let model = LinearModel::from_json(&text)?;
    Ok(Arc::new(model))
}

// ---------------------------------------------------------------------------
// Clean table loaders
// ---------------------------------------------------------------------------

fn load_clean_csv(path: &Path) -> Result<HousingTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let records = reader
        .deserialize::<HousingRecord>()
        .enumerate()
        .map(|(row, rec)| rec.with_context(|| format!("CSV row {row}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(HousingTable::new(records))
}

fn load_clean_parquet(path: &Path) -> Result<HousingTable> {
    let mut records = Vec::new();
    for batch in read_batches(path)? {
        let numeric: Vec<&Arc<dyn Array>> = super::model::NUMERIC_COLUMNS
            .iter()
            .map(|c| column(&batch, c))
            .collect::<Result<_>>()?;
        let ocean = column(&batch, "ocean_proximity")?;
        let target = batch.column_by_name("median_house_value");

        for row in 0..batch.num_rows() {
            let mut v = [0.0f64; 8];
            for (slot, col) in v.iter_mut().zip(&numeric) {
                *slot = f64_value(col, row).with_context(|| format!("Row {row}"))?;
            }
            let median_house_value = match target {
                Some(col) if !col.is_null(row) => Some(f64_value(col, row)?),
                _ => None,
            };
            records.push(HousingRecord {
                longitude: v[0],
                latitude: v[1],
                housing_median_age: v[2],
                total_rooms: v[3],
                total_bedrooms: v[4],
                population: v[5],
                households: v[6],
                median_income: v[7],
                ocean_proximity: string_value(ocean, row)
                    .with_context(|| format!("Row {row}: 'ocean_proximity'"))?,
                median_house_value,
            });
        }
    }
    Ok(HousingTable::new(records))
}

// -- Parquet / Arrow helpers --

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;
    reader
        .map(|b| b.context("reading parquet record batch"))
        .collect()
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Arc<dyn Array>> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("Parquet file missing '{name}' column"))
}

/// Read a numeric cell as `f64`; pandas writes float64 but int columns show up too.
fn f64_value(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in numeric column");
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(row) as f64),
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(row) as f64),
        other => bail!("expected a numeric column, got {other:?}"),
    };
    value.context("array does not match its declared type")
}

fn string_value(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => Ok(col.as_string_view().value(row).to_string()),
        DataType::Dictionary(_, _) => {
            // pandas categoricals arrive dictionary-encoded
            let cast = arrow::compute::cast(col.as_ref(), &DataType::Utf8)
                .context("casting dictionary column to strings")?;
            Ok(cast.as_string::<i32>().value(row).to_string())
        }
        other => bail!("expected a string column, got {other:?}"),
    }
}

fn binary_value(col: &Arc<dyn Array>, row: usize) -> Result<&[u8]> {
    if col.is_null(row) {
        bail!("null geometry");
    }
    let any = col.as_any();
    let bytes = match col.data_type() {
        DataType::Binary => any.downcast_ref::<BinaryArray>().map(|a| a.value(row)),
        DataType::LargeBinary => any.downcast_ref::<LargeBinaryArray>().map(|a| a.value(row)),
        other => bail!("expected a WKB binary column, got {other:?}"),
    };
    bytes.context("array does not match its declared type")
}
