use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// HousingRecord – one row of the clean table
// ---------------------------------------------------------------------------

/// A single cleaned census block record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HousingRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    pub total_bedrooms: f64,
    pub population: f64,
    pub households: f64,
    pub median_income: f64,
    pub ocean_proximity: String,
    /// Training target; absent from some exports.
    #[serde(default)]
    pub median_house_value: Option<f64>,
}

/// Numeric columns of [`HousingRecord`], in file order.
pub const NUMERIC_COLUMNS: [&str; 8] = [
    "longitude",
    "latitude",
    "housing_median_age",
    "total_rooms",
    "total_bedrooms",
    "population",
    "households",
    "median_income",
];

impl HousingRecord {
    /// Value of a numeric column by name.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let v = match column {
            "longitude" => self.longitude,
            "latitude" => self.latitude,
            "housing_median_age" => self.housing_median_age,
            "total_rooms" => self.total_rooms,
            "total_bedrooms" => self.total_bedrooms,
            "population" => self.population,
            "households" => self.households,
            "median_income" => self.median_income,
            "median_house_value" => return self.median_house_value,
            _ => return None,
        };
        Some(v)
    }
}

// ---------------------------------------------------------------------------
// HousingTable – the complete clean dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct HousingTable {
    pub records: Vec<HousingRecord>,
}

impl HousingTable {
    pub fn new(records: Vec<HousingRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Sorted unique `ocean_proximity` labels.
    pub fn ocean_categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.ocean_proximity.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Median of a numeric column, ignoring NaNs. `None` for unknown or empty columns.
    pub fn median(&self, column: &str) -> Option<f64> {
        let mut values: Vec<f64> = self
            .records
            .iter()
            .filter_map(|r| r.numeric(column))
            .filter(|v| !v.is_nan())
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }
}

// ---------------------------------------------------------------------------
// County geo summary
// ---------------------------------------------------------------------------

/// Median housing attributes of one county plus the derived ratios.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountyAttributes {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    pub total_bedrooms: f64,
    pub population: f64,
    pub households: f64,
    pub median_income: f64,
    pub ocean_proximity: String,
    pub rooms_per_household: f64,
    pub population_per_household: f64,
    pub bedrooms_per_room: f64,
}

#[derive(Debug, Clone)]
pub struct CountySummary {
    pub name: String,
    pub attributes: CountyAttributes,
    /// Polygon or MultiPolygon as read from the file.
    pub geometry: geo::Geometry<f64>,
}

/// Per-county summaries keyed by unique county name.
#[derive(Debug, Clone, Default)]
pub struct GeoSummary {
    counties: BTreeMap<String, CountySummary>,
}

impl GeoSummary {
    /// Build from rows, rejecting duplicate names.
    pub fn from_counties(rows: Vec<CountySummary>) -> Result<Self, String> {
        let mut counties = BTreeMap::new();
        for row in rows {
            if counties.contains_key(&row.name) {
                return Err(format!("duplicate county name '{}'", row.name));
            }
            counties.insert(row.name.clone(), row);
        }
        Ok(Self { counties })
    }

    pub fn lookup(&self, name: &str) -> Option<&CountySummary> {
        self.counties.get(name)
    }

    /// County names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.counties.keys().map(String::as_str)
    }

    pub fn counties(&self) -> impl Iterator<Item = &CountySummary> {
        self.counties.values()
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }
}

// ---------------------------------------------------------------------------
// ModelInputRow – the single row handed to the predictor
// ---------------------------------------------------------------------------

/// A feature cell as the model sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(v) => write!(f, "{v}"),
            FeatureValue::Category(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputRow {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    pub total_bedrooms: f64,
    pub population: f64,
    pub households: f64,
    pub median_income: f64,
    pub ocean_proximity: String,
    pub median_income_cat: u8,
    pub rooms_per_household: f64,
    pub population_per_household: f64,
    pub bedrooms_per_room: f64,
}

impl ModelInputRow {
    /// Column names in the order the model was trained on.
    pub const COLUMNS: [&'static str; 13] = [
        "longitude",
        "latitude",
        "housing_median_age",
        "total_rooms",
        "total_bedrooms",
        "population",
        "households",
        "median_income",
        "ocean_proximity",
        "median_income_cat",
        "rooms_per_household",
        "population_per_household",
        "bedrooms_per_room",
    ];

    /// `(column, value)` pairs in [`Self::COLUMNS`] order.
    pub fn features(&self) -> [(&'static str, FeatureValue); 13] {
        use FeatureValue::{Category, Number};
        let c = Self::COLUMNS;
        [
            (c[0], Number(self.longitude)),
            (c[1], Number(self.latitude)),
            (c[2], Number(self.housing_median_age)),
            (c[3], Number(self.total_rooms)),
            (c[4], Number(self.total_bedrooms)),
            (c[5], Number(self.population)),
            (c[6], Number(self.households)),
            (c[7], Number(self.median_income)),
            (c[8], Category(self.ocean_proximity.clone())),
            (c[9], Category(self.median_income_cat.to_string())),
            (c[10], Number(self.rooms_per_household)),
            (c[11], Number(self.population_per_household)),
            (c[12], Number(self.bedrooms_per_room)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(income: f64, ocean: &str) -> HousingRecord {
        HousingRecord {
            longitude: -122.0,
            latitude: 37.0,
            housing_median_age: 20.0,
            total_rooms: 1000.0,
            total_bedrooms: 200.0,
            population: 800.0,
            households: 250.0,
            median_income: income,
            ocean_proximity: ocean.to_string(),
            median_house_value: None,
        }
    }

    fn county(name: &str) -> CountySummary {
        CountySummary {
            name: name.to_string(),
            attributes: CountyAttributes::default(),
            geometry: geo::Geometry::Point(geo::Point::new(0.0, 0.0)),
        }
    }

    #[test]
    fn median_handles_even_and_odd_counts() {
        let mut table = HousingTable::new(vec![record(1.0, "INLAND"), record(3.0, "NEAR BAY")]);
        assert_eq!(table.median("median_income"), Some(2.0));
        table.records.push(record(10.0, "INLAND"));
        assert_eq!(table.median("median_income"), Some(3.0));
        assert_eq!(table.median("no_such_column"), None);
    }

    #[test]
    fn ocean_categories_are_sorted_and_unique() {
        let table = HousingTable::new(vec![
            record(1.0, "NEAR BAY"),
            record(1.0, "<1H OCEAN"),
            record(1.0, "NEAR BAY"),
        ]);
        assert_eq!(table.ocean_categories(), vec!["<1H OCEAN", "NEAR BAY"]);
    }

    #[test]
    fn lookup_is_total_and_names_sorted() {
        let summary =
            GeoSummary::from_counties(vec![county("Yolo"), county("Alameda"), county("Kern")])
                .unwrap();
        let names: Vec<_> = summary.names().collect();
        assert_eq!(names, vec!["Alameda", "Kern", "Yolo"]);
        for name in names {
            assert_eq!(summary.lookup(name).map(|c| c.name.as_str()), Some(name));
        }
        assert!(summary.lookup("Atlantis").is_none());
    }

    #[test]
    fn duplicate_county_names_are_rejected() {
        let err = GeoSummary::from_counties(vec![county("Kern"), county("Kern")]).unwrap_err();
        assert!(err.contains("Kern"));
    }

    #[test]
    fn features_follow_column_order() {
        let row = ModelInputRow {
            longitude: 1.0,
            latitude: 2.0,
            housing_median_age: 3.0,
            total_rooms: 4.0,
            total_bedrooms: 5.0,
            population: 6.0,
            households: 7.0,
            median_income: 8.0,
            ocean_proximity: "INLAND".into(),
            median_income_cat: 5,
            rooms_per_household: 9.0,
            population_per_household: 10.0,
            bedrooms_per_room: 11.0,
        };
        let names: Vec<_> = row.features().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ModelInputRow::COLUMNS);
        assert_eq!(row.features()[9].1, FeatureValue::Category("5".into()));
    }
}
