//! Render preparation for county polygons.
//!
//! Explodes multipolygons, repairs invalid shapes by unioning them with themselves,
//! forces counter-clockwise exteriors and extracts exterior rings as plain
//! coordinate arrays. The result is a new [`MapLayer`]; the shared
//! [`GeoSummary`] is only borrowed.

use geo::algorithm::orient::{Direction, Orient};
use geo::{unary_union, Contains, CoordsIter, Geometry, LineString, MultiPolygon, Point, Polygon, Validation};

use crate::error::GeometryError;

use super::model::{CountyAttributes, GeoSummary};

/// Closed exterior ring as `[x, y]` pairs.
pub type Ring = Vec<[f64; 2]>;

/// One constituent polygon of a county, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature {
    pub name: String,
    pub attributes: CountyAttributes,
    /// One ring, or several when repairing split the polygon.
    pub rings: Vec<Ring>,
}

impl MapFeature {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let point = Point::new(x, y);
        self.rings.iter().any(|ring| {
            let exterior: LineString<f64> = ring.iter().map(|&[x, y]| (x, y)).collect();
            Polygon::new(exterior, vec![]).contains(&point)
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MapLayer {
    pub features: Vec<MapFeature>,
}

impl MapLayer {
    /// All parts of the named county (the highlight layer).
    pub fn features_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MapFeature> + 'a {
        self.features.iter().filter(move |f| f.name == name)
    }

    /// First feature under the given map coordinate.
    pub fn hit(&self, x: f64, y: f64) -> Option<&MapFeature> {
        self.features.iter().find(|f| f.contains(x, y))
    }
}

/// Build the polygon layer for every county in the summary.
pub fn normalize_layer(summary: &GeoSummary) -> Result<MapLayer, GeometryError> {
    let mut features = Vec::with_capacity(summary.len());
    for county in summary.counties() {
        for polygon in explode(&county.name, &county.geometry)? {
            let rings = normalize_polygon(&county.name, polygon)?;
            features.push(MapFeature {
                name: county.name.clone(),
                attributes: county.attributes.clone(),
                rings,
            });
        }
    }
    log::info!(
        "Prepared {} map polygons for {} counties",
        features.len(),
        summary.len()
    );
    Ok(MapLayer { features })
}

fn explode(name: &str, geometry: &Geometry<f64>) -> Result<Vec<Polygon<f64>>, GeometryError> {
    match geometry {
        Geometry::Polygon(p) => Ok(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => Ok(mp.0.clone()),
        other => Err(GeometryError::Unsupported {
            name: name.to_string(),
            kind: geometry_kind(other),
        }),
    }
}

fn normalize_polygon(name: &str, polygon: Polygon<f64>) -> Result<Vec<Ring>, GeometryError> {
    if polygon
        .coords_iter()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(GeometryError::NonFinite {
            name: name.to_string(),
        });
    }
    if polygon.exterior().0.is_empty() {
        return Err(GeometryError::Unrepairable {
            name: name.to_string(),
        });
    }

    let parts = if polygon.is_valid() {
        MultiPolygon::new(vec![polygon])
    } else {
        log::warn!("County '{name}' has an invalid polygon, repairing with a unary union");
        // the overlay rebuilds rings from the noded edges, splitting bowties
        let repaired = unary_union([&polygon]);
        if repaired.0.is_empty() || !repaired.is_valid() {
            return Err(GeometryError::Unrepairable {
                name: name.to_string(),
            });
        }
        repaired
    };

    Ok(parts
        .orient(Direction::Default)
        .0
        .iter()
        .map(|p| p.exterior().0.iter().map(|c| [c.x, c.y]).collect())
        .collect())
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CountySummary;
    use geo::{polygon, Winding};

    fn summary(rows: Vec<(&str, Geometry<f64>)>) -> GeoSummary {
        GeoSummary::from_counties(
            rows.into_iter()
                .map(|(name, geometry)| CountySummary {
                    name: name.to_string(),
                    attributes: CountyAttributes {
                        median_income: 3.5,
                        ocean_proximity: "INLAND".into(),
                        ..Default::default()
                    },
                    geometry,
                })
                .collect(),
        )
        .unwrap()
    }

    fn clockwise_square(offset: f64) -> Polygon<f64> {
        polygon![
            (x: offset, y: 0.0),
            (x: offset, y: 1.0),
            (x: offset + 1.0, y: 1.0),
            (x: offset + 1.0, y: 0.0),
        ]
    }

    fn is_closed_ccw(ring: &Ring) -> bool {
        let ls: LineString<f64> = ring.iter().map(|&[x, y]| (x, y)).collect();
        ring.first() == ring.last() && ls.is_ccw()
    }

    #[test]
    fn rings_are_closed_and_counter_clockwise() {
        let ccw = polygon![(x: 5.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 1.0), (x: 5.0, y: 1.0)];
        let layer = normalize_layer(&summary(vec![
            ("Clockwise", Geometry::Polygon(clockwise_square(0.0))),
            ("Counter", Geometry::Polygon(ccw)),
        ]))
        .unwrap();

        assert_eq!(layer.features.len(), 2);
        for feature in &layer.features {
            assert_eq!(feature.rings.len(), 1);
            assert!(is_closed_ccw(&feature.rings[0]), "{}", feature.name);
        }
    }

    #[test]
    fn multipolygon_explodes_into_one_feature_per_part() {
        let parts = MultiPolygon::new(vec![
            clockwise_square(0.0),
            clockwise_square(10.0),
            clockwise_square(20.0),
        ]);
        let source = summary(vec![("Islands", Geometry::MultiPolygon(parts))]);
        let layer = normalize_layer(&source).unwrap();

        assert_eq!(layer.features.len(), 3);
        let original = &source.lookup("Islands").unwrap().attributes;
        for feature in &layer.features {
            assert_eq!(feature.name, "Islands");
            assert_eq!(&feature.attributes, original);
            assert!(is_closed_ccw(&feature.rings[0]));
        }
        // the shared summary keeps its geometry
        assert!(matches!(
            source.lookup("Islands").unwrap().geometry,
            Geometry::MultiPolygon(_)
        ));
    }

    #[test]
    fn non_polygon_and_non_finite_geometries_fail() {
        let err = normalize_layer(&summary(vec![(
            "Dot",
            Geometry::Point(Point::new(1.0, 2.0)),
        )]))
        .unwrap_err();
        assert_eq!(
            err,
            GeometryError::Unsupported { name: "Dot".into(), kind: "Point" }
        );

        let nan = polygon![(x: 0.0, y: 0.0), (x: f64::NAN, y: 0.0), (x: 1.0, y: 1.0)];
        let err = normalize_layer(&summary(vec![("Void", Geometry::Polygon(nan))])).unwrap_err();
        assert_eq!(err, GeometryError::NonFinite { name: "Void".into() });
    }

    #[test]
    fn self_intersecting_polygon_is_repaired() {
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
        assert!(!bowtie.is_valid());

        let layer = normalize_layer(&summary(vec![
            ("Bowtie", Geometry::Polygon(bowtie)),
            ("Square", Geometry::Polygon(clockwise_square(5.0))),
        ]))
        .unwrap();

        let repaired: Vec<_> = layer.features_named("Bowtie").collect();
        assert!(!repaired.is_empty());
        for feature in repaired {
            assert!(!feature.rings.is_empty());
            for ring in &feature.rings {
                assert!(is_closed_ccw(ring));
                let exterior: LineString<f64> = ring.iter().map(|&[x, y]| (x, y)).collect();
                assert!(Polygon::new(exterior, vec![]).is_valid());
            }
        }
        assert_eq!(layer.features_named("Square").count(), 1);
    }

    #[test]
    fn hit_testing_and_highlight_lookup() {
        let layer = normalize_layer(&summary(vec![
            ("A", Geometry::Polygon(clockwise_square(0.0))),
            ("B", Geometry::Polygon(clockwise_square(3.0))),
        ]))
        .unwrap();
        assert_eq!(layer.hit(0.5, 0.5).map(|f| f.name.as_str()), Some("A"));
        assert_eq!(layer.hit(3.5, 0.5).map(|f| f.name.as_str()), Some("B"));
        assert!(layer.hit(2.0, 0.5).is_none());
        assert_eq!(layer.features_named("B").count(), 1);
    }
}
