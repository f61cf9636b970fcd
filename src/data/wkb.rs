//! Minimal WKB decoding for the polygon geometries GeoPandas writes to parquet.

use std::io::{Cursor, Read};

use anyhow::{bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};

const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOLYGON: u32 = 6;
/// Byte order marker: little endian.
const WKB_LE: u8 = 1;

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    little_endian: bool,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            little_endian: true,
        }
    }

    fn byte_order(&mut self) -> Result<()> {
        let mut b = [0u8; 1];
        self.cursor
            .read_exact(&mut b)
            .context("[wkb] failed to read byte order")?;
        self.little_endian = b[0] == WKB_LE;
        Ok(())
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        let mut b = [0u8; 4];
        self.cursor
            .read_exact(&mut b)
            .with_context(|| format!("[wkb] failed to read {what}"))?;
        Ok(if self.little_endian {
            u32::from_le_bytes(b)
        } else {
            u32::from_be_bytes(b)
        })
    }

    fn f64(&mut self) -> Result<f64> {
        let mut b = [0u8; 8];
        self.cursor
            .read_exact(&mut b)
            .context("[wkb] failed to read coordinate")?;
        Ok(if self.little_endian {
            f64::from_le_bytes(b)
        } else {
            f64::from_be_bytes(b)
        })
    }

    /// Returns `(base type, extra ordinates per point)`.
    fn header(&mut self) -> Result<(u32, usize)> {
        self.byte_order()?;
        let raw = self.u32("geometry type")?;
        let mut extra = 0;
        if raw & EWKB_Z != 0 {
            extra += 1;
        }
        if raw & EWKB_M != 0 {
            extra += 1;
        }
        if raw & EWKB_SRID != 0 {
            self.u32("srid")?;
        }
        let code = raw & 0x0FFF_FFFF;
        // ISO flavour: 1000 = Z, 2000 = M, 3000 = ZM
        let (base, iso_extra) = match code / 1000 {
            0 => (code, 0),
            1 | 2 => (code % 1000, 1),
            3 => (code % 1000, 2),
            _ => bail!("[wkb] unknown geometry type code {code}"),
        };
        Ok((base, extra + iso_extra))
    }

    fn ring(&mut self, extra: usize) -> Result<LineString<f64>> {
        let n = self.u32("ring length")?;
        let mut coords = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let x = self.f64()?;
            let y = self.f64()?;
            for _ in 0..extra {
                self.f64()?;
            }
            coords.push(Coord { x, y });
        }
        Ok(LineString::from(coords))
    }

    fn polygon_body(&mut self, extra: usize) -> Result<Polygon<f64>> {
        let num_rings = self.u32("number of rings")?;
        if num_rings == 0 {
            return Ok(Polygon::new(LineString::new(vec![]), vec![]));
        }
        let exterior = self.ring(extra)?;
        let interiors = (1..num_rings)
            .map(|_| self.ring(extra))
            .collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }
}

/// Decode a WKB Polygon or MultiPolygon (2D, Z or M ordinates are dropped).
pub fn geometry_from_wkb(bytes: &[u8]) -> Result<Geometry<f64>> {
    let mut reader = Reader::new(bytes);
    let (base, extra) = reader.header()?;
    match base {
        WKB_POLYGON => Ok(Geometry::Polygon(reader.polygon_body(extra)?)),
        WKB_MULTIPOLYGON => {
            let n = reader.u32("number of polygons")?;
            let mut polygons = Vec::with_capacity(n as usize);
            for i in 0..n {
                let (part, part_extra) = reader.header()?;
                if part != WKB_POLYGON {
                    bail!("[wkb] multipolygon part {i} has type {part}, expected polygon");
                }
                polygons.push(reader.polygon_body(part_extra)?);
            }
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => bail!("[wkb] expected Polygon or MultiPolygon geometry type, got {other}"),
    }
}

/// Encode a polygon as little-endian WKB.
#[cfg(test)]
pub fn polygon_to_wkb(polygon: &Polygon<f64>) -> Vec<u8> {
    let mut out = vec![WKB_LE];
    out.extend_from_slice(&WKB_POLYGON.to_le_bytes());
    write_polygon_body(&mut out, polygon);
    out
}

/// Encode a multipolygon as little-endian WKB.
#[cfg(test)]
pub fn multipolygon_to_wkb(multi: &MultiPolygon<f64>) -> Vec<u8> {
    let mut out = vec![WKB_LE];
    out.extend_from_slice(&WKB_MULTIPOLYGON.to_le_bytes());
    out.extend_from_slice(&(multi.0.len() as u32).to_le_bytes());
    for polygon in &multi.0 {
        out.extend(polygon_to_wkb(polygon));
    }
    out
}

#[cfg(test)]
fn write_polygon_body(out: &mut Vec<u8>, polygon: &Polygon<f64>) {
    let rings: Vec<&LineString<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();
    out.extend_from_slice(&(rings.len() as u32).to_le_bytes());
    for ring in rings {
        out.extend_from_slice(&(ring.0.len() as u32).to_le_bytes());
        for c in &ring.0 {
            out.extend_from_slice(&c.x.to_le_bytes());
            out.extend_from_slice(&c.y.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> Polygon<f64> {
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)]
    }

    #[test]
    fn decodes_little_endian_polygon() {
        let bytes = polygon_to_wkb(&square());
        assert_eq!(geometry_from_wkb(&bytes).unwrap(), Geometry::Polygon(square()));
    }

    #[test]
    fn decodes_big_endian_polygon() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&WKB_POLYGON.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&4u32.to_be_bytes());
        for (x, y) in [(0.0f64, 0.0f64), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)] {
            bytes.extend_from_slice(&x.to_be_bytes());
            bytes.extend_from_slice(&y.to_be_bytes());
        }
        let Geometry::Polygon(p) = geometry_from_wkb(&bytes).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(p.exterior().0.len(), 4);
        assert_eq!(p.exterior().0[1], Coord { x: 2.0, y: 0.0 });
    }

    #[test]
    fn decodes_multipolygon_parts() {
        let other = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0), (x: 5.0, y: 5.0)];
        let multi = MultiPolygon::new(vec![square(), other]);
        let decoded = geometry_from_wkb(&multipolygon_to_wkb(&multi)).unwrap();
        assert_eq!(decoded, Geometry::MultiPolygon(multi));
    }

    #[test]
    fn drops_z_ordinates_of_iso_polygon() {
        let mut bytes = vec![WKB_LE];
        bytes.extend_from_slice(&1003u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        for (x, y, z) in [(0.0f64, 0.0f64, 9.0f64), (1.0, 0.0, 9.0), (0.0, 0.0, 9.0)] {
            bytes.extend_from_slice(&x.to_le_bytes());
            bytes.extend_from_slice(&y.to_le_bytes());
            bytes.extend_from_slice(&z.to_le_bytes());
        }
        let Geometry::Polygon(p) = geometry_from_wkb(&bytes).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(p.exterior().0[1], Coord { x: 1.0, y: 0.0 });
    }

    #[test]
    fn rejects_points_and_truncated_input() {
        let mut point = vec![WKB_LE];
        point.extend_from_slice(&1u32.to_le_bytes());
        assert!(geometry_from_wkb(&point).is_err());

        let bytes = polygon_to_wkb(&square());
        assert!(geometry_from_wkb(&bytes[..bytes.len() - 3]).is_err());
    }
}
