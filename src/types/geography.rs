//! # Geography Values
//!
//! Geographic shapes and their well-known-binary (WKB) serialization. A
//! geography field stores the WKB byte string in the record tail, exactly
//! like a variable-length string; the shape constraint declared on the field
//! is enforced before serialization.
//!
//! ## WKB Layout (little-endian)
//!
//! ```text
//! [ 0x01 byte-order marker ]
//! [ u32 geometry type: 1 = point, 2 = linestring, 3 = polygon ]
//! point:      [ f64 x ] [ f64 y ]
//! linestring: [ u32 n ] n × ([ f64 x ] [ f64 y ])
//! polygon:    [ u32 rings ] rings × ([ u32 n ] n × ([ f64 x ] [ f64 y ]))
//! ```

/// Shape constraint declared on a geography field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoShape {
    Any,
    Point,
    LineString,
    Polygon,
}

/// A longitude/latitude pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geographic shape value.
#[derive(Debug, Clone, PartialEq)]
pub enum Geography {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
}

const WKB_LITTLE_ENDIAN: u8 = 0x01;

impl Geography {
    /// The concrete shape of this value.
    pub fn shape(&self) -> GeoShape {
        match self {
            Geography::Point(_) => GeoShape::Point,
            Geography::LineString(_) => GeoShape::LineString,
            Geography::Polygon(_) => GeoShape::Polygon,
        }
    }

    /// Serializes to little-endian WKB.
    pub fn as_wkb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wkb_len());
        out.push(WKB_LITTLE_ENDIAN);
        match self {
            Geography::Point(c) => {
                out.extend_from_slice(&1u32.to_le_bytes());
                append_coord(&mut out, c);
            }
            Geography::LineString(coords) => {
                out.extend_from_slice(&2u32.to_le_bytes());
                out.extend_from_slice(&(coords.len() as u32).to_le_bytes());
                for c in coords {
                    append_coord(&mut out, c);
                }
            }
            Geography::Polygon(rings) => {
                out.extend_from_slice(&3u32.to_le_bytes());
                out.extend_from_slice(&(rings.len() as u32).to_le_bytes());
                for ring in rings {
                    out.extend_from_slice(&(ring.len() as u32).to_le_bytes());
                    for c in ring {
                        append_coord(&mut out, c);
                    }
                }
            }
        }
        out
    }

    fn wkb_len(&self) -> usize {
        match self {
            Geography::Point(_) => 1 + 4 + 16,
            Geography::LineString(coords) => 1 + 4 + 4 + coords.len() * 16,
            Geography::Polygon(rings) => {
                1 + 4 + 4 + rings.iter().map(|r| 4 + r.len() * 16).sum::<usize>()
            }
        }
    }
}

fn append_coord(out: &mut Vec<u8>, c: &Coord) {
    out.extend_from_slice(&c.x.to_le_bytes());
    out.extend_from_slice(&c.y.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_wkb_layout() {
        let wkb = Geography::Point(Coord::new(1.0, -2.0)).as_wkb();
        assert_eq!(wkb.len(), 21);
        assert_eq!(wkb[0], 0x01);
        assert_eq!(&wkb[1..5], &1u32.to_le_bytes());
        assert_eq!(&wkb[5..13], &1.0f64.to_le_bytes());
        assert_eq!(&wkb[13..21], &(-2.0f64).to_le_bytes());
    }

    #[test]
    fn linestring_wkb_counts_points() {
        let coords = vec![Coord::new(0.0, 0.0), Coord::new(3.5, 4.5), Coord::new(7.0, 9.0)];
        let wkb = Geography::LineString(coords).as_wkb();
        assert_eq!(wkb.len(), 1 + 4 + 4 + 3 * 16);
        assert_eq!(&wkb[1..5], &2u32.to_le_bytes());
        assert_eq!(&wkb[5..9], &3u32.to_le_bytes());
    }

    #[test]
    fn polygon_wkb_counts_rings() {
        let ring = vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(0.0, 0.0),
        ];
        let wkb = Geography::Polygon(vec![ring]).as_wkb();
        assert_eq!(&wkb[1..5], &3u32.to_le_bytes());
        assert_eq!(&wkb[5..9], &1u32.to_le_bytes());
        assert_eq!(&wkb[9..13], &4u32.to_le_bytes());
        assert_eq!(wkb.len(), 1 + 4 + 4 + 4 + 4 * 16);
    }

    #[test]
    fn shape_matches_variant() {
        assert_eq!(Geography::Point(Coord::default()).shape(), GeoShape::Point);
        assert_eq!(Geography::LineString(vec![]).shape(), GeoShape::LineString);
        assert_eq!(Geography::Polygon(vec![]).shape(), GeoShape::Polygon);
    }

    #[test]
    fn wkb_capacity_estimate_is_exact() {
        let g = Geography::LineString(vec![Coord::new(1.0, 2.0); 5]);
        assert_eq!(g.as_wkb().len(), g.wkb_len());
    }
}
