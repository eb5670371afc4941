use geo::{Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use shapefile as shp;

/// Convert the rings of a shapefile polygon (any dimension) to a geo::MultiPolygon<f64>.
pub(super) fn rings_to_geo<P>(rings: &[shp::PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn closed(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
        LineString(coords)
    }

    let mut exteriors: Vec<Polygon<f64>> = Vec::new();
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let ls = closed(ring.points().iter().map(&xy).collect());
        if ls.0.len() < 4 { continue } // degenerate ring
        match ring {
            shp::PolygonRing::Outer(_) => exteriors.push(Polygon::new(ls, vec![])),
            shp::PolygonRing::Inner(_) => holes.push(ls),
        }
    }

    // Holes are not guaranteed to follow their exterior, so attach each to the exterior containing it.
    for hole in holes {
        let probe = Point::from(hole.0[0]);
        let owner = exteriors.iter_mut().rev()
            .find(|poly| Polygon::new(poly.exterior().clone(), vec![]).intersects(&probe));
        match owner {
            Some(poly) => poly.interiors_push(hole),
            None => exteriors.push(Polygon::new(hole, vec![])), // orphan hole, keep as area
        }
    }

    MultiPolygon(exteriors)
}
