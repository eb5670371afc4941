use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

use crate::{crs::Crs, error::{Error, Result}, layer::FeatureCollection};

/// Build a proj4rs projection for a supported CRS.
fn build_proj(crs: Crs) -> Result<(Proj, bool)> {
    let def = crs.definition()?;
    let proj = Proj::from_proj_string(def.proj4)
        .map_err(|e| Error::UnknownCrs(format!("{crs}: failed to build PROJ.4 `{}`: {e}", def.proj4)))?;
    Ok((proj, def.geographic))
}

/// Reproject every feature of `collection` into `target`, leaving attributes untouched.
/// Reprojecting into the collection's own CRS returns an identical copy.
pub fn reproject(collection: &FeatureCollection, target: Crs) -> Result<FeatureCollection> {
    let source = collection.crs();
    let (from, from_geographic) = build_proj(source)?;
    let (to, to_geographic) = build_proj(target)?;

    if source == target {
        log::debug!("reproject: collection already in {target}");
        return Ok(collection.clone());
    }

    log::info!("reprojecting {} features from {source} to {target}", collection.len());

    let transform_error = |reason: String| Error::Transformation { from: source.code(), to: target.code(), reason };

    // Geographic coords go in as radians and come out as radians.
    let project = |coord: Coord<f64>| -> Result<Coord<f64>> {
        let mut point = if from_geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&from, &to, &mut point)
            .map_err(|e| transform_error(format!("({}, {}): {e}", coord.x, coord.y)))?;

        let (x, y) = if to_geographic { (point.0.to_degrees(), point.1.to_degrees()) } else { (point.0, point.1) };
        if !x.is_finite() || !y.is_finite() {
            return Err(transform_error(format!("({}, {}) has no finite image", coord.x, coord.y)));
        }
        Ok(Coord { x, y })
    };

    let geometries = collection.features().iter()
        .map(|feature| feature.geometry.try_map_coords(project))
        .collect::<Result<Vec<MultiPolygon<f64>>>>()?;

    Ok(collection.with_geometries(geometries, target))
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;
    use geo::{Coord, LineString, MultiPolygon, Polygon};

    use super::*;
    use crate::layer::{FeatureCollection, PolygonFeature, Schema};

    fn single(coords: &[(f64, f64)], crs: Crs) -> FeatureCollection {
        let ring = LineString::from(coords.to_vec());
        let feature = PolygonFeature::new(MultiPolygon(vec![Polygon::new(ring, vec![])]), AHashMap::new());
        FeatureCollection::new(vec![feature], Schema::default(), crs)
    }

    fn coords(collection: &FeatureCollection) -> Vec<Coord<f64>> {
        collection.features()[0].geometry.0[0].exterior().0.clone()
    }

    #[test]
    fn same_crs_is_identity() {
        let square = [(445_000.0, 5_548_000.0), (447_000.0, 5_548_000.0), (447_000.0, 5_550_000.0), (445_000.0, 5_548_000.0)];
        let layer = single(&square, Crs::epsg(25832));
        let out = reproject(&layer, Crs::epsg(25832)).unwrap();
        assert_eq!(out.crs(), Crs::epsg(25832));
        assert_eq!(coords(&out), coords(&layer));
    }

    #[test]
    fn wgs84_to_utm32_lands_in_zone() {
        // Wiesbaden
        let ring = [(8.24, 50.0826), (8.25, 50.0826), (8.25, 50.09), (8.24, 50.0826)];
        let out = reproject(&single(&ring, Crs::epsg(4326)), Crs::epsg(25832)).unwrap();
        let first = coords(&out)[0];
        assert!((first.x - 445_600.0).abs() < 2_000.0, "easting {}", first.x);
        assert!((first.y - 5_548_400.0).abs() < 2_000.0, "northing {}", first.y);
    }

    #[test]
    fn utm_round_trip_is_sub_millimetre() {
        let ring = [(445_123.25, 5_548_321.5), (452_000.0, 5_548_321.5), (452_000.0, 5_556_000.0), (445_123.25, 5_548_321.5)];
        let layer = single(&ring, Crs::epsg(25832));
        let there = reproject(&layer, Crs::epsg(4258)).unwrap();
        let back = reproject(&there, Crs::epsg(25832)).unwrap();

        for (a, b) in coords(&layer).iter().zip(coords(&back)) {
            assert!((a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn unknown_crs_is_rejected() {
        let layer = single(&[(0., 0.), (1., 0.), (1., 1.), (0., 0.)], Crs::epsg(12345));
        assert!(matches!(reproject(&layer, Crs::epsg(25832)), Err(Error::UnknownCrs(_))));
        let layer = single(&[(0., 0.), (1., 0.), (1., 1.), (0., 0.)], Crs::epsg(25832));
        assert!(matches!(reproject(&layer, Crs::epsg(12345)), Err(Error::UnknownCrs(_))));
    }
}
