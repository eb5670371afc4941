use std::{collections::BTreeMap, fs, path::Path};

use crate::{crs::Crs, error::{Error, Result}, layer::FeatureCollection};

use super::{geojson::read_geojson_bytes, shp::read_shapefile};

/// Load a polygon layer from a `.shp` or GeoJSON file, using the CRS it declares.
pub fn load(path: &Path) -> Result<FeatureCollection> {
    load_with_crs(path, None)
}

/// Load a polygon layer, falling back to `fallback` when the source declares no recognizable CRS.
///
/// Non-polygon features are dropped with a warning. A non-empty layer without any
/// polygon feature is rejected with [`Error::UnsupportedGeometry`].
pub fn load_with_crs(path: &Path, fallback: Option<Crs>) -> Result<FeatureCollection> {
    if !path.is_file() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (features, schema, dropped, declared, implied) = match extension.as_str() {
        "shp" => {
            let layer = read_shapefile(path)?;
            let dropped = layer.dropped.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<BTreeMap<_, _>>();
            (layer.features, layer.schema, dropped, layer.crs, None)
        }
        "geojson" | "json" => {
            let bytes = fs::read(path).map_err(|_| Error::SourceNotFound(path.to_path_buf()))?;
            let layer = read_geojson_bytes(&bytes)?;
            (layer.features, layer.schema, layer.dropped, layer.crs, layer.implied_crs)
        }
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    };

    let total_dropped: usize = dropped.values().sum();
    if features.is_empty() && total_dropped > 0 {
        return Err(Error::UnsupportedGeometry {
            path: path.to_path_buf(),
            found: dropped.into_keys().collect(),
        });
    }
    if total_dropped > 0 {
        log::warn!("{}: dropped {total_dropped} non-polygon features ({:?})", path.display(), dropped);
    }

    // an explicit fallback beats the format's implicit default
    let crs = declared.or(fallback).or(implied)
        .ok_or_else(|| Error::UnknownCrs(format!("{} declares no recognizable CRS", path.display())))?;
    let crs_name = crs.name()?;

    log::info!("loaded {} polygon features with {} columns from {} ({crs}, {crs_name})",
        features.len(), schema.len(), path.display());

    Ok(FeatureCollection::new(features, schema, crs))
}
