mod bbox;

use std::{fmt, str::FromStr};

use geo::{Area, BooleanOps, Relate};
use serde::Serialize;

use crate::{
    error::{Error, Result},
    layer::{FeatureCollection, PolygonFeature},
    schema::require_column,
};

use bbox::{finite_bounds, LayerIndex};

/// Name of the postal-code attribute on the PLZ layer.
pub const PLZ_COLUMN: &str = "plz";

/// Pass-through attribute names, looked up on the PLZ feature and then the district feature.
pub const NOTE_COLUMN: &str = "note";
pub const EINWOHNER_COLUMN: &str = "einwohner";
pub const QKM_COLUMN: &str = "qkm";

/// Intersections at or below this area (CRS units squared) are boundary artifacts, not overlaps.
pub const MIN_INTERSECTION_AREA: f64 = 1e-6;

/// How postal areas are matched against districts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum JoinMode {
    /// One row per intersecting pair; area approximated by the smaller feature's area.
    Predicate,
    /// One row per exact intersection polygon, with its area.
    #[default]
    Overlay,
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinMode::Predicate => "predicate",
            JoinMode::Overlay => "overlay",
        })
    }
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "predicate" | "intersects" => Ok(JoinMode::Predicate),
            "overlay" | "intersection" => Ok(JoinMode::Overlay),
            other => Err(format!("unknown join mode `{other}` (expected overlay or predicate)")),
        }
    }
}

/// One raw match between a postal area and a district.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinRow {
    pub plz: String,
    pub district_id: String,
    /// Overlap area in square meters.
    pub area_m2: Option<f64>,
    pub note: Option<String>,
    pub einwohner: Option<f64>,
    /// Reference area (km²) carried over from the source attributes.
    pub qkm: Option<f64>,
}

impl JoinRow {
    #[inline] pub fn area_km2(&self) -> Option<f64> { self.area_m2.map(|a| a / 1_000_000.0) }
}

/// Resolved locations of the pass-through attributes on both layers.
struct PassThrough<'a> {
    note: [Option<&'a str>; 2],
    einwohner: [Option<&'a str>; 2],
    qkm: [Option<&'a str>; 2],
}

impl<'a> PassThrough<'a> {
    fn new(plz_layer: &'a FeatureCollection, district_layer: &'a FeatureCollection) -> Self {
        let find = |name: &str| [plz_layer.schema().find_ignore_case(name), district_layer.schema().find_ignore_case(name)];
        Self { note: find(NOTE_COLUMN), einwohner: find(EINWOHNER_COLUMN), qkm: find(QKM_COLUMN) }
    }

    /// First non-null value of an attribute across (plz feature, district feature).
    fn lookup<T>(
        columns: &[Option<&str>; 2],
        features: [&PolygonFeature; 2],
        convert: impl Fn(&crate::layer::AttrValue) -> Option<T>,
    ) -> Option<T> {
        columns.iter().zip(features)
            .filter_map(|(column, feature)| column.map(|c| feature.get(c)))
            .find_map(convert)
    }

    fn row(&self, plz: &str, district_id: &str, area_m2: Option<f64>, p: &PolygonFeature, d: &PolygonFeature) -> JoinRow {
        JoinRow {
            plz: plz.to_string(),
            district_id: district_id.to_string(),
            area_m2,
            note: Self::lookup(&self.note, [p, d], |v| v.as_text()),
            einwohner: Self::lookup(&self.einwohner, [p, d], |v| v.as_number()),
            qkm: Self::lookup(&self.qkm, [p, d], |v| v.as_number()),
        }
    }
}

/// Match every postal area against the districts it overlaps.
///
/// Both layers must be in the same (projected) CRS. District candidates come from an
/// R-tree over district bounding boxes; each candidate is then tested exactly.
/// Touching-only pairs and zero-area intersections produce no rows.
pub fn join(
    plz_layer: &FeatureCollection,
    district_layer: &FeatureCollection,
    district_column: &str,
    mode: JoinMode,
) -> Result<Vec<JoinRow>> {
    if plz_layer.crs() != district_layer.crs() {
        return Err(Error::CrsMismatch(plz_layer.crs().code(), district_layer.crs().code()));
    }
    let plz_column = require_column(plz_layer.schema(), PLZ_COLUMN)?;
    if !district_layer.schema().contains(district_column) {
        return Err(Error::MissingColumn {
            column: district_column.to_string(),
            schema: district_layer.schema().names().to_vec(),
        });
    }

    let index = LayerIndex::new(district_layer);
    let pass_through = PassThrough::new(plz_layer, district_layer);
    log::info!(
        "joining {} postal areas with {} districts ({mode} mode, {} indexed)",
        plz_layer.len(), district_layer.len(), index.len()
    );

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for p in plz_layer.features() {
        let Some(plz) = p.get(&plz_column).as_text() else {
            skipped += 1;
            continue;
        };
        let Some(rect) = finite_bounds(&p.geometry) else { continue };

        for j in index.candidates(&rect) {
            let d = &district_layer.features()[j];
            let Some(district_id) = d.get(district_column).as_text() else {
                log::warn!("district feature {j} has no value in `{district_column}`, skipping");
                continue;
            };

            match mode {
                JoinMode::Predicate => {
                    let im = p.geometry.relate(&d.geometry);
                    // Overlap = intersects but not merely touching.
                    if im.is_intersects() && !im.is_touches() {
                        let area = p.area().min(d.area());
                        rows.push(pass_through.row(&plz, &district_id, Some(area), p, d));
                    }
                }
                JoinMode::Overlay => {
                    let overlap = p.geometry.intersection(&d.geometry);
                    for piece in &overlap.0 {
                        let area = piece.unsigned_area();
                        if area > MIN_INTERSECTION_AREA {
                            rows.push(pass_through.row(&plz, &district_id, Some(area), p, d));
                        }
                    }
                }
            }
        }
    }

    if skipped > 0 {
        log::warn!("skipped {skipped} postal areas without a `{plz_column}` value");
    }
    log::info!("join produced {} rows", rows.len());

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;
    use geo::{polygon, MultiPolygon, Polygon};

    use super::*;
    use crate::{crs::Crs, layer::{AttrValue, Schema}};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)]
    }

    fn layer(items: Vec<(Vec<Polygon<f64>>, Vec<(&str, AttrValue)>)>, crs: u32) -> FeatureCollection {
        let mut schema = Schema::default();
        let features = items.into_iter()
            .map(|(polys, attrs)| {
                let attributes: AHashMap<String, AttrValue> = attrs.into_iter()
                    .inspect(|(name, _)| schema.push_unique(name))
                    .map(|(name, value)| (name.to_string(), value))
                    .collect();
                PolygonFeature::new(MultiPolygon(polys), attributes)
            })
            .collect();
        FeatureCollection::new(features, schema, Crs::epsg(crs))
    }

    fn text(s: &str) -> AttrValue { AttrValue::Text(s.into()) }

    fn plz_square() -> FeatureCollection {
        layer(vec![(vec![rect(0., 0., 2000., 2000.)], vec![("plz", text("65183")), ("einwohner", AttrValue::Number(1200.0))])], 25832)
    }

    #[test]
    fn disjoint_polygons_produce_no_rows() {
        let districts = layer(vec![(vec![rect(5000., 0., 6000., 1000.)], vec![("WKR_NR", AttrValue::Number(181.0))])], 25832);
        for mode in [JoinMode::Overlay, JoinMode::Predicate] {
            assert!(join(&plz_square(), &districts, "WKR_NR", mode).unwrap().is_empty());
        }
    }

    #[test]
    fn touching_polygons_produce_no_rows() {
        let districts = layer(vec![(vec![rect(2000., 0., 3000., 2000.)], vec![("WKR_NR", AttrValue::Number(181.0))])], 25832);
        for mode in [JoinMode::Overlay, JoinMode::Predicate] {
            assert!(join(&plz_square(), &districts, "WKR_NR", mode).unwrap().is_empty());
        }
    }

    #[test]
    fn contained_postal_area_has_full_area() {
        let districts = layer(vec![(vec![rect(-1000., -1000., 5000., 5000.)], vec![("WKR_NR", AttrValue::Number(181.0))])], 25832);
        let rows = join(&plz_square(), &districts, "WKR_NR", JoinMode::Overlay).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].plz, "65183");
        assert_eq!(rows[0].district_id, "181");
        assert!((rows[0].area_m2.unwrap() - 4_000_000.0).abs() < 1e-3);
        assert_eq!(rows[0].einwohner, Some(1200.0));
    }

    #[test]
    fn overlay_emits_one_row_per_intersection_piece() {
        // A U-shaped district cuts the square into two disjoint pieces.
        let u_shape = MultiPolygon(vec![rect(-100., -100., 500., 2100.), rect(1500., -100., 2100., 2100.)]);
        let districts = layer(vec![(u_shape.0, vec![("WKNR", text("7"))])], 25832);

        let overlay = join(&plz_square(), &districts, "WKNR", JoinMode::Overlay).unwrap();
        assert_eq!(overlay.len(), 2);
        assert!(overlay.iter().all(|row| row.district_id == "7"));
        let total: f64 = overlay.iter().filter_map(|row| row.area_m2).sum();
        assert!((total - 2_000_000.0).abs() < 1e-3);

        // Predicate mode approximates with the smaller of the two feature areas.
        let predicate = join(&plz_square(), &districts, "WKNR", JoinMode::Predicate).unwrap();
        assert_eq!(predicate.len(), 1);
        assert!((predicate[0].area_m2.unwrap() - 2.0 * 600.0 * 2200.0).abs() < 1e-3);
    }

    #[test]
    fn pass_through_prefers_plz_then_district() {
        let districts = layer(vec![(
            vec![rect(0., 0., 4000., 4000.)],
            vec![("WKR_NR", AttrValue::Number(1.0)), ("note", text("Wiesbaden")), ("einwohner", AttrValue::Number(99.0)), ("qkm", AttrValue::Number(16.0))],
        )], 25832);
        let rows = join(&plz_square(), &districts, "WKR_NR", JoinMode::Overlay).unwrap();

        assert_eq!(rows[0].einwohner, Some(1200.0));
        assert_eq!(rows[0].note.as_deref(), Some("Wiesbaden"));
        assert_eq!(rows[0].qkm, Some(16.0));
    }

    #[test]
    fn rejects_mismatched_crs_and_missing_columns() {
        let districts = layer(vec![(vec![rect(0., 0., 1., 1.)], vec![("WKR_NR", AttrValue::Number(1.0))])], 4326);
        assert!(matches!(join(&plz_square(), &districts, "WKR_NR", JoinMode::Overlay), Err(Error::CrsMismatch(25832, 4326))));

        let districts = layer(vec![(vec![rect(0., 0., 1., 1.)], vec![("WKR_NR", AttrValue::Number(1.0))])], 25832);
        assert!(matches!(join(&plz_square(), &districts, "LWK", JoinMode::Overlay), Err(Error::MissingColumn { .. })));
        assert!(matches!(join(&districts, &districts, "WKR_NR", JoinMode::Overlay), Err(Error::MissingColumn { .. })));
    }

    #[test]
    fn join_mode_parses() {
        assert_eq!("Overlay".parse::<JoinMode>().unwrap(), JoinMode::Overlay);
        assert_eq!("predicate".parse::<JoinMode>().unwrap(), JoinMode::Predicate);
        assert!("nearest".parse::<JoinMode>().is_err());
        assert_eq!(JoinMode::default(), JoinMode::Overlay);
    }
}
