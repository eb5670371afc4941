use std::{collections::BTreeMap, fs, path::Path};

use ahash::AHashMap;
use geo::{Coord, MultiPolygon};
use shapefile::{dbase::{self, FieldValue}, Reader, Shape};

use crate::{crs::{epsg_from_wkt, Crs}, error::{Error, Result}, layer::{AttrValue, PolygonFeature, Schema}};

use super::polygon::rings_to_geo;

/// Raw contents of a shapefile: polygon features, dropped geometry kinds and the declared CRS.
pub(super) struct ShapefileLayer {
    pub(super) features: Vec<PolygonFeature>,
    pub(super) schema: Schema,
    pub(super) dropped: BTreeMap<&'static str, usize>,
    pub(super) crs: Option<Crs>,
}

/// Convert a dBase value to an attribute value.
fn field_to_attr(value: FieldValue) -> AttrValue {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => AttrValue::Text(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) => AttrValue::Number(n),
        FieldValue::Float(Some(f)) => AttrValue::Number(f as f64),
        FieldValue::Integer(i) => AttrValue::Number(i as f64),
        FieldValue::Currency(c) => AttrValue::Number(c),
        FieldValue::Logical(Some(b)) => AttrValue::Bool(b),
        FieldValue::Date(Some(d)) => AttrValue::Text(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
        _ => AttrValue::Null,
    }
}

/// Name of a shape's geometry kind, for diagnostics.
fn shape_kind(shape: &Shape) -> &'static str {
    match shape {
        Shape::NullShape => "Null",
        Shape::Point(_) | Shape::PointM(_) | Shape::PointZ(_) => "Point",
        Shape::Multipoint(_) | Shape::MultipointM(_) | Shape::MultipointZ(_) => "MultiPoint",
        Shape::Polyline(_) | Shape::PolylineM(_) | Shape::PolylineZ(_) => "Polyline",
        Shape::Polygon(_) | Shape::PolygonM(_) | Shape::PolygonZ(_) => "Polygon",
        Shape::Multipatch(_) => "Multipatch",
    }
}

/// Convert a polygonal shape to a MultiPolygon, or None for any other kind.
fn shape_to_multipolygon(shape: &Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(p) => Some(rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        Shape::PolygonM(p) => Some(rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        Shape::PolygonZ(p) => Some(rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y })),
        _ => None,
    }
}

/// Read the CRS declared by the `.prj` sidecar, if any.
fn crs_from_prj(path: &Path) -> Option<Crs> {
    let prj = path.with_extension("prj");
    let wkt = fs::read_to_string(&prj).ok()?;
    let crs = epsg_from_wkt(&wkt).map(Crs::epsg);
    if crs.is_none() {
        log::warn!("could not identify CRS declared in {}", prj.display());
    }
    crs
}

/// Field names of the `.dbf` sidecar, in column order.
fn read_schema(path: &Path) -> Result<Schema> {
    let dbf = dbase::Reader::from_path(path.with_extension("dbf"))?;
    Ok(Schema::new(dbf.fields().iter()
        .map(|field| field.name().to_string())
        .filter(|name| name != "DeletionFlag"))) // pseudo-field, not a column
}

/// Reads all polygon shapes and attribute records from a given `.shp` file path.
pub(super) fn read_shapefile(path: &Path) -> Result<ShapefileLayer> {
    let mut reader = Reader::from_path(path)
        .map_err(|e| {
            log::debug!("failed to open shapefile {}: {e}", path.display());
            Error::SourceNotFound(path.to_path_buf())
        })?;
    let schema = read_schema(path)?;

    let mut features = Vec::new();
    let mut dropped = BTreeMap::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let Some(geometry) = shape_to_multipolygon(&shape) else {
            *dropped.entry(shape_kind(&shape)).or_default() += 1;
            continue;
        };
        let attributes: AHashMap<String, AttrValue> = record.into_iter()
            .map(|(name, value)| (name, field_to_attr(value)))
            .collect();
        features.push(PolygonFeature::new(geometry, attributes));
    }

    Ok(ShapefileLayer { features, schema, dropped, crs: crs_from_prj(path) })
}

#[cfg(test)]
mod tests {
    use shapefile::{
        dbase::{FieldName, Record, TableWriterBuilder},
        Point, Polygon, PolygonRing, Polyline, Writer,
    };

    use super::*;
    use crate::layer::load;

    const UTM32_PRJ: &str = r#"PROJCS["ETRS89 / UTM zone 32N",GEOGCS["ETRS89",AUTHORITY["EPSG","4258"]],UNIT["metre",1,AUTHORITY["EPSG","9001"]]]"#;

    fn district_table() -> TableWriterBuilder {
        TableWriterBuilder::new()
            .add_numeric_field(FieldName::try_from("WKR_NR").unwrap(), 10, 0)
            .add_character_field(FieldName::try_from("WKR_NAME").unwrap(), 50)
    }

    fn district_record(number: f64, name: &str) -> Record {
        let mut record = Record::default();
        record.insert("WKR_NR".to_string(), FieldValue::Numeric(Some(number)));
        record.insert("WKR_NAME".to_string(), FieldValue::Character(Some(name.to_string())));
        record
    }

    /// Clockwise outer ring, as shapefiles store exteriors.
    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, y),
            Point::new(x, y + size),
            Point::new(x + size, y + size),
            Point::new(x + size, y),
            Point::new(x, y),
        ]))
    }

    #[test]
    fn loads_polygons_schema_and_prj() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wahlkreise.shp");
        let mut writer = Writer::from_path(&path, district_table()).unwrap();
        writer.write_shape_and_record(&square(445_000.0, 5_548_000.0, 1_000.0), &district_record(181.0, "Wiesbaden")).unwrap();
        writer.write_shape_and_record(&square(447_000.0, 5_548_000.0, 2_000.0), &district_record(182.0, "Rheingau-Taunus")).unwrap();
        drop(writer);
        fs::write(path.with_extension("prj"), UTM32_PRJ).unwrap();

        let layer = load(&path).unwrap();

        assert_eq!(layer.schema().names(), &["WKR_NR", "WKR_NAME"]);
        assert_eq!(layer.crs(), Crs::epsg(25832));
        assert_eq!(layer.len(), 2);
        let first = &layer.features()[0];
        assert_eq!(first.get("WKR_NR"), &AttrValue::Number(181.0));
        assert_eq!(first.get("WKR_NAME"), &AttrValue::Text("Wiesbaden".into()));
        assert!((first.area() - 1_000_000.0).abs() < 1e-6);
        assert!((layer.features()[1].area() - 4_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn polyline_only_shapefile_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.shp");
        let mut writer = Writer::from_path(&path, district_table()).unwrap();
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        writer.write_shape_and_record(&line, &district_record(1.0, "Linie")).unwrap();
        drop(writer);

        let layer = read_shapefile(&path).unwrap();
        assert!(layer.features.is_empty());
        assert_eq!(layer.dropped.get("Polyline"), Some(&1));
        assert_eq!(layer.crs, None);

        match load(&path) {
            Err(Error::UnsupportedGeometry { found, .. }) => assert_eq!(found, vec!["Polyline".to_string()]),
            other => panic!("expected UnsupportedGeometry, got {other:?}"),
        }
    }

    #[test]
    fn dbase_values_map_to_attributes() {
        assert_eq!(field_to_attr(FieldValue::Character(Some(" 65183 ".into()))), AttrValue::Text("65183".into()));
        assert_eq!(field_to_attr(FieldValue::Character(None)), AttrValue::Null);
        assert_eq!(field_to_attr(FieldValue::Numeric(Some(12.0))), AttrValue::Number(12.0));
        assert_eq!(field_to_attr(FieldValue::Integer(3)), AttrValue::Number(3.0));
        assert_eq!(field_to_attr(FieldValue::Logical(Some(true))), AttrValue::Bool(true));
    }

    #[test]
    fn missing_shapefile_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.shp");
        assert!(matches!(read_shapefile(&path), Err(Error::SourceNotFound(_))));
    }
}
