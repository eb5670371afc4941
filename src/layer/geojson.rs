use std::collections::BTreeMap;

use ahash::AHashMap;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use crate::{crs::Crs, error::{Error, Result}, layer::{AttrValue, PolygonFeature, Schema}};

/// Parsed contents of a GeoJSON FeatureCollection.
pub(super) struct GeoJsonLayer {
    pub(super) features: Vec<PolygonFeature>,
    pub(super) schema: Schema,
    pub(super) dropped: BTreeMap<String, usize>,
    pub(super) crs: Option<Crs>,
    /// WGS 84 when the document has no `crs` member at all.
    pub(super) implied_crs: Option<Crs>,
}

fn value_to_attr(value: &Value) -> AttrValue {
    match value {
        Value::Null => AttrValue::Null,
        Value::Bool(b) => AttrValue::Bool(*b),
        Value::Number(n) => n.as_f64().map(AttrValue::Number).unwrap_or(AttrValue::Null),
        Value::String(s) => AttrValue::Text(s.clone()),
        other => AttrValue::Text(other.to_string()),
    }
}

/// Parse a ring (exterior or interior) from GeoJSON coordinates: [[x, y], [x, y], ...]
fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let invalid = |what: &str| Error::Json(serde::de::Error::custom(format!("invalid polygon ring: {what}")));

    let mut points = value.as_array().ok_or_else(|| invalid("not an array"))?
        .iter()
        .map(|pair| {
            let x = pair.get(0).and_then(Value::as_f64).ok_or_else(|| invalid("x must be a number"))?;
            let y = pair.get(1).and_then(Value::as_f64).ok_or_else(|| invalid("y must be a number"))?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>>>()?;

    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first) }
    }
    Ok(LineString(points))
}

/// Parse Polygon coordinates: [exterior, hole, hole, ...]
fn parse_polygon(value: &Value) -> Result<Option<Polygon<f64>>> {
    let rings = value.as_array().map(Vec::as_slice).unwrap_or_default();
    let Some((exterior, holes)) = rings.split_first() else { return Ok(None) };
    Ok(Some(Polygon::new(
        parse_ring(exterior)?,
        holes.iter().map(parse_ring).collect::<Result<Vec<_>>>()?,
    )))
}

/// Convert a GeoJSON geometry object to a MultiPolygon, or Err(kind) when it is not polygonal.
fn parse_geometry(geometry: &Value) -> Result<Result<MultiPolygon<f64>, String>> {
    let kind = geometry["type"].as_str().unwrap_or("Null");
    let coords = &geometry["coordinates"];
    let mp = match kind {
        "Polygon" => MultiPolygon(parse_polygon(coords)?.into_iter().collect()),
        "MultiPolygon" => MultiPolygon(
            coords.as_array().map(Vec::as_slice).unwrap_or_default().iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?
                .into_iter().flatten().collect()
        ),
        other => return Ok(Err(other.to_string())),
    };
    Ok(Ok(mp))
}

/// Read the legacy `crs` member.
fn declared_crs(root: &Value) -> Option<Crs> {
    let name = root["crs"]["properties"]["name"].as_str()?;
    match name.parse::<Crs>() {
        Ok(crs) => Some(crs),
        // e.g. urn:ogc:def:crs:OGC:1.3:CRS84
        Err(_) if name.ends_with("CRS84") => Some(Crs::epsg(4326)),
        Err(_) => None,
    }
}

/// RFC 7946 coordinates are WGS 84 unless a legacy `crs` member says otherwise.
fn implied_crs(root: &Value) -> Option<Crs> {
    root.get("crs").is_none().then_some(Crs::epsg(4326))
}

/// Read polygon features from GeoJSON bytes (a FeatureCollection, a single Feature or a bare geometry).
pub(super) fn read_geojson_bytes(bytes: &[u8]) -> Result<GeoJsonLayer> {
    let root: Value = serde_json::from_slice(bytes)?;

    let items: Vec<(&Value, Option<&serde_json::Map<String, Value>>)> = match root["type"].as_str() {
        Some("FeatureCollection") => root["features"].as_array().map(Vec::as_slice).unwrap_or_default().iter()
            .map(|f| (&f["geometry"], f["properties"].as_object()))
            .collect(),
        Some("Feature") => vec![(&root["geometry"], root["properties"].as_object())],
        _ => vec![(&root, None)],
    };

    let mut features = Vec::with_capacity(items.len());
    let mut schema = Schema::default();
    let mut dropped = BTreeMap::new();

    for (geometry, properties) in items {
        let geometry = match parse_geometry(geometry)? {
            Ok(mp) => mp,
            Err(kind) => {
                *dropped.entry(kind).or_default() += 1;
                continue;
            }
        };

        let mut attributes = AHashMap::new();
        for (name, value) in properties.into_iter().flatten() {
            schema.push_unique(name);
            attributes.insert(name.clone(), value_to_attr(value));
        }
        features.push(PolygonFeature::new(geometry, attributes));
    }

    Ok(GeoJsonLayer { features, schema, dropped, crs: declared_crs(&root), implied_crs: implied_crs(&root) })
}
