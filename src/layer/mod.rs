mod geojson;
mod reader;
mod polygon;
mod shp;

use std::fmt;

use ahash::AHashMap;
use geo::{Area, MultiPolygon};

use crate::crs::Crs;

pub use reader::{load, load_with_crs};

/// A single attribute value read from a vector source.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl AttrValue {
    #[inline] pub fn is_null(&self) -> bool { matches!(self, AttrValue::Null) }

    /// Render the value as text; numbers that are integral drop their fraction.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttrValue::Null => None,
            AttrValue::Text(s) => Some(s.clone()),
            AttrValue::Number(n) => Some(format_number(*n)),
            AttrValue::Bool(b) => Some(b.to_string()),
        }
    }

    /// Interpret the value as a number, parsing text if needed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().replace(',', ".").parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(s) => f.write_str(&s),
            None => f.write_str(""),
        }
    }
}

/// Format a number without a trailing `.0` when it is integral (e.g. district numbers).
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Ordered attribute names of a layer, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema(Vec<String>);

impl Schema {
    pub fn new<I, S>(names: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> {
        Self(names.into_iter().map(Into::into).collect())
    }

    #[inline] pub fn names(&self) -> &[String] { &self.0 }

    #[inline] pub fn len(&self) -> usize { self.0.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.0.is_empty() }

    #[inline] pub fn contains(&self, name: &str) -> bool { self.0.iter().any(|n| n == name) }

    /// Find the first column whose name equals `name` ignoring ASCII case.
    pub fn find_ignore_case(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|n| n.eq_ignore_ascii_case(name)).map(String::as_str)
    }

    /// Append a name if it is not already present.
    pub(crate) fn push_unique(&mut self, name: &str) {
        if !self.contains(name) { self.0.push(name.to_string()) }
    }

    pub(crate) fn to_vec(&self) -> Vec<String> { self.0.clone() }
}

/// One polygon feature and its attributes.
#[derive(Debug, Clone)]
pub struct PolygonFeature {
    pub geometry: MultiPolygon<f64>,
    pub attributes: AHashMap<String, AttrValue>,
}

impl PolygonFeature {
    pub fn new(geometry: MultiPolygon<f64>, attributes: AHashMap<String, AttrValue>) -> Self {
        Self { geometry, attributes }
    }

    /// Get an attribute value, treating missing attributes as null.
    #[inline]
    pub fn get(&self, name: &str) -> &AttrValue {
        self.attributes.get(name).unwrap_or(&AttrValue::Null)
    }

    /// Planar area in the collection's CRS units squared.
    #[inline] pub fn area(&self) -> f64 { self.geometry.unsigned_area() }
}

/// Polygon features sharing one CRS and one attribute schema.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    features: Vec<PolygonFeature>,
    schema: Schema,
    crs: Crs,
}

impl FeatureCollection {
    pub fn new(features: Vec<PolygonFeature>, schema: Schema, crs: Crs) -> Self {
        Self { features, schema, crs }
    }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    #[inline] pub fn features(&self) -> &[PolygonFeature] { &self.features }

    #[inline] pub fn schema(&self) -> &Schema { &self.schema }

    #[inline] pub fn crs(&self) -> Crs { self.crs }

    /// Build a new collection with transformed geometries and the same attributes.
    pub(crate) fn with_geometries(&self, geometries: Vec<MultiPolygon<f64>>, crs: Crs) -> Self {
        let features = self.features.iter().zip(geometries)
            .map(|(feature, geometry)| PolygonFeature::new(geometry, feature.attributes.clone()))
            .collect();
        Self { features, schema: self.schema.clone(), crs }
    }
}
