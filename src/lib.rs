#![doc = "Postal code to electoral district mapping by polygon overlay"]
mod aggregate;
mod crs;
#[cfg(feature = "download")]
pub mod download;
mod error;
mod join;
mod layer;
mod pipeline;
mod schema;
mod table;

#[doc(inline)]
pub use aggregate::{aggregate, AreaAggregation, MappingRow};

#[doc(inline)]
pub use crs::{reproject, Crs, DEFAULT_TARGET_EPSG};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use join::{join, JoinMode, JoinRow, MIN_INTERSECTION_AREA, PLZ_COLUMN};

#[doc(inline)]
pub use layer::{load, load_with_crs, AttrValue, FeatureCollection, PolygonFeature, Schema};

#[doc(inline)]
pub use pipeline::{run, run_layers, PipelineConfig};

#[doc(inline)]
pub use schema::{default_rules, require_column, resolve_identifier_column, MatchRule};

#[doc(inline)]
pub use polars::frame::DataFrame;

#[doc(inline)]
pub use table::{read_csv, search, write_csv, MappingTable};
