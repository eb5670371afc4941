use std::path::PathBuf;

/// Errors surfaced by the mapping pipeline. None of them are retried internally:
/// each one points at a wrong input file, year or schema.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Input errors
    #[error("no readable vector dataset at `{}`", .0.display())]
    SourceNotFound(PathBuf),
    #[error("unsupported vector format `{}` (expected .shp, .geojson or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("layer `{}` contains no polygon features (found: {})", .path.display(), .found.join(", "))]
    UnsupportedGeometry { path: PathBuf, found: Vec<String> },
    #[error("unknown coordinate reference system: {0}")]
    UnknownCrs(String),
    #[error("EPSG:{0} is geographic; the shared CRS must be projected")]
    GeographicTarget(u32),
    #[error("cannot transform from EPSG:{from} to EPSG:{to}: {reason}")]
    Transformation { from: u32, to: u32, reason: String },
    #[error("layers are in different CRSs (EPSG:{0} and EPSG:{1}); reproject first")]
    CrsMismatch(u32, u32),

    // Schema errors
    #[error("no district identifier column found in schema [{}]", .schema.join(", "))]
    NoMatchingColumn { schema: Vec<String> },
    #[error("column `{column}` not found in schema [{}]", .schema.join(", "))]
    MissingColumn { column: String, schema: Vec<String> },

    // Result errors
    #[error(
        "join of {plz_features} postal areas with {district_features} districts produced no rows; check CRS and election year"
    )]
    EmptyJoinResult { plz_features: usize, district_features: usize },

    #[cfg(feature = "download")]
    #[error("download failed: {0}")]
    Download(String),

    // External errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Shapefile(#[from] shapefile::Error),
    #[error(transparent)]
    Dbase(#[from] shapefile::dbase::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Table(#[from] polars::error::PolarsError),
    #[cfg(feature = "download")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "download")]
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
