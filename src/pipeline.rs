use std::path::PathBuf;

use crate::{
    aggregate::{aggregate, AreaAggregation},
    crs::{reproject, Crs},
    error::{Error, Result},
    join::{join, JoinMode},
    layer::{load_with_crs, FeatureCollection},
    schema::{default_rules, require_column, resolve_identifier_column, MatchRule},
    table::MappingTable,
};

/// Inputs and options of one mapping run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Postal-code polygon layer (.shp or GeoJSON).
    pub plz_source: PathBuf,
    /// Electoral district polygon layer (.shp or GeoJSON).
    pub district_source: PathBuf,
    /// Shared projected CRS both layers are reprojected into.
    pub target_crs: Crs,
    pub join_mode: JoinMode,
    pub area_aggregation: AreaAggregation,
    /// Use this district column instead of resolving it by name.
    pub district_column: Option<String>,
    /// Rules tried in addition to the built-in district column aliases.
    pub extra_rules: Vec<MatchRule>,
    /// CRS assumed for a layer that declares none.
    pub plz_crs: Option<Crs>,
    pub district_crs: Option<Crs>,
}

impl PipelineConfig {
    pub fn new(plz_source: impl Into<PathBuf>, district_source: impl Into<PathBuf>) -> Self {
        Self {
            plz_source: plz_source.into(),
            district_source: district_source.into(),
            target_crs: Crs::default(),
            join_mode: JoinMode::default(),
            area_aggregation: AreaAggregation::default(),
            district_column: None,
            extra_rules: Vec::new(),
            plz_crs: None,
            district_crs: None,
        }
    }

    /// Built-in aliases followed by the configured extra rules.
    pub fn rules(&self) -> Vec<MatchRule> {
        default_rules().into_iter().chain(self.extra_rules.iter().cloned()).collect()
    }
}

/// Load both layers from disk and run the mapping.
pub fn run(config: &PipelineConfig) -> Result<MappingTable> {
    log::info!("processing geodata: {} x {}", config.plz_source.display(), config.district_source.display());
    let plz = load_with_crs(&config.plz_source, config.plz_crs)?;
    let districts = load_with_crs(&config.district_source, config.district_crs)?;
    run_layers(&plz, &districts, config)
}

/// Reproject, resolve the district column, join and aggregate two in-memory layers.
///
/// Fails with [`Error::EmptyJoinResult`] when no postal area overlaps any district,
/// which usually means a CRS or data mismatch rather than a legitimately empty answer.
pub fn run_layers(plz: &FeatureCollection, districts: &FeatureCollection, config: &PipelineConfig) -> Result<MappingTable> {
    let target = config.target_crs;
    if target.is_geographic()? {
        return Err(Error::GeographicTarget(target.code()));
    }

    let plz = reproject(plz, target)?;
    let districts = reproject(districts, target)?;

    let district_column = match &config.district_column {
        Some(column) => require_column(districts.schema(), column)?,
        None => resolve_identifier_column(districts.schema(), &config.rules())?,
    };
    log::info!("district identifier column: {district_column}");

    let rows = join(&plz, &districts, &district_column, config.join_mode)?;
    if rows.is_empty() {
        return Err(Error::EmptyJoinResult { plz_features: plz.len(), district_features: districts.len() });
    }

    Ok(MappingTable { district_column, rows: aggregate(rows, config.area_aggregation) })
}
