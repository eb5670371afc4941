use anyhow::{Context, Result};
use plz2wk::{AreaAggregation, Crs, JoinMode, MatchRule, PipelineConfig};

use crate::cli::{Area, Mode};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::JoinArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./output.csv".into());

    let mut config = PipelineConfig::new(&args.plz, &args.districts);
    config.target_crs = Crs::epsg(args.epsg);
    config.join_mode = match args.mode {
        Mode::Overlay => JoinMode::Overlay,
        Mode::Predicate => JoinMode::Predicate,
    };
    config.area_aggregation = match args.area {
        Area::Sum => AreaAggregation::Sum,
        Area::Max => AreaAggregation::Max,
    };
    config.district_column = args.column.clone();
    config.extra_rules = args.rules.iter().map(MatchRule::exact)
        .chain(args.prefix_rules.iter().map(MatchRule::prefix))
        .collect();
    config.plz_crs = args.plz_epsg.map(Crs::epsg);
    config.district_crs = args.district_epsg.map(Crs::epsg);

    eprintln!("[join] {} x {}", args.plz.display(), args.districts.display());
    let table = plz2wk::run(&config)
        .with_context(|| format!("failed to map {} onto {}", args.plz.display(), args.districts.display()))?;

    let df = table.to_dataframe(args.header.as_deref())?;
    plz2wk::write_csv(&df, &out_path)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    eprintln!("[join] {} mappings ({}) -> {}", table.len(), table.district_column, out_path.display());

    Ok(())
}
