use std::path::PathBuf;

/// Postal code to electoral district mapping (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "plz2wk", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Map postal areas to the districts they overlap and write a CSV table
    Join(JoinArgs),

    /// Search a mapping table for a postal code, district or note
    Search(SearchArgs),

    /// List downloadable district geometry archives
    Sources(SourcesArgs),

    /// Download and extract a district geometry archive
    Fetch(FetchArgs),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, clap::ValueEnum)]
pub enum Mode { Overlay, Predicate }

#[derive(Copy, Clone, Eq, PartialEq, Debug, clap::ValueEnum)]
pub enum Area { Sum, Max }

#[derive(clap::Args, Debug)]
pub struct JoinArgs {
    /// Postal code polygon layer (.shp or .geojson)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub plz: PathBuf,

    /// Electoral district polygon layer (.shp or .geojson)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub districts: PathBuf,

    /// Output CSV file, defaults to "./output.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Exact overlay (with areas) or intersects predicate
    #[arg(long, value_enum, default_value_t = Mode::Overlay)]
    pub mode: Mode,

    /// How areas of split postal areas are combined
    #[arg(long, value_enum, default_value_t = Area::Sum)]
    pub area: Area,

    /// Shared projected CRS (EPSG code)
    #[arg(long, default_value_t = plz2wk::DEFAULT_TARGET_EPSG)]
    pub epsg: u32,

    /// District identifier column, skipping name resolution
    #[arg(long)]
    pub column: Option<String>,

    /// Header of the district column in the output
    #[arg(long)]
    pub header: Option<String>,

    /// Additional exact column name recognized as district identifier
    #[arg(long = "rule")]
    pub rules: Vec<String>,

    /// Additional column name prefix recognized as district identifier
    #[arg(long = "prefix-rule")]
    pub prefix_rules: Vec<String>,

    /// EPSG code assumed for the postal layer if it declares none
    #[arg(long)]
    pub plz_epsg: Option<u32>,

    /// EPSG code assumed for the district layer if it declares none
    #[arg(long)]
    pub district_epsg: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Mapping table written by `join`
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub table: PathBuf,

    /// Text to look for in any column (case-insensitive)
    pub query: String,
}

#[derive(clap::Args, Debug)]
pub struct SourcesArgs {
    /// First election year to look up
    #[arg(long, default_value_t = plz2wk::download::FIRST_YEAR)]
    pub from: u16,

    /// Last election year to look up, defaults to the current year
    #[arg(long)]
    pub to: Option<u16>,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Archive URL as listed by `sources`
    pub url: String,

    /// Download directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}
