
mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{fetch, join, search, sources};

/// Log level from the -v count; RUST_LOG still takes precedence.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Join(args) => join::run(&cli, args),
        Commands::Search(args) => search::run(&cli, args),
        Commands::Sources(args) => sources::run(&cli, args),
        Commands::Fetch(args) => fetch::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
