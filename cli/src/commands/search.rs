use anyhow::{Context, Result};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::SearchArgs) -> Result<()> {
    let df = plz2wk::read_csv(&args.table)
        .with_context(|| format!("failed to read mapping table {}", args.table.display()))?;

    let hits = plz2wk::search(&df, &args.query)?;
    println!("{hits}");

    Ok(())
}
