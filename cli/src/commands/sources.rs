use anyhow::{Context, Result};
use chrono::Datelike;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::SourcesArgs) -> Result<()> {
    let to = args.to.unwrap_or(chrono::Local::now().year() as u16);

    eprintln!("[sources] looking up elections {}..={to}", args.from);
    let links = plz2wk::download::discover_archives(args.from, to)
        .context("failed to list district archives")?;

    println!("{:<6} {:<6} URL", "Wahl", "Jahr");
    for link in &links {
        println!("{:<6} {:<6} {}", link.election, link.year, link.url);
    }

    Ok(())
}
