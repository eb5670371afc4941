use anyhow::{Context, Result};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::FetchArgs) -> Result<()> {
    let out_dir = args.output.clone().unwrap_or(".".into());

    eprintln!("[fetch] {} -> {}", args.url, out_dir.display());
    let shapefile = plz2wk::download::fetch_archive(&args.url, &out_dir)
        .with_context(|| format!("failed to fetch {}", args.url))?;

    println!("{}", shapefile.display());

    Ok(())
}
