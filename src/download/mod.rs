mod archive;
mod fetch;

use std::{path::{Path, PathBuf}, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

pub use archive::{extract_zip, find_shapefile};
pub use fetch::download_big_file;

/// Site of the federal returning officer, which publishes the district geometries.
pub const BASE_URL: &str = "https://www.bundeswahlleiterin.de/";

/// First Bundestag election whose district geometries are published in the current layout.
pub const FIRST_YEAR: u16 = 2017;

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

static ARCHIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"geometrie_wahlkreise_vg250_(geo_shp|shp_geo)\.zip").expect("valid regex")
});

static ELECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(btw)(\d\d)").expect("valid regex")
});

/// A downloadable district geometry archive for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveLink {
    /// Election kind, e.g. `BTW`.
    pub election: String,
    /// Four-digit election year.
    pub year: String,
    pub url: String,
}

/// Download pages listing the district archives for the Bundestag elections in `first..=last`.
pub fn election_pages(first: u16, last: u16) -> Vec<String> {
    (first..=last)
        .map(|year| format!("{BASE_URL}bundestagswahlen/{year}/wahlkreiseinteilung/downloads.html"))
        .collect()
}

/// Resolve an href against the site root; relative `./` and `../` prefixes are dropped.
fn absolute_url(href: &str, base: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let path = href.trim_start_matches(['.', '/']);
    format!("{}/{path}", base.trim_end_matches('/'))
}

/// Extract the district geometry archive links from a download page.
pub fn scan_archive_links(html: &str, base: &str) -> Vec<ArchiveLink> {
    let mut links: Vec<ArchiveLink> = Vec::new();

    for href in HREF.captures_iter(html).map(|c| c[1].to_string()) {
        if !ARCHIVE.is_match(&href) { continue }
        let Some(election) = ELECTION.captures(&href) else {
            log::debug!("archive link without election tag: {href}");
            continue;
        };
        let link = ArchiveLink {
            election: election[1].to_ascii_uppercase(),
            year: format!("20{}", &election[2]),
            url: absolute_url(&href, base),
        };
        if !links.iter().any(|l| l.url == link.url) {
            links.push(link);
        }
    }

    links
}

/// Fetch every yearly download page in `first..=last` and collect the archive links.
/// Years without a page (not an election year) are skipped.
pub fn discover_archives(first: u16, last: u16) -> Result<Vec<ArchiveLink>> {
    let client = fetch::client()?;
    let mut links = Vec::new();

    for page in election_pages(first, last) {
        let response = client.get(&page).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            log::debug!("no download page at {page}");
            continue;
        }
        let html = response.error_for_status()?.text()?;
        let found = scan_archive_links(&html, BASE_URL);
        log::info!("{page}: {} archive(s)", found.len());
        links.extend(found);
    }

    Ok(links)
}

/// Download an archive into `dest_dir`, extract it and return the path of the contained shapefile.
pub fn fetch_archive(url: &str, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = url.rsplit('/').next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Download(format!("cannot derive a file name from {url}")))?;

    let zip_path = dest_dir.join(file_name);
    let out_dir = dest_dir.join(Path::new(file_name).file_stem().unwrap_or_default());

    log::info!("[download] {url} -> {}", zip_path.display());
    download_big_file(url, &zip_path, true)?;

    log::info!("[extract] {} -> {}", zip_path.display(), out_dir.display());
    extract_zip(&zip_path, &out_dir, true)?;

    find_shapefile(&out_dir)
}
