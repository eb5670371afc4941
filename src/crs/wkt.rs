use std::sync::LazyLock;

use regex::Regex;

static AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:AUTHORITY|ID)\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?"#).expect("valid regex")
});

static ROOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?i:PROJCS|GEOGCS|PROJCRS|GEOGCRS|GEODCRS)\s*\[\s*"([^"]+)""#).expect("valid regex")
});

/// ESRI and OGC names of the systems German boundary data ships in, normalized
/// to lowercase with separators collapsed to `_`.
const KNOWN_NAMES: &[(&str, u32)] = &[
    ("etrs_1989_utm_zone_32n", 25832),
    ("etrs89_utm_zone_32n", 25832),
    ("etrs_1989_utm_zone_n32", 25832),
    ("etrs_1989_utm_zone_33n", 25833),
    ("etrs89_utm_zone_33n", 25833),
    ("dhdn_3_degree_gauss_kruger_zone_2", 31466),
    ("dhdn_3_degree_gauss_kruger_zone_3", 31467),
    ("dhdn_3_degree_gauss_kruger_zone_4", 31468),
    ("dhdn_gauss_kruger_zone_3", 31467),
    ("etrs_1989_laea", 3035),
    ("etrs89_laea_europe", 3035),
    ("etrs89_extended_laea_europe", 3035),
    ("wgs_1984_web_mercator_auxiliary_sphere", 3857),
    ("wgs_84_pseudo_mercator", 3857),
    ("gcs_wgs_1984", 4326),
    ("wgs_84", 4326),
    ("gcs_etrs_1989", 4258),
    ("etrs89", 4258),
];

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Bracket nesting depth at the end of `prefix`, ignoring quoted names.
fn depth_at(prefix: &str) -> i32 {
    let mut depth = 0;
    let mut quoted = false;
    for c in prefix.chars() {
        match c {
            '"' => quoted = !quoted,
            '[' | '(' if !quoted => depth += 1,
            ']' | ')' if !quoted => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// EPSG authority attached to the root element; inner ones name its datum, units or base CRS.
fn root_authority(wkt: &str) -> Option<u32> {
    AUTHORITY.captures_iter(wkt)
        .filter(|c| c.get(0).is_some_and(|m| depth_at(&wkt[..m.start()]) == 1))
        .last()
        .and_then(|c| c[1].parse().ok())
}

/// Detect the EPSG code declared by a WKT string (as found in a `.prj` file).
/// The root element's authority wins; otherwise the root name is matched against known names.
pub(crate) fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    if let Some(code) = root_authority(wkt) {
        return Some(code);
    }
    let name = normalize(&ROOT_NAME.captures(wkt)?[1]);
    KNOWN_NAMES.iter().find(|(known, _)| *known == name).map(|&(_, code)| code)
}
