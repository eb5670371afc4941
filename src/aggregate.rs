use std::{fmt, str::FromStr};

use ahash::AHashMap;
use serde::Serialize;

use crate::join::JoinRow;

/// How intersection areas of the same (plz, district) pair are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AreaAggregation {
    #[default]
    Sum,
    Max,
}

impl fmt::Display for AreaAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AreaAggregation::Sum => "sum",
            AreaAggregation::Max => "max",
        })
    }
}

impl FromStr for AreaAggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(AreaAggregation::Sum),
            "max" => Ok(AreaAggregation::Max),
            other => Err(format!("unknown area aggregation `{other}` (expected sum or max)")),
        }
    }
}

/// One deduplicated postal code → district mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingRow {
    pub plz: String,
    pub district_id: String,
    pub note: Option<String>,
    pub einwohner: Option<f64>,
    /// Reference area (km²) carried over from the source attributes.
    pub reference_qkm: Option<f64>,
    /// Overlap area of postal area and district in km².
    pub area_km2: Option<f64>,
}

impl From<MappingRow> for JoinRow {
    fn from(row: MappingRow) -> Self {
        JoinRow {
            plz: row.plz,
            district_id: row.district_id,
            area_m2: row.area_km2.map(|km2| km2 * 1_000_000.0),
            note: row.note,
            einwohner: row.einwohner,
            qkm: row.reference_qkm,
        }
    }
}

/// Keep the first non-null value; log later values that disagree with it.
fn keep_first<T: PartialEq + fmt::Debug>(slot: &mut Option<T>, value: Option<T>, what: &str, key: (&str, &str)) {
    match (slot.as_ref(), value) {
        (None, value) => *slot = value,
        (Some(kept), Some(other)) if *kept != other => {
            log::debug!("plz {} / district {}: conflicting {what} {other:?} ignored, keeping {kept:?}", key.0, key.1);
        }
        _ => {}
    }
}

/// Collapse join rows to one row per (plz, district_id), in first-seen order.
///
/// Pass-through attributes use first-seen-wins: the first non-null value of a group is
/// kept and later conflicting values are ignored. Areas are summed or maximized per `areas`.
pub fn aggregate(rows: impl IntoIterator<Item = JoinRow>, areas: AreaAggregation) -> Vec<MappingRow> {
    let mut groups: AHashMap<(String, String), usize> = AHashMap::new();
    let mut out: Vec<MappingRow> = Vec::new();
    let mut merged = 0usize;

    for row in rows {
        let area_km2 = row.area_km2();
        let key = (row.plz, row.district_id);

        let Some(&i) = groups.get(&key) else {
            groups.insert(key.clone(), out.len());
            out.push(MappingRow {
                plz: key.0,
                district_id: key.1,
                note: row.note,
                einwohner: row.einwohner,
                reference_qkm: row.qkm,
                area_km2,
            });
            continue;
        };

        merged += 1;
        let mapping = &mut out[i];
        let key = (key.0.as_str(), key.1.as_str());
        keep_first(&mut mapping.note, row.note, "note", key);
        keep_first(&mut mapping.einwohner, row.einwohner, "einwohner", key);
        keep_first(&mut mapping.reference_qkm, row.qkm, "qkm", key);

        mapping.area_km2 = match (mapping.area_km2, area_km2) {
            (Some(a), Some(b)) => Some(match areas {
                AreaAggregation::Sum => a + b,
                AreaAggregation::Max => a.max(b),
            }),
            (a, b) => a.or(b),
        };
    }

    log::info!("aggregated into {} mappings ({merged} duplicate rows merged)", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(plz: &str, district: &str, area_m2: Option<f64>, note: Option<&str>) -> JoinRow {
        JoinRow {
            plz: plz.into(),
            district_id: district.into(),
            area_m2,
            note: note.map(Into::into),
            einwohner: Some(100.0),
            qkm: Some(4.0),
        }
    }

    #[test]
    fn groups_by_pair_in_first_seen_order() {
        let rows = vec![
            row("65183", "181", Some(1_000_000.0), None),
            row("01067", "159", Some(500_000.0), None),
            row("65183", "181", Some(250_000.0), None),
            row("65183", "182", Some(10.0), None),
        ];
        let out = aggregate(rows, AreaAggregation::Sum);

        let pairs: Vec<_> = out.iter().map(|m| (m.plz.as_str(), m.district_id.as_str())).collect();
        assert_eq!(pairs, vec![("65183", "181"), ("01067", "159"), ("65183", "182")]);
        assert!((out[0].area_km2.unwrap() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn max_keeps_largest_piece() {
        let rows = vec![row("65183", "181", Some(1_000_000.0), None), row("65183", "181", Some(3_000_000.0), None)];
        let out = aggregate(rows, AreaAggregation::Max);
        assert_eq!(out.len(), 1);
        assert!((out[0].area_km2.unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn first_seen_wins_on_conflict() {
        let rows = vec![
            row("65183", "181", None, None),
            row("65183", "181", None, Some("Wiesbaden")),
            row("65183", "181", None, Some("Mainz")),
        ];
        let out = aggregate(rows, AreaAggregation::Sum);
        assert_eq!(out[0].note.as_deref(), Some("Wiesbaden"));
        assert_eq!(out[0].area_km2, None);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = vec![
            row("65183", "181", Some(1_000_000.0), Some("Wiesbaden")),
            row("65183", "181", Some(1_000_000.0), Some("Mainz")),
            row("65189", "181", Some(2_000_000.0), None),
        ];
        let once = aggregate(rows, AreaAggregation::Sum);
        let twice = aggregate(once.clone().into_iter().map(JoinRow::from), AreaAggregation::Sum);

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!((&a.plz, &a.district_id, &a.note), (&b.plz, &b.district_id, &b.note));
            assert!((a.area_km2.unwrap() - b.area_km2.unwrap()).abs() < 1e-9);
        }
    }
}
