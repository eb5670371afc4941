use std::fmt;

use crate::{error::{Error, Result}, layer::Schema};

/// A case-insensitive rule for recognizing the district identifier column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// The column name equals this name.
    Exact(String),
    /// The column name starts with this prefix.
    Prefix(String),
}

impl MatchRule {
    pub fn exact(name: impl Into<String>) -> Self { MatchRule::Exact(name.into()) }

    pub fn prefix(prefix: impl Into<String>) -> Self { MatchRule::Prefix(prefix.into()) }

    /// Check whether `column` satisfies this rule, ignoring case.
    pub fn matches(&self, column: &str) -> bool {
        let column = column.to_lowercase();
        match self {
            MatchRule::Exact(name) => column == name.to_lowercase(),
            MatchRule::Prefix(prefix) => column.starts_with(&prefix.to_lowercase()),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Exact(name) => write!(f, "= {name}"),
            MatchRule::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

/// Aliases seen for the district number across yearly district layers, followed by the `wk` prefix.
pub fn default_rules() -> Vec<MatchRule> {
    ["wknr", "wkr_nr", "nummer", "wahlkreis", "wkr"].into_iter()
        .map(MatchRule::exact)
        .chain([MatchRule::prefix("wk")])
        .collect()
}

/// Resolve which column of `schema` identifies the district.
///
/// Every column satisfying at least one rule is a candidate; the first candidate in
/// schema column order wins. Fails with [`Error::NoMatchingColumn`] listing the whole
/// schema when nothing matches.
pub fn resolve_identifier_column(schema: &Schema, rules: &[MatchRule]) -> Result<String> {
    let column = schema.names().iter()
        .find(|column| rules.iter().any(|rule| rule.matches(column)))
        .cloned()
        .ok_or_else(|| Error::NoMatchingColumn { schema: schema.to_vec() })?;

    log::debug!("resolved district identifier column `{column}`");
    Ok(column)
}

/// Use an explicitly named column, which must exist in the schema (case-insensitive).
pub fn require_column(schema: &Schema, column: &str) -> Result<String> {
    schema.find_ignore_case(column)
        .map(str::to_string)
        .ok_or_else(|| Error::MissingColumn { column: column.to_string(), schema: schema.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_wkr_nr() {
        let schema = Schema::new(["plz", "WKR_NR", "note"]);
        assert_eq!(resolve_identifier_column(&schema, &default_rules()).unwrap(), "WKR_NR");
    }

    #[test]
    fn no_match_reports_full_schema() {
        let schema = Schema::new(["plz", "note"]);
        match resolve_identifier_column(&schema, &default_rules()) {
            Err(Error::NoMatchingColumn { schema }) => assert_eq!(schema, vec!["plz", "note"]),
            other => panic!("expected NoMatchingColumn, got {other:?}"),
        }
    }

    #[test]
    fn first_match_in_schema_order_wins() {
        // WKR_NAME matches the prefix before the exact alias WKR_NR appears
        let schema = Schema::new(["LAND_NR", "WKR_NAME", "WKR_NR"]);
        assert_eq!(resolve_identifier_column(&schema, &default_rules()).unwrap(), "WKR_NAME");

        let schema = Schema::new(["Nummer", "Wahlkreis"]);
        assert_eq!(resolve_identifier_column(&schema, &default_rules()).unwrap(), "Nummer");
    }

    #[test]
    fn extra_rules_recognize_state_layers() {
        let schema = Schema::new(["LWK", "LWK_NAME", "qkm"]);
        assert!(resolve_identifier_column(&schema, &default_rules()).is_err());

        let mut rules = default_rules();
        rules.push(MatchRule::exact("lwk"));
        assert_eq!(resolve_identifier_column(&schema, &rules).unwrap(), "LWK");
    }

    #[test]
    fn explicit_column_must_exist() {
        let schema = Schema::new(["plz", "WKR_NR"]);
        assert_eq!(require_column(&schema, "wkr_nr").unwrap(), "WKR_NR");
        assert!(matches!(require_column(&schema, "lwk"), Err(Error::MissingColumn { .. })));
    }
}
