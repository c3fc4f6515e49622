//! Read-only path-expression validator (C4).
//!
//! Applied only to the user-facing free-form read path (`/v1/memory/query`
//! in the HTTP surface). Never rewrites an expression — it accepts or
//! rejects, returning enough structure for the HTTP layer to build a
//! `VALIDATION_ERROR` response.

use crate::error::{Error, Result};
use crate::schema::SchemaRegistry;
use std::collections::HashSet;

const ALLOWED_LEADING_KEYWORDS: &[&str] = &[
    "MATCH",
    "OPTIONAL MATCH",
    "WITH",
    "RETURN",
    "ORDER BY",
    "LIMIT",
    "SKIP",
    "WHERE",
    "UNWIND",
    "CALL",
];

const DENIED_KEYWORDS: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "DROP", "ALTER", "CLEAR", "IMPORT",
    "EXPORT",
];

/// A validated expression's outcome. `Accepted` carries nothing further —
/// the caller already has the original expression string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
}

/// Tokenizes on whitespace and the path-expression punctuation that would
/// otherwise glue a keyword to an identifier (e.g. `CREATE(m:Memory)`),
/// then checks each token against the deny list case-insensitively as a
/// whole word.
fn tokenize(expr: &str) -> Vec<String> {
    expr.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Matches `kw` against the leading word(s) of `upper`, requiring a word
/// boundary right after it so `MATCHFOO` doesn't pass as a `MATCH` whose
/// actual leading token isn't in the allow set.
fn starts_with_keyword(upper: &str, kw: &str) -> bool {
    upper.strip_prefix(kw).is_some_and(|rest| {
        rest.chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_')
    })
}

fn leading_keyword(expr: &str) -> Option<String> {
    let trimmed = expr.trim();
    let upper = trimmed.to_uppercase();
    ALLOWED_LEADING_KEYWORDS
        .iter()
        .find(|kw| starts_with_keyword(&upper, kw))
        .map(|kw| kw.to_string())
}

/// Checks the expression against the deny list. Returns the first denied
/// keyword found, preserving its original case for the error message.
fn find_denied_keyword(expr: &str) -> Option<String> {
    let tokens = tokenize(expr);
    for token in &tokens {
        let upper = token.to_uppercase();
        if DENIED_KEYWORDS.contains(&upper.as_str()) {
            return Some(token.clone());
        }
    }
    None
}

/// Extracts candidate node-label / edge-type tokens: identifiers following
/// `:` as in `(n:Label)` or `[r:EDGE_TYPE]`, the only positions a path
/// expression can introduce a schema symbol.
fn schema_symbol_candidates(expr: &str) -> Vec<String> {
    let mut out = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ':' {
            let mut j = i + 1;
            let mut ident = String::new();
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                ident.push(chars[j]);
                j += 1;
            }
            if !ident.is_empty() {
                out.push(ident);
            }
            i = j;
        } else {
            i += 1;
        }
    }
    out
}

/// Bounded edit-distance (≤2) suggestions against the schema's known
/// labels and edge types.
fn suggest(name: &str, registry: &SchemaRegistry) -> Vec<String> {
    let catalogue: HashSet<String> = registry
        .node_labels()
        .into_iter()
        .chain(registry.edge_types())
        .map(str::to_string)
        .collect();
    let mut candidates: Vec<(usize, String)> = catalogue
        .into_iter()
        .map(|candidate| (strsim::levenshtein(name, &candidate), candidate))
        .filter(|(dist, _)| *dist <= 2)
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    candidates.into_iter().map(|(_, name)| name).collect()
}

/// Validates `expr` against the allow/deny keyword policy and the schema.
/// Parameter placeholders (`$p0`, …) are ignored.
pub fn validate_read_only(expr: &str, registry: &SchemaRegistry) -> Result<ValidationOutcome> {
    match leading_keyword(expr) {
        Some(_) => {}
        None => {
            return Err(Error::ReadOnlyViolation(format!(
                "expression must begin with one of {ALLOWED_LEADING_KEYWORDS:?}"
            )))
        }
    }

    if let Some(keyword) = find_denied_keyword(expr) {
        return Err(Error::ReadOnlyViolation(keyword));
    }

    let known: HashSet<&str> = registry
        .node_labels()
        .into_iter()
        .chain(registry.edge_types())
        .collect();
    for candidate in schema_symbol_candidates(expr) {
        if !known.contains(candidate.as_str()) {
            return Err(Error::UnknownSymbol {
                suggestions: suggest(&candidate, registry),
                name: candidate,
            });
        }
    }

    Ok(ValidationOutcome::Accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalogue;

    fn registry() -> SchemaRegistry {
        catalogue::build().unwrap()
    }

    #[test]
    fn every_deny_keyword_whole_word_is_rejected() {
        let reg = registry();
        for kw in DENIED_KEYWORDS {
            let expr = format!("MATCH (m:Memory) {kw} m");
            let err = validate_read_only(&expr, &reg).unwrap_err();
            assert!(matches!(err, Error::ReadOnlyViolation(_)), "{kw} was accepted");
        }
    }

    #[test]
    fn deny_keyword_as_substring_of_identifier_is_not_flagged() {
        // "SETUP" contains "SET" but is a single token, not the word SET.
        let reg = registry();
        let expr = "MATCH (m:Memory {name: $p0}) RETURN m AS SETUP";
        assert!(validate_read_only(expr, &reg).is_ok());
    }

    #[test]
    fn every_allow_leading_keyword_is_accepted() {
        let reg = registry();
        for kw in ALLOWED_LEADING_KEYWORDS {
            let expr = format!("{kw}");
            assert!(validate_read_only(&expr, &reg).is_ok(), "{kw} was rejected");
        }
    }

    #[test]
    fn unsupported_leading_keyword_is_rejected() {
        let reg = registry();
        assert!(validate_read_only("EXPLAIN MATCH (m:Memory) RETURN m", &reg).is_err());
    }

    #[test]
    fn leading_keyword_prefix_without_word_boundary_is_rejected() {
        // "MATCHFOO" starts with the characters "MATCH" but isn't the
        // keyword MATCH — it must not pass the leading-keyword gate.
        let reg = registry();
        let err = validate_read_only("MATCHFOO (n:Memory) RETURN n", &reg).unwrap_err();
        assert!(matches!(err, Error::ReadOnlyViolation(_)));
    }

    #[test]
    fn unknown_label_yields_suggestion_within_edit_distance_two() {
        let reg = registry();
        let err = validate_read_only("MATCH (m:Memroy) RETURN m", &reg).unwrap_err();
        match err {
            Error::UnknownSymbol { name, suggestions } => {
                assert_eq!(name, "Memroy");
                assert!(suggestions.contains(&"Memory".to_string()));
            }
            other => panic!("expected UnknownSymbol, got {other:?}"),
        }
    }

    #[test]
    fn known_labels_and_edge_types_pass() {
        let reg = registry();
        let expr = "MATCH (m:Memory)-[r:MENTIONS]->(e:Entity) RETURN m, e";
        assert!(validate_read_only(expr, &reg).is_ok());
    }

    #[test]
    fn parameter_placeholders_are_ignored() {
        let reg = registry();
        let expr = "MATCH (m:Memory {content_hash: $p0}) RETURN m";
        assert!(validate_read_only(expr, &reg).is_ok());
    }

    #[test]
    fn write_attempt_from_s4_scenario_is_rejected() {
        let reg = registry();
        let expr = "CREATE (m:Memory {content:'x'}) RETURN m";
        let err = validate_read_only(expr, &reg).unwrap_err();
        assert!(matches!(err, Error::ReadOnlyViolation(_)));
    }
}
