//! Query-string helpers shared by the entity controllers.

use std::collections::HashMap;

use devsync_core::filter::{Scalar, Where};
use devsync_core::pagination::parse_page;
use devsync_core::types::DbId;
use serde_json::Value;

/// Raw query parameters as extracted by `Query<HashMap<String, String>>`.
pub type Params = HashMap<String, String>;

/// Requested 1-indexed page; anything unusable means page 1.
pub fn page(params: &Params) -> i64 {
    parse_page(params.get("page").map(String::as_str))
}

/// The `sortBy=field[:dir]` parameter, if present.
pub fn sort_by(params: &Params) -> Option<&str> {
    params.get("sortBy").map(String::as_str)
}

/// Split a comma-separated list into scalars, skipping blank items.
pub fn scalar_list(raw: &str) -> Vec<Scalar> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(Scalar::from_param)
        .collect()
}

/// `field = value` when the parameter is present.
pub fn eq(params: &Params, field: &str) -> Option<Where> {
    params
        .get(field)
        .map(|raw| Where::eq(field, Scalar::from_param(raw)))
}

/// `field IN (..)` from a comma list when the parameter is present.
pub fn one_of(params: &Params, field: &str, column: &str) -> Option<Where> {
    params
        .get(field)
        .map(|raw| Where::is_in(column, scalar_list(raw)))
}

/// Integer ids from a body value: a comma-separated string, an array of
/// numbers or numeric strings, or a single number. Unparsable items are
/// skipped.
pub fn ids_from_value(value: &Value) -> Vec<DbId> {
    match value {
        Value::String(s) => s
            .split(',')
            .filter_map(|item| item.trim().parse().ok())
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        Value::Number(n) => n.as_i64().into_iter().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn comma_lists_become_in_predicates() {
        let p = params(&[("id", "1, 2,,x")]);
        let w = one_of(&p, "id", "id").unwrap();
        assert_eq!(w.to_string(), "id IN (1, 2, \"x\")");
        assert!(one_of(&p, "categories", "categories").is_none());
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(page(&params(&[])), 1);
        assert_eq!(page(&params(&[("page", "0")])), 1);
        assert_eq!(page(&params(&[("page", "3")])), 3);
    }

    #[test]
    fn body_ids_accept_strings_and_arrays() {
        assert_eq!(ids_from_value(&json!("3,1, x")), vec![3, 1]);
        assert_eq!(ids_from_value(&json!([2, "4", null])), vec![2, 4]);
        assert_eq!(ids_from_value(&json!(7)), vec![7]);
        assert!(ids_from_value(&json!({})).is_empty());
    }
}
