//! Static entity type descriptors.
//!
//! A descriptor is the immutable, shared description of one storable kind:
//! its table, declared columns with their kinds, the owner column, schema
//! defaults and computed fields. Each entity module exposes one as a
//! `static`.

use devsync_core::filter::{Filter, FilterNode, FilterValue, Scalar, Where};
use devsync_core::types::parse_timestamp;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::StoreError;
use crate::module::Module;
use crate::record::{Computed, Record};
use crate::statement::Param;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Storage kind of a declared column. Written values and filter literals
/// are coerced to it before reaching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Bool,
    Text,
    Timestamp,
}

impl FieldKind {
    /// Coerce a JSON value into a bindable parameter of this kind.
    pub fn to_param(self, field: &str, value: &Value) -> Result<Param, StoreError> {
        if value.is_null() {
            return Ok(Param::Null);
        }
        let scalar = match self {
            FieldKind::Int => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .map(Scalar::Int),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Scalar::Int),
                Value::Bool(b) => Some(Scalar::Int(i64::from(*b))),
                _ => None,
            },
            FieldKind::Bool => match value {
                Value::Bool(b) => Some(Scalar::Bool(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(Scalar::Bool(false)),
                    Some(1) => Some(Scalar::Bool(true)),
                    _ => None,
                },
                Value::String(s) => match s.trim() {
                    "true" | "1" => Some(Scalar::Bool(true)),
                    "false" | "0" => Some(Scalar::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldKind::Text => match value {
                Value::String(s) => Some(Scalar::Text(s.clone())),
                Value::Number(n) => Some(Scalar::Text(n.to_string())),
                Value::Bool(b) => Some(Scalar::Text(b.to_string())),
                _ => None,
            },
            FieldKind::Timestamp => match value {
                Value::String(s) => parse_timestamp(s).map(Scalar::Timestamp),
                _ => None,
            },
        };
        scalar
            .map(Param::Scalar)
            .ok_or_else(|| StoreError::invalid_value(field, format!("expected {self:?}")))
    }

    /// Coerce a filter literal. `None` means the literal can never equal a
    /// value of this kind.
    pub fn coerce_scalar(self, scalar: &Scalar) -> Option<Scalar> {
        match (self, scalar) {
            (FieldKind::Timestamp, Scalar::Timestamp(_)) => Some(scalar.clone()),
            _ => match self.to_param("", &scalar.to_json()) {
                Ok(Param::Scalar(s)) => Some(s),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn int(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Int }
    }

    pub const fn bool(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Bool }
    }

    pub const fn text(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Text }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Timestamp }
    }
}

/// Column default applied by the schema when an insert omits the column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Bool(bool),
    Text(&'static str),
    Now,
}

impl DefaultValue {
    pub fn to_json(self) -> Value {
        match self {
            DefaultValue::Int(i) => Value::from(i),
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Text(s) => Value::from(s),
            DefaultValue::Now => Value::from(chrono::Utc::now().to_rfc3339()),
        }
    }
}

// ---------------------------------------------------------------------------
// Computed fields
// ---------------------------------------------------------------------------

/// Resolves one computed field for a hydrated record. May query other
/// entity types through the record's store handle.
pub type Resolver = for<'a> fn(&'a Record) -> BoxFuture<'a, Result<Computed, StoreError>>;

#[derive(Clone, Copy)]
pub struct ComputedField {
    pub name: &'static str,
    pub resolve: Resolver,
}

impl std::fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputedField").field("name", &self.name).finish()
    }
}

/// Rewrites entity-specific pseudo-fields of a filter into predicates on
/// real columns before the filter reaches the store.
pub type FilterRewriter =
    for<'a> fn(&'a Module, Filter) -> BoxFuture<'a, Result<Filter, StoreError>>;

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Owner column used when an entity type does not override it.
pub const DEFAULT_CREATED_BY_FIELD: &str = "createdById";

pub struct EntityDescriptor {
    /// Singular name used in error messages.
    pub name: &'static str,
    pub table: &'static str,
    /// Declared columns in projection order. `id` comes first.
    pub fields: &'static [FieldDef],
    pub created_by_field: &'static str,
    /// Declared fields never rendered externally.
    pub hidden: &'static [&'static str],
    pub defaults: &'static [(&'static str, DefaultValue)],
    pub computed: &'static [ComputedField],
    pub rewrite_filter: Option<FilterRewriter>,
}

impl std::fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("computed", &self.computed)
            .finish_non_exhaustive()
    }
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Whether rows of this type record their creator.
    pub fn tracks_creator(&self) -> bool {
        self.has_field(self.created_by_field)
    }

    /// Declared fields minus hidden ones, followed by computed field names.
    pub fn visible_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.name)
            .filter(|name| !self.hidden.contains(name))
            .chain(self.computed.iter().map(|c| c.name))
            .map(str::to_string)
            .collect()
    }

    /// Coerce a written value to the declared kind of `field`.
    pub fn to_param(&self, field: &str, value: &Value) -> Result<Param, StoreError> {
        match self.field(field) {
            Some(def) => def.kind.to_param(field, value),
            None => Err(StoreError::invalid_value(field, "not a declared field")),
        }
    }

    /// Coerce every literal of `filter` to the kind of the column it tests.
    ///
    /// A literal that cannot be coerced can never match, so its predicate
    /// becomes never-match (or the item is dropped from an `IN` list).
    /// Predicates on undeclared fields pass through untouched.
    pub fn coerce_filter(&self, mut filter: Filter) -> Filter {
        for node in filter.nodes_mut() {
            match node {
                FilterNode::Where(w) => self.coerce_where(w),
                FilterNode::AnyOf(group) => group.iter_mut().for_each(|w| self.coerce_where(w)),
            }
        }
        filter
    }

    fn coerce_where(&self, w: &mut Where) {
        let Some(def) = self.field(&w.field) else {
            return;
        };
        let coerced = match &w.value {
            FilterValue::Scalar(s) => match def.kind.coerce_scalar(s) {
                Some(c) => FilterValue::Scalar(c),
                None => FilterValue::Unbound,
            },
            FilterValue::List(items) => {
                FilterValue::List(items.iter().filter_map(|s| def.kind.coerce_scalar(s)).collect())
            }
            FilterValue::Null | FilterValue::Unbound => return,
        };
        w.value = coerced;
    }
}

#[cfg(test)]
mod tests {
    use devsync_core::filter::Operator;
    use serde_json::json;

    use super::*;

    static THING: EntityDescriptor = EntityDescriptor {
        name: "thing",
        table: "things",
        fields: &[
            FieldDef::int("id"),
            FieldDef::text("title"),
            FieldDef::bool("isTop"),
            FieldDef::timestamp("createdAt"),
            FieldDef::text("secret"),
        ],
        created_by_field: DEFAULT_CREATED_BY_FIELD,
        hidden: &["secret"],
        defaults: &[],
        computed: &[],
        rewrite_filter: None,
    };

    #[test]
    fn values_coerce_to_declared_kind() {
        assert_eq!(
            THING.to_param("id", &json!("12")).unwrap(),
            Param::Scalar(Scalar::Int(12))
        );
        assert_eq!(
            THING.to_param("isTop", &json!(1)).unwrap(),
            Param::Scalar(Scalar::Bool(true))
        );
        assert_eq!(THING.to_param("title", &json!(null)).unwrap(), Param::Null);
        assert!(THING.to_param("id", &json!("twelve")).is_err());
        assert!(THING.to_param("createdAt", &json!("soon")).is_err());
        assert!(THING.to_param("nope", &json!(1)).is_err());
    }

    #[test]
    fn filter_literals_coerce_or_become_never_match() {
        let filter = Filter::new()
            .and(Where::eq("id", "7"))
            .and(Where::eq("isTop", "1"))
            .and(Where::eq("id", "abc"))
            .and(Where::new("createdAt", Operator::Gte, "2024-01-01"));
        let coerced = THING.coerce_filter(filter);
        let values: Vec<&FilterValue> = coerced.predicates().map(|w| &w.value).collect();
        assert_eq!(values[0], &FilterValue::Scalar(Scalar::Int(7)));
        assert_eq!(values[1], &FilterValue::Scalar(Scalar::Bool(true)));
        assert_eq!(values[2], &FilterValue::Unbound);
        assert!(matches!(values[3], FilterValue::Scalar(Scalar::Timestamp(_))));
    }

    #[test]
    fn in_lists_drop_uncoercible_items() {
        let filter = THING.coerce_filter(Filter::from(Where::is_in("id", vec!["1", "x", "3"])));
        assert_eq!(filter.to_string(), "id IN (1, 3)");
    }

    #[test]
    fn undeclared_fields_pass_through() {
        let filter = THING.coerce_filter(Filter::from(Where::eq("categories", "1,2")));
        assert_eq!(filter.to_string(), "categories = \"1,2\"");
    }

    #[test]
    fn hidden_fields_are_not_visible() {
        assert_eq!(THING.visible_fields(), vec!["id", "title", "isTop", "createdAt"]);
    }
}
