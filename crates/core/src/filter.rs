//! Filter expression tree.
//!
//! A [`Filter`] is an AND chain of [`FilterNode`]s. Each node is either a
//! single predicate ([`Where`]) or a parenthesized OR group of predicates.
//! Rendering never re-orders nodes: the AND/OR precedence is exactly the
//! nesting shape that was built.
//!
//! Two renderings exist:
//!
//! - [`std::fmt::Display`] produces the literal form used in logs and tests
//!   (`createdById = 5 AND (status = "active" OR isTop = 1)`).
//! - [`Filter::to_sql`] produces the statement form with positional `$n`
//!   placeholders and a separate parameter list. Values never enter the
//!   statement text, except the `NULL` keyword and the never-match marker.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Is,
    IsNot,
    Like,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::Like => "LIKE",
        }
    }

    /// Parse an operator from its textual form (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let op = match s.trim().to_ascii_uppercase().as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::NotEq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "IS" => Operator::Is,
            "IS NOT" => Operator::IsNot,
            "LIKE" => Operator::Like,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single bindable literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Timestamp(Timestamp),
}

impl Scalar {
    /// Convert a JSON value into a scalar. Arrays, objects and null have no
    /// scalar form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Interpret free text coming from a query string: integers become
    /// [`Scalar::Int`], everything else stays text.
    pub fn from_param(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(i) => Scalar::Int(i),
            Err(_) => Scalar::Text(trimmed.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Int(i) => Value::from(*i),
            Scalar::Float(f) => Value::from(*f),
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Timestamp(t) => Value::String(t.to_rfc3339()),
        }
    }

    /// Literal form: integers unquoted, everything else double-quoted.
    fn write_literal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "\"{v}\""),
            Scalar::Bool(b) => write!(f, "\"{b}\""),
            Scalar::Text(s) => write!(f, "\"{s}\""),
            Scalar::Timestamp(t) => write!(f, "\"{}\"", t.to_rfc3339()),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(i64::from(v))
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<Timestamp> for Scalar {
    fn from(v: Timestamp) -> Self {
        Scalar::Timestamp(v)
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Scalar(Scalar),
    List(Vec<Scalar>),
    /// A placeholder that resolved to nothing (e.g. the owner of an
    /// anonymous request). The predicate matches no row.
    Unbound,
}

macro_rules! filter_value_from {
    ($($t:ty),* $(,)?) => {$(
        impl From<$t> for FilterValue {
            fn from(v: $t) -> Self {
                FilterValue::Scalar(v.into())
            }
        }

        impl From<Vec<$t>> for FilterValue {
            fn from(v: Vec<$t>) -> Self {
                FilterValue::List(v.into_iter().map(Into::into).collect())
            }
        }
    )*};
}

filter_value_from!(i64, i32, bool, &str, String, Timestamp, Scalar);

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A primitive predicate: `field operator value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Where {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    pub fn is_in<T: Into<Scalar>>(field: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::In,
            value: FilterValue::List(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Is,
            value: FilterValue::Null,
        }
    }

    /// A predicate that can never match.
    pub fn never(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Eq,
            value: FilterValue::Unbound,
        }
    }

    fn write_sql(&self, out: &mut String, params: &mut Vec<Scalar>, next: &mut usize) {
        let field = quote_ident(&self.field);
        match &self.value {
            FilterValue::Unbound => out.push_str("FALSE"),
            FilterValue::Null => {
                out.push_str(&format!("{field} {} NULL", self.operator));
            }
            FilterValue::Scalar(Scalar::Bool(b))
                if matches!(self.operator, Operator::Is | Operator::IsNot) =>
            {
                let kw = if *b { "TRUE" } else { "FALSE" };
                out.push_str(&format!("{field} {} {kw}", self.operator));
            }
            FilterValue::Scalar(s) => {
                out.push_str(&format!("{field} {} ${next}", self.operator));
                params.push(s.clone());
                *next += 1;
            }
            FilterValue::List(items) if items.is_empty() => {
                // `x IN ()` is not valid SQL; an empty set contains nothing.
                let marker = if self.operator == Operator::NotIn {
                    "TRUE"
                } else {
                    "FALSE"
                };
                out.push_str(marker);
            }
            FilterValue::List(items) => {
                let placeholders: Vec<String> = items
                    .iter()
                    .map(|item| {
                        params.push(item.clone());
                        let p = format!("${next}");
                        *next += 1;
                        p
                    })
                    .collect();
                out.push_str(&format!(
                    "{field} {} ({})",
                    self.operator,
                    placeholders.join(", ")
                ));
            }
        }
    }

    /// Evaluate the predicate against a row in-process.
    ///
    /// SQL NULL semantics are collapsed to "no match": comparing anything
    /// with a missing or null column is false, except `IS [NOT] NULL`.
    pub fn matches<'a>(&self, lookup: &impl Fn(&str) -> Option<&'a Value>) -> bool {
        let column = lookup(&self.field).filter(|v| !v.is_null());
        match (&self.value, column) {
            (FilterValue::Unbound, _) => false,
            (FilterValue::Null, col) => match self.operator {
                Operator::Is => col.is_none(),
                Operator::IsNot => col.is_some(),
                _ => false,
            },
            (_, None) => false,
            (FilterValue::Scalar(s), Some(col)) => {
                let Some(ord) = compare(col, s) else {
                    return false;
                };
                match self.operator {
                    Operator::Eq | Operator::Is | Operator::In => ord == Ordering::Equal,
                    Operator::NotEq | Operator::IsNot | Operator::NotIn => {
                        ord != Ordering::Equal
                    }
                    Operator::Gt => ord == Ordering::Greater,
                    Operator::Gte => ord != Ordering::Less,
                    Operator::Lt => ord == Ordering::Less,
                    Operator::Lte => ord != Ordering::Greater,
                    Operator::Like => match (col, s) {
                        (Value::String(text), Scalar::Text(pattern)) => like(text, pattern),
                        _ => false,
                    },
                }
            }
            (FilterValue::List(items), Some(col)) => {
                let found = items
                    .iter()
                    .any(|item| compare(col, item) == Some(Ordering::Equal));
                match self.operator {
                    Operator::NotIn | Operator::NotEq => !found,
                    _ => found,
                }
            }
        }
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FilterValue::Unbound => f.write_str("FALSE"),
            FilterValue::Null => write!(f, "{} {} NULL", self.field, self.operator),
            FilterValue::Scalar(s) => {
                write!(f, "{} {} ", self.field, self.operator)?;
                s.write_literal(f)
            }
            FilterValue::List(items) => {
                write!(f, "{} {} (", self.field, self.operator)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_literal(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Expression tree
// ---------------------------------------------------------------------------

/// One element of an AND chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Where(Where),
    /// Parenthesized OR group.
    AnyOf(Vec<Where>),
}

impl From<Where> for FilterNode {
    fn from(w: Where) -> Self {
        FilterNode::Where(w)
    }
}

impl FilterNode {
    fn matches<'a>(&self, lookup: &impl Fn(&str) -> Option<&'a Value>) -> bool {
        match self {
            FilterNode::Where(w) => w.matches(lookup),
            FilterNode::AnyOf(group) => group.iter().any(|w| w.matches(lookup)),
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Where(w) => write!(f, "{w}"),
            FilterNode::AnyOf(group) if group.is_empty() => f.write_str("FALSE"),
            FilterNode::AnyOf(group) => {
                f.write_str("(")?;
                for (i, w) in group.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{w}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// An AND chain of filter nodes. Empty means "no predicate".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    nodes: Vec<FilterNode>,
}

/// Statement text plus the parameters its placeholders refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub text: String,
    pub params: Vec<Scalar>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [FilterNode] {
        &mut self.nodes
    }

    pub fn push(&mut self, node: impl Into<FilterNode>) {
        self.nodes.push(node.into());
    }

    /// Builder-style append of a single predicate.
    pub fn and(mut self, node: impl Into<FilterNode>) -> Self {
        self.push(node);
        self
    }

    /// Builder-style append of an OR group.
    pub fn and_any_of(mut self, group: Vec<Where>) -> Self {
        self.nodes.push(FilterNode::AnyOf(group));
        self
    }

    /// Append every node of `other`, keeping its order after ours.
    pub fn extend(&mut self, other: Filter) {
        self.nodes.extend(other.nodes);
    }

    /// Iterate over every predicate, including those inside OR groups.
    pub fn predicates(&self) -> impl Iterator<Item = &Where> {
        self.nodes.iter().flat_map(|node| match node {
            FilterNode::Where(w) => std::slice::from_ref(w).iter(),
            FilterNode::AnyOf(group) => group.iter(),
        })
    }

    /// Render the predicate clause with placeholders numbered from
    /// `first_param` (1-based, as in `$1`).
    ///
    /// The returned text has no `WHERE` keyword and is empty for an empty
    /// filter.
    pub fn to_sql(&self, first_param: usize) -> SqlFragment {
        let mut text = String::new();
        let mut params = Vec::new();
        let mut next = first_param;

        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                text.push_str(" AND ");
            }
            match node {
                FilterNode::Where(w) => w.write_sql(&mut text, &mut params, &mut next),
                FilterNode::AnyOf(group) if group.is_empty() => text.push_str("FALSE"),
                FilterNode::AnyOf(group) => {
                    text.push('(');
                    for (j, w) in group.iter().enumerate() {
                        if j > 0 {
                            text.push_str(" OR ");
                        }
                        w.write_sql(&mut text, &mut params, &mut next);
                    }
                    text.push(')');
                }
            }
        }

        SqlFragment { text, params }
    }

    /// Evaluate the whole chain against a row in-process.
    pub fn matches<'a>(&self, lookup: impl Fn(&str) -> Option<&'a Value>) -> bool {
        self.nodes.iter().all(|node| node.matches(&lookup))
    }
}

impl From<Vec<FilterNode>> for Filter {
    fn from(nodes: Vec<FilterNode>) -> Self {
        Self { nodes }
    }
}

impl From<Where> for Filter {
    fn from(w: Where) -> Self {
        Self {
            nodes: vec![FilterNode::Where(w)],
        }
    }
}

impl FromIterator<FilterNode> for Filter {
    fn from_iter<I: IntoIterator<Item = FilterNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Filter {
    type Item = FilterNode;
    type IntoIter = std::vec::IntoIter<FilterNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Quote an SQL identifier, doubling any embedded quote characters.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Compare a stored JSON value with a literal, coercing numbers, numeric
/// text and RFC 3339 timestamps the way a loosely typed store would.
fn compare(column: &Value, literal: &Scalar) -> Option<Ordering> {
    match (column, literal) {
        (Value::Number(n), Scalar::Int(i)) => n.as_f64()?.partial_cmp(&(*i as f64)),
        (Value::Number(n), Scalar::Float(v)) => n.as_f64()?.partial_cmp(v),
        (Value::Number(n), Scalar::Text(s)) => n.as_f64()?.partial_cmp(&s.trim().parse::<f64>().ok()?),
        (Value::Number(n), Scalar::Bool(b)) => n.as_i64().map(|i| i.cmp(&i64::from(*b))),
        (Value::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Scalar::Int(i)) => Some(i64::from(*a).cmp(i)),
        (Value::String(s), Scalar::Text(t)) => Some(s.as_str().cmp(t.as_str())),
        (Value::String(s), Scalar::Int(i)) => s.trim().parse::<i64>().ok().map(|v| v.cmp(i)),
        (Value::String(s), Scalar::Float(v)) => s.trim().parse::<f64>().ok()?.partial_cmp(v),
        (Value::String(s), Scalar::Timestamp(t)) => {
            let parsed = chrono::DateTime::parse_from_rfc3339(s).ok()?;
            Some(parsed.with_timezone(&chrono::Utc).cmp(t))
        }
        _ => None,
    }
}

/// SQL `LIKE` with `%` (any run) and `_` (any single char).
///
/// Two-pointer match: on a mismatch, resume just after the last `%` with
/// one more text char consumed by it. Bounded by `text * pattern` steps.
fn like(text: &str, pattern: &str) -> bool {
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (mut ti, mut pi) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;

    while ti < t.len() {
        match p.get(pi) {
            Some('%') => {
                resume = Some((pi, ti));
                pi += 1;
            }
            Some('_') => {
                ti += 1;
                pi += 1;
            }
            Some(c) if *c == t[ti] => {
                ti += 1;
                pi += 1;
            }
            _ => match resume {
                Some((star, consumed)) => {
                    pi = star + 1;
                    ti = consumed + 1;
                    resume = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|c| *c == '%')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
