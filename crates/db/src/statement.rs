//! Structured statements and their parameterized SQL rendering.
//!
//! Statements are plain values: the Postgres store renders them to text with
//! positional `$n` placeholders, the in-memory store interprets them
//! directly. Identifiers are always double-quoted. Values only enter the
//! statement text as the `NULL` keyword; everything else is a bound
//! parameter.

use devsync_core::filter::{quote_ident, Filter, Scalar};
use devsync_core::sort::SortKey;
use indexmap::IndexMap;
use serde_json::Value;

/// One fetched row, keyed by column name in select order.
pub type Row = IndexMap<String, Value>;

/// A value written by an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Scalar(Scalar),
}

impl Param {
    /// JSON form as stored in rows.
    pub fn to_json(&self) -> Value {
        match self {
            Param::Null => Value::Null,
            Param::Scalar(s) => s.to_json(),
        }
    }
}

impl From<Scalar> for Param {
    fn from(s: Scalar) -> Self {
        Param::Scalar(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: &'static str,
    pub fields: Vec<String>,
    pub filter: Filter,
    pub sort: SortKey,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Count {
    pub table: &'static str,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: &'static str,
    pub values: Vec<(String, Param)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: &'static str,
    pub values: Vec<(String, Param)>,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: &'static str,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Count(Count),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

/// Rendered statement text with the parameters its placeholders refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSql {
    pub text: String,
    pub params: Vec<Param>,
}

impl RenderedSql {
    fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }

    fn push_param(&mut self, param: Param) -> String {
        let placeholder = format!("${}", self.next_placeholder());
        self.params.push(param);
        placeholder
    }

    fn push_where(&mut self, filter: &Filter) {
        if filter.is_empty() {
            return;
        }
        let fragment = filter.to_sql(self.next_placeholder());
        self.text.push_str(" WHERE ");
        self.text.push_str(&fragment.text);
        self.params
            .extend(fragment.params.into_iter().map(Param::Scalar));
    }
}

impl Statement {
    pub fn table(&self) -> &'static str {
        match self {
            Statement::Select(s) => s.table,
            Statement::Count(s) => s.table,
            Statement::Insert(s) => s.table,
            Statement::Update(s) => s.table,
            Statement::Delete(s) => s.table,
        }
    }

    pub fn to_sql(&self) -> RenderedSql {
        let mut sql = RenderedSql::default();
        match self {
            Statement::Select(s) => {
                let columns = if s.fields.is_empty() {
                    "*".to_string()
                } else {
                    s.fields
                        .iter()
                        .map(|f| quote_ident(f))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                sql.text = format!("SELECT {columns} FROM {}", quote_ident(s.table));
                sql.push_where(&s.filter);
                if !s.sort.terms().is_empty() {
                    sql.text.push_str(" ORDER BY ");
                    sql.text.push_str(&s.sort.to_sql());
                }
                if let Some(limit) = s.limit {
                    let p = sql.push_param(Param::Scalar(Scalar::Int(limit)));
                    sql.text.push_str(&format!(" LIMIT {p}"));
                }
                if let Some(offset) = s.offset {
                    let p = sql.push_param(Param::Scalar(Scalar::Int(offset)));
                    sql.text.push_str(&format!(" OFFSET {p}"));
                }
            }
            Statement::Count(s) => {
                sql.text = format!("SELECT COUNT(*)::BIGINT FROM {}", quote_ident(s.table));
                sql.push_where(&s.filter);
            }
            Statement::Insert(s) => {
                if s.values.is_empty() {
                    sql.text = format!(
                        "INSERT INTO {} DEFAULT VALUES RETURNING \"id\"",
                        quote_ident(s.table)
                    );
                    return sql;
                }
                let mut columns = Vec::with_capacity(s.values.len());
                let mut values = Vec::with_capacity(s.values.len());
                for (field, param) in &s.values {
                    columns.push(quote_ident(field));
                    values.push(match param {
                        Param::Null => "NULL".to_string(),
                        other => sql.push_param(other.clone()),
                    });
                }
                sql.text = format!(
                    "INSERT INTO {} ({}) VALUES ({}) RETURNING \"id\"",
                    quote_ident(s.table),
                    columns.join(", "),
                    values.join(", ")
                );
            }
            Statement::Update(s) => {
                let assignments: Vec<String> = s
                    .values
                    .iter()
                    .map(|(field, param)| {
                        let value = match param {
                            Param::Null => "NULL".to_string(),
                            other => sql.push_param(other.clone()),
                        };
                        format!("{} = {value}", quote_ident(field))
                    })
                    .collect();
                sql.text = format!(
                    "UPDATE {} SET {}",
                    quote_ident(s.table),
                    assignments.join(", ")
                );
                sql.push_where(&s.filter);
            }
            Statement::Delete(s) => {
                sql.text = format!("DELETE FROM {}", quote_ident(s.table));
                sql.push_where(&s.filter);
            }
        }
        sql
    }
}
