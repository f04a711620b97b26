//! In-process [`Store`] that interprets statements structurally.
//!
//! Filters are evaluated with [`Filter::matches`], so predicate semantics
//! match the rendered SQL. Sorting follows Postgres: nulls sort last when
//! ascending and first when descending. Schema defaults come from the
//! entity descriptors the store was built for.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use devsync_core::filter::Filter;
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;
use serde_json::Value;

use crate::descriptor::{DefaultValue, EntityDescriptor};
use crate::error::StoreError;
use crate::statement::{Count, Insert, Row, Select, Statement};
use crate::store::Store;

#[derive(Debug)]
struct Table {
    next_id: DbId,
    rows: Vec<Row>,
    defaults: &'static [(&'static str, DefaultValue)],
}

#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    /// An empty store with one table per descriptor.
    pub fn for_entities(descriptors: &[&'static EntityDescriptor]) -> Self {
        let tables = descriptors
            .iter()
            .map(|d| {
                (
                    d.table,
                    Table {
                        next_id: 1,
                        rows: Vec::new(),
                        defaults: d.defaults,
                    },
                )
            })
            .collect();
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, Table>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Table) -> T,
    ) -> Result<T, StoreError> {
        let mut tables = self.lock();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(f(t))
    }
}

fn row_matches(filter: &Filter, row: &Row) -> bool {
    filter.matches(|field| row.get(field))
}

/// Compare two stored values of the same column.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn sort_rows(rows: &mut [Row], sort: &SortKey) {
    rows.sort_by(|a, b| {
        for term in sort.terms() {
            let x = a.get(&term.field).filter(|v| !v.is_null());
            let y = b.get(&term.field).filter(|v| !v.is_null());
            // NULL compares greater than every value.
            let ord = match (x, y) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => compare_values(x, y),
            };
            let ord = match term.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_rows(&self, select: &Select) -> Result<Vec<Row>, StoreError> {
        let mut rows = self.with_table(select.table, |t| {
            t.rows
                .iter()
                .filter(|row| row_matches(&select.filter, row))
                .cloned()
                .collect::<Vec<_>>()
        })?;
        sort_rows(&mut rows, &select.sort);

        let offset = select.offset.unwrap_or(0).max(0) as usize;
        let limit = select.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                if select.fields.is_empty() {
                    return row;
                }
                select
                    .fields
                    .iter()
                    .map(|f| (f.clone(), row.get(f).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect())
    }

    async fn fetch_count(&self, count: &Count) -> Result<i64, StoreError> {
        self.with_table(count.table, |t| {
            t.rows
                .iter()
                .filter(|row| row_matches(&count.filter, row))
                .count() as i64
        })
    }

    async fn insert(&self, insert: &Insert) -> Result<DbId, StoreError> {
        self.with_table(insert.table, |t| {
            let id = t.next_id;
            t.next_id += 1;

            let mut row = Row::new();
            row.insert("id".to_string(), Value::from(id));
            for (field, param) in &insert.values {
                row.insert(field.clone(), param.to_json());
            }
            for (field, default) in t.defaults {
                if !row.contains_key(*field) {
                    row.insert(field.to_string(), default.to_json());
                }
            }
            t.rows.push(row);
            id
        })
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        match statement {
            Statement::Update(update) => self.with_table(update.table, |t| {
                let mut affected = 0;
                for row in t.rows.iter_mut().filter(|r| row_matches(&update.filter, r)) {
                    for (field, param) in &update.values {
                        row.insert(field.clone(), param.to_json());
                    }
                    affected += 1;
                }
                affected
            }),
            Statement::Delete(delete) => self.with_table(delete.table, |t| {
                let before = t.rows.len();
                t.rows.retain(|r| !row_matches(&delete.filter, r));
                (before - t.rows.len()) as u64
            }),
            _ => Err(StoreError::Unsupported("execute takes update or delete")),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use devsync_core::filter::{Scalar, Where};
    use serde_json::json;

    use super::*;
    use crate::descriptor::{FieldDef, DEFAULT_CREATED_BY_FIELD};
    use crate::statement::{Param, Update};

    static NOTE: EntityDescriptor = EntityDescriptor {
        name: "note",
        table: "notes",
        fields: &[FieldDef::int("id"), FieldDef::text("body"), FieldDef::int("rank")],
        created_by_field: DEFAULT_CREATED_BY_FIELD,
        hidden: &[],
        defaults: &[("rank", DefaultValue::Int(0))],
        computed: &[],
        rewrite_filter: None,
    };

    fn text(s: &str) -> Param {
        Param::Scalar(Scalar::Text(s.into()))
    }

    async fn insert(store: &MemoryStore, body: &str, rank: Option<i64>) -> DbId {
        let mut values = vec![("body".to_string(), text(body))];
        if let Some(r) = rank {
            values.push(("rank".to_string(), Param::Scalar(Scalar::Int(r))));
        }
        store
            .insert(&Insert {
                table: "notes",
                values,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_defaults() {
        let store = MemoryStore::for_entities(&[&NOTE]);
        assert_eq!(insert(&store, "a", None).await, 1);
        assert_eq!(insert(&store, "b", Some(5)).await, 2);
        let rows = store.rows("notes");
        assert_eq!(rows[0]["rank"], json!(0));
        assert_eq!(rows[1]["rank"], json!(5));
    }

    #[tokio::test]
    async fn select_sorts_pages_and_projects() {
        let store = MemoryStore::for_entities(&[&NOTE]);
        for (body, rank) in [("a", 3), ("b", 1), ("c", 2)] {
            insert(&store, body, Some(rank)).await;
        }
        let rows = store
            .fetch_rows(&Select {
                table: "notes",
                fields: vec!["body".into()],
                filter: Filter::new(),
                sort: SortKey::by("rank", Direction::Asc),
                limit: Some(2),
                offset: Some(1),
            })
            .await
            .unwrap();
        let bodies: Vec<&Value> = rows.iter().map(|r| &r["body"]).collect();
        assert_eq!(bodies, vec![&json!("c"), &json!("a")]);
        assert_eq!(rows[0].len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_report_affected_rows() {
        let store = MemoryStore::for_entities(&[&NOTE]);
        insert(&store, "a", Some(1)).await;
        insert(&store, "b", Some(1)).await;
        insert(&store, "c", Some(2)).await;

        let updated = store
            .execute(&Statement::Update(Update {
                table: "notes",
                values: vec![("body".into(), text("z"))],
                filter: Filter::from(Where::eq("rank", 1)),
            }))
            .await
            .unwrap();
        assert_eq!(updated, 2);

        let deleted = store
            .execute(&Statement::Delete(crate::statement::Delete {
                table: "notes",
                filter: Filter::from(Where::eq("body", "z")),
            }))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.rows("notes").len(), 1);
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let store = MemoryStore::for_entities(&[&NOTE]);
        let err = store
            .fetch_count(&Count {
                table: "nope",
                filter: Filter::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(_)));
    }
}
