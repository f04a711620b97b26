//! Hydrated entity instances.

use devsync_core::filter::{Filter, Where};
use devsync_core::types::DbId;
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::module::Module;
use crate::statement::{Delete, Insert, Param, Row, Statement, Update};

/// Value of a computed field.
#[derive(Debug, Clone)]
pub enum Computed {
    Value(Value),
    One(Option<Box<Record>>),
    Many(Vec<Record>),
}

impl Computed {
    pub fn one(record: Option<Record>) -> Self {
        Computed::One(record.map(Box::new))
    }

    fn to_json(&self) -> Value {
        match self {
            Computed::Value(v) => v.clone(),
            Computed::One(Some(record)) => Value::Object(record.project().into_iter().collect()),
            Computed::One(None) => Value::Null,
            Computed::Many(records) => Value::Array(
                records
                    .iter()
                    .map(|r| Value::Object(r.project().into_iter().collect()))
                    .collect(),
            ),
        }
    }
}

/// One entity instance: persisted attributes plus resolved computed fields.
///
/// Absent attributes are unset, not null. Saving dispatches on whether the
/// record has an id; every set declared field is written on each save.
#[derive(Debug, Clone)]
pub struct Record {
    module: Module,
    attributes: Row,
    computed: IndexMap<String, Computed>,
    visible_fields: Vec<String>,
    deleted: bool,
}

impl Record {
    pub fn new(module: Module) -> Self {
        let visible_fields = module.descriptor().visible_fields();
        Self {
            module,
            attributes: Row::new(),
            computed: IndexMap::new(),
            visible_fields,
            deleted: false,
        }
    }

    /// Build a record from a store row, keeping declared fields only.
    pub fn hydrate(module: Module, row: Row) -> Self {
        let mut record = Record::new(module);
        let descriptor = record.module.descriptor();
        record.attributes = row
            .into_iter()
            .filter(|(field, _)| descriptor.has_field(field))
            .collect();
        record
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn id(&self) -> Option<DbId> {
        self.get_i64("id")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        match self.attributes.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).and_then(Value::as_str)
    }

    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    /// Set a declared field. Returns `false` (and changes nothing) for
    /// undeclared fields.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> bool {
        if !self.module.descriptor().has_field(field) {
            return false;
        }
        self.attributes.insert(field.to_string(), value.into());
        true
    }

    /// Assign every declared key of `values`; other keys are ignored.
    pub fn assign(&mut self, values: Map<String, Value>) {
        for (field, value) in values {
            self.set(&field, value);
        }
    }

    pub fn unset(&mut self, field: &str) {
        self.attributes.shift_remove(field);
    }

    pub fn computed(&self, name: &str) -> Option<&Computed> {
        self.computed.get(name)
    }

    pub fn visible_fields(&self) -> &[String] {
        &self.visible_fields
    }

    /// Resolve every computed field of the entity type concurrently.
    pub async fn resolve_computed(&mut self) -> Result<(), StoreError> {
        let computed = self.module.descriptor().computed;
        if computed.is_empty() {
            return Ok(());
        }
        let values = try_join_all(computed.iter().map(|c| (c.resolve)(&*self))).await?;
        for (field, value) in computed.iter().zip(values) {
            self.computed.insert(field.name.to_string(), value);
        }
        Ok(())
    }

    /// Insert when the record has no id, update by id otherwise.
    pub async fn save(&mut self) -> Result<(), StoreError> {
        if self.deleted {
            return Err(StoreError::Unsupported("save after delete"));
        }
        let descriptor = self.module.descriptor();
        let values = self
            .attributes
            .iter()
            .filter(|(field, _)| field.as_str() != "id" && descriptor.has_field(field))
            .map(|(field, value)| -> Result<(String, Param), StoreError> {
                Ok((field.clone(), descriptor.to_param(field, value)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match self.id() {
            None => {
                let id = self
                    .module
                    .store()
                    .insert(&Insert {
                        table: descriptor.table,
                        values,
                    })
                    .await?;
                self.attributes.insert("id".to_string(), Value::from(id));
                tracing::debug!(table = descriptor.table, id, "Record inserted");
            }
            Some(id) => {
                if values.is_empty() {
                    return Ok(());
                }
                let update = Statement::Update(Update {
                    table: descriptor.table,
                    values,
                    filter: Filter::from(Where::eq("id", id)),
                });
                self.module.store().execute(&update).await?;
            }
        }
        Ok(())
    }

    /// Remove the row by id. A record without an id is left alone.
    ///
    /// Returns whether a row was removed. The record can still be projected
    /// afterwards but can no longer be saved.
    pub async fn delete(&mut self) -> Result<bool, StoreError> {
        let Some(id) = self.id() else {
            return Ok(false);
        };
        let delete = Statement::Delete(Delete {
            table: self.module.table(),
            filter: Filter::from(Where::eq("id", id)),
        });
        let affected = self.module.store().execute(&delete).await?;
        self.deleted = true;
        Ok(affected > 0)
    }

    /// Visible fields holding a value, with computed values rendered
    /// recursively. Unset and null fields are omitted.
    pub fn project(&self) -> IndexMap<String, Value> {
        self.project_filtered(|_| true)
    }

    /// Like [`Record::project`], additionally dropping declared fields not
    /// in `allowed`. Computed fields are kept.
    pub fn project_within(&self, allowed: &[String]) -> IndexMap<String, Value> {
        self.project_filtered(|field| allowed.iter().any(|a| a == field))
    }

    fn project_filtered(&self, allow: impl Fn(&str) -> bool) -> IndexMap<String, Value> {
        let mut out = IndexMap::with_capacity(self.visible_fields.len());
        for field in &self.visible_fields {
            let value = match self.computed.get(field) {
                Some(computed) => computed.to_json(),
                None if allow(field) => match self.attributes.get(field) {
                    Some(value) => value.clone(),
                    None => continue,
                },
                None => continue,
            };
            if !value.is_null() {
                out.insert(field.clone(), value);
            }
        }
        out
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.project().serialize(serializer)
    }
}
