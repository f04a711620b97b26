//! Generic persistence module: one per entity type.
//!
//! A [`Module`] pairs a static [`EntityDescriptor`] with the store handle it
//! was constructed with and turns field projections, filters, sort keys and
//! bounds into statements. Store failures propagate unchanged.

use std::fmt;

use devsync_core::filter::{Filter, Where};
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;
use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::descriptor::EntityDescriptor;
use crate::error::StoreError;
use crate::record::Record;
use crate::statement::{Count, Delete, Param, Select, Statement, Update};
use crate::store::StoreHandle;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Select parameters. An empty field list selects every declared field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub fields: Vec<String>,
    pub filter: Filter,
    pub sort: SortKey,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Result of [`Module::query`]. A limit of exactly one yields [`Fetched::One`].
#[derive(Debug)]
pub enum Fetched {
    One(Option<Record>),
    Many(Vec<Record>),
}

impl Fetched {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Fetched::One(record) => record.into_iter().collect(),
            Fetched::Many(records) => records,
        }
    }

    pub fn into_one(self) -> Option<Record> {
        match self {
            Fetched::One(record) => record,
            Fetched::Many(records) => records.into_iter().next(),
        }
    }
}

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Module {
    descriptor: &'static EntityDescriptor,
    store: StoreHandle,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("table", &self.descriptor.table)
            .finish_non_exhaustive()
    }
}

impl Module {
    pub fn new(descriptor: &'static EntityDescriptor, store: StoreHandle) -> Self {
        Self { descriptor, store }
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    pub fn table(&self) -> &'static str {
        self.descriptor.table
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// A module for another entity type on the same store.
    pub fn sibling(&self, descriptor: &'static EntityDescriptor) -> Module {
        Module::new(descriptor, self.store.clone())
    }

    /// Build an unsaved record from client-supplied attributes. Undeclared
    /// keys are dropped.
    pub fn create_record(&self, attributes: Map<String, Value>) -> Record {
        let mut record = Record::new(self.clone());
        record.assign(attributes);
        record
    }

    /// Run a select and hydrate every row, resolving computed fields before
    /// returning.
    pub async fn query(&self, query: Query) -> Result<Fetched, StoreError> {
        let single = query.limit == Some(1);
        let select = Select {
            table: self.descriptor.table,
            fields: self.projection(query.fields),
            filter: self.prepare_filter(query.filter).await?,
            sort: query.sort,
            limit: query.limit,
            offset: query.offset,
        };

        let rows = self.store.fetch_rows(&select).await?;
        let mut records: Vec<Record> = rows
            .into_iter()
            .map(|row| Record::hydrate(self.clone(), row))
            .collect();
        try_join_all(records.iter_mut().map(|r| r.resolve_computed())).await?;

        Ok(if single {
            Fetched::One(records.into_iter().next())
        } else {
            Fetched::Many(records)
        })
    }

    /// List semantics regardless of the limit.
    pub async fn find(&self, query: Query) -> Result<Vec<Record>, StoreError> {
        Ok(self.query(query).await?.into_records())
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<Record>, StoreError> {
        Ok(self.query(Query::filtered(filter).limit(1)).await?.into_one())
    }

    pub async fn get_by_id(&self, id: DbId) -> Result<Option<Record>, StoreError> {
        self.find_one(Filter::from(Where::eq("id", id))).await
    }

    pub async fn count(&self, filter: Filter) -> Result<i64, StoreError> {
        let count = Count {
            table: self.descriptor.table,
            filter: self.prepare_filter(filter).await?,
        };
        self.store.fetch_count(&count).await
    }

    /// Insert a record built from `attributes` and return it with its id.
    pub async fn create(&self, attributes: Map<String, Value>) -> Result<Record, StoreError> {
        let mut record = self.create_record(attributes);
        record.save().await?;
        Ok(record)
    }

    /// Set `values` on every row matching `filter`.
    pub async fn update_where(
        &self,
        values: &[(&str, Value)],
        filter: Filter,
    ) -> Result<u64, StoreError> {
        let values = values
            .iter()
            .map(|(field, value)| -> Result<(String, Param), StoreError> {
                Ok((field.to_string(), self.descriptor.to_param(field, value)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Ok(0);
        }
        let update = Statement::Update(Update {
            table: self.descriptor.table,
            values,
            filter: self.prepare_filter(filter).await?,
        });
        self.store.execute(&update).await
    }

    pub async fn delete_where(&self, filter: Filter) -> Result<u64, StoreError> {
        let delete = Statement::Delete(Delete {
            table: self.descriptor.table,
            filter: self.prepare_filter(filter).await?,
        });
        self.store.execute(&delete).await
    }

    /// Integer values of one column for every matching row, in `id` order.
    ///
    /// Reads raw rows: no records are hydrated and no computed fields run.
    pub async fn pluck_ids(&self, field: &str, filter: Filter) -> Result<Vec<DbId>, StoreError> {
        let select = Select {
            table: self.descriptor.table,
            fields: vec![field.to_string()],
            filter: self.prepare_filter(filter).await?,
            sort: SortKey::by("id", Direction::Asc),
            limit: None,
            offset: None,
        };
        let rows = self.store.fetch_rows(&select).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get(field).and_then(Value::as_i64))
            .collect())
    }

    /// Apply the entity's filter rewriter, then coerce literals to column
    /// kinds.
    async fn prepare_filter(&self, filter: Filter) -> Result<Filter, StoreError> {
        let filter = match self.descriptor.rewrite_filter {
            Some(rewrite) => rewrite(self, filter).await?,
            None => filter,
        };
        Ok(self.descriptor.coerce_filter(filter))
    }

    /// Requested fields restricted to declared ones, always including `id`.
    fn projection(&self, requested: Vec<String>) -> Vec<String> {
        if requested.is_empty() {
            return self
                .descriptor
                .field_names()
                .into_iter()
                .map(str::to_string)
                .collect();
        }
        let mut fields: Vec<String> = requested
            .into_iter()
            .filter(|f| self.descriptor.has_field(f))
            .collect();
        if !fields.iter().any(|f| f == "id") {
            fields.insert(0, "id".to_string());
        }
        fields
    }
}
