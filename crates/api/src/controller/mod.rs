//! Controller orchestration.
//!
//! [`EntityController`] runs every action through the same steps:
//!
//! ```text
//! ResolvePolicy -> ValidateInput -> AuthorizeRow -> Execute -> Project
//! ```
//!
//! - `ResolvePolicy` picks the acting role's criteria for the verb and fails
//!   with 401 (anonymous) or 403 (authenticated) when there are none.
//! - `ValidateInput` (create/update) collects every field violation.
//! - `AuthorizeRow` (single-row verbs) fetches the target through the
//!   criteria filter; a hidden row and a missing row are both 404.
//! - `Execute` writes only fields the criteria allow, silently dropping
//!   the rest.
//! - `Project` renders records, restricted to the allowed fields on reads.
//!
//! Each step is public so entity controllers can compose the generic
//! actions with their own side effects.

pub mod category;
pub mod comment;
pub mod favorite;
pub mod like;
pub mod params;
pub mod post;
pub mod user;

use devsync_core::access::{AccessCriteria, AccessPolicy, Verb};
use devsync_core::error::CoreError;
use devsync_core::filter::{Filter, Where};
use devsync_core::pagination::Pagination;
use devsync_core::roles::Actor;
use devsync_core::sort::{Direction, SortKey};
use devsync_core::types::DbId;
use devsync_core::validation::FieldRules;
use devsync_db::descriptor::EntityDescriptor;
use devsync_db::{Module, Query, Record, StoreHandle};
use serde_json::{Map, Value};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::response::{Listing, Projection};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One controller per entity type, built at startup.
pub struct Controllers {
    pub user: EntityController,
    pub category: EntityController,
    pub post: EntityController,
    pub comment: EntityController,
    pub like: EntityController,
    pub favorite: EntityController,
}

impl Controllers {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            user: user::controller(),
            category: category::controller(),
            post: post::controller(config.posts_per_page),
            comment: comment::controller(),
            like: like::controller(),
            favorite: favorite::controller(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generic controller
// ---------------------------------------------------------------------------

/// Capabilities of one entity type plugged into the generic actions.
#[derive(Debug, Clone)]
pub struct EntityController {
    descriptor: &'static EntityDescriptor,
    policy: AccessPolicy,
    create_rules: FieldRules,
    update_rules: FieldRules,
    default_sort: SortKey,
    sortable: &'static [&'static str],
    per_page: Option<i64>,
}

impl EntityController {
    /// A controller with the standard role policies, no validators, newest
    /// rows first and no pagination.
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        let policy = AccessPolicy::standard(&descriptor.field_names(), descriptor.created_by_field);
        Self {
            descriptor,
            policy,
            create_rules: FieldRules::new(),
            update_rules: FieldRules::new(),
            default_sort: SortKey::default(),
            sortable: &[],
            per_page: None,
        }
    }

    pub fn validated(mut self, create: FieldRules, update: FieldRules) -> Self {
        self.create_rules = create;
        self.update_rules = update;
        self
    }

    /// Default sort plus the fields clients may sort by.
    pub fn sorted(mut self, default_sort: SortKey, sortable: &'static [&'static str]) -> Self {
        self.default_sort = default_sort;
        self.sortable = sortable;
        self
    }

    pub fn paginated(mut self, per_page: i64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut AccessPolicy {
        &mut self.policy
    }

    pub fn module(&self, store: &StoreHandle) -> Module {
        Module::new(self.descriptor, store.clone())
    }

    /// Declared fields except those listed.
    pub fn fields_except(&self, excluded: &[&str]) -> Vec<&'static str> {
        self.descriptor
            .field_names()
            .into_iter()
            .filter(|f| !excluded.contains(f))
            .collect()
    }

    fn not_found(&self, id: DbId) -> AppError {
        AppError::Core(CoreError::NotFound {
            entity: self.descriptor.name,
            id,
        })
    }

    // -- steps --------------------------------------------------------------

    pub fn resolve_policy(&self, actor: Option<&Actor>, verb: Verb) -> AppResult<AccessCriteria> {
        Ok(self.policy.authorize(actor, verb)?)
    }

    /// Run the create or update validators. Returns the fields that passed.
    pub fn validate_input(&self, verb: Verb, body: &Map<String, Value>) -> AppResult<Vec<String>> {
        let rules = match verb {
            Verb::Create => &self.create_rules,
            Verb::Update => &self.update_rules,
            Verb::Read | Verb::Delete => return Ok(Vec::new()),
        };
        Ok(rules.validate(body)?)
    }

    /// Fetch the row `id` through the criteria filter.
    pub async fn authorize_row(
        &self,
        store: &StoreHandle,
        criteria: &AccessCriteria,
        id: DbId,
    ) -> AppResult<Record> {
        let filter = criteria.filter.clone().and(Where::eq("id", id));
        self.module(store)
            .find_one(filter)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// Body entries the criteria allow writing. `id` is never writable.
    pub fn writable(criteria: &AccessCriteria, body: Map<String, Value>) -> Map<String, Value> {
        body.into_iter()
            .filter(|(field, _)| field != "id" && criteria.allows(field))
            .collect()
    }

    /// Map a `field[:dir]` parameter through the sortable allow-list.
    ///
    /// A bare field sorts ascending; unknown fields and directions fall back
    /// to the default sort.
    pub fn sort_from(&self, raw: Option<&str>) -> SortKey {
        let Some(raw) = raw else {
            return self.default_sort.clone();
        };
        let mut parts = raw.split(':').map(str::trim);
        let field = parts.next().unwrap_or_default();
        if !self.sortable.contains(&field) {
            return self.default_sort.clone();
        }
        let direction = match (parts.next(), parts.next()) {
            (None, _) => Some(Direction::Asc),
            (Some(dir), None) => Direction::parse(dir),
            _ => None,
        };
        match direction {
            Some(direction) => SortKey::by(field, direction),
            None => self.default_sort.clone(),
        }
    }

    /// Re-read a record after a write so computed fields reflect it.
    pub async fn reload(&self, store: &StoreHandle, id: DbId) -> AppResult<Record> {
        self.module(store)
            .get_by_id(id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// Insert a record built from the allowed body fields. The owner column
    /// is set to the actor.
    pub async fn execute_create(
        &self,
        store: &StoreHandle,
        actor: Option<&Actor>,
        criteria: &AccessCriteria,
        body: Map<String, Value>,
    ) -> AppResult<Record> {
        let mut attributes = Self::writable(criteria, body);
        if self.descriptor.tracks_creator() {
            if let Some(actor) = actor {
                attributes.insert(self.descriptor.created_by_field.to_string(), Value::from(actor.id));
            }
        }
        let record = self.module(store).create(attributes).await?;
        let id = record
            .id()
            .ok_or_else(|| AppError::InternalError(format!("{} saved without id", self.descriptor.name)))?;
        tracing::info!(entity = self.descriptor.name, id, "Record created");
        self.reload(store, id).await
    }

    /// Assign the allowed body fields onto an authorized record and save.
    pub async fn execute_update(
        &self,
        store: &StoreHandle,
        criteria: &AccessCriteria,
        mut record: Record,
        body: Map<String, Value>,
    ) -> AppResult<Record> {
        record.assign(Self::writable(criteria, body));
        record.save().await?;
        let id = record.id().ok_or_else(|| AppError::InternalError("updated record without id".into()))?;
        tracing::info!(entity = self.descriptor.name, id, "Record updated");
        self.reload(store, id).await
    }

    // -- actions ------------------------------------------------------------

    /// List rows visible to the actor, narrowed by `filter`.
    pub async fn get_all(
        &self,
        store: &StoreHandle,
        actor: Option<&Actor>,
        filter: Filter,
        sort: SortKey,
        page: i64,
    ) -> AppResult<Listing> {
        let criteria = self.resolve_policy(actor, Verb::Read)?;
        let mut combined = criteria.filter.clone();
        combined.extend(filter);

        let module = self.module(store);
        let mut query = Query::filtered(combined.clone())
            .fields(criteria.fields.clone())
            .sort(sort);
        let pagination = match self.per_page {
            Some(per_page) => {
                let total = module.count(combined).await?;
                let pagination = Pagination::compute(total, per_page, page);
                query = query.limit(pagination.records_per_page).offset(pagination.offset());
                Some(pagination)
            }
            None => None,
        };

        // A page size of one still lists.
        let records = module.find(query).await?;
        Ok(Listing {
            pagination,
            data: records.iter().map(|r| r.project_within(&criteria.fields)).collect(),
        })
    }

    pub async fn get_by_id(
        &self,
        store: &StoreHandle,
        actor: Option<&Actor>,
        id: DbId,
    ) -> AppResult<Projection> {
        let criteria = self.resolve_policy(actor, Verb::Read)?;
        let record = self.authorize_row(store, &criteria, id).await?;
        Ok(record.project_within(&criteria.fields))
    }

    pub async fn create(
        &self,
        store: &StoreHandle,
        actor: Option<&Actor>,
        body: Map<String, Value>,
    ) -> AppResult<Record> {
        let criteria = self.resolve_policy(actor, Verb::Create)?;
        self.validate_input(Verb::Create, &body)?;
        self.execute_create(store, actor, &criteria, body).await
    }

    pub async fn update(
        &self,
        store: &StoreHandle,
        actor: Option<&Actor>,
        id: DbId,
        body: Map<String, Value>,
    ) -> AppResult<Record> {
        let criteria = self.resolve_policy(actor, Verb::Update)?;
        self.validate_input(Verb::Update, &body)?;
        let record = self.authorize_row(store, &criteria, id).await?;
        self.execute_update(store, &criteria, record, body).await
    }

    /// Delete an authorized row, returning the record as it was.
    pub async fn delete(
        &self,
        store: &StoreHandle,
        actor: Option<&Actor>,
        id: DbId,
    ) -> AppResult<Record> {
        let criteria = self.resolve_policy(actor, Verb::Delete)?;
        let mut record = self.authorize_row(store, &criteria, id).await?;
        record.delete().await?;
        tracing::info!(entity = self.descriptor.name, id, "Record deleted");
        Ok(record)
    }
}
