//! Role-scoped access rules.
//!
//! An [`AccessRule`] declares, for one role and one entity type, up to four
//! criteria templates (create / read / update / delete). Resolving a slot for
//! an actor produces an [`AccessCriteria`]: the fields the actor may touch and
//! the row filter that scopes which rows are visible. A missing slot means the
//! verb is denied outright.
//!
//! Templates may reference the acting user through
//! [`TemplateValue::ActorIdentity`]. It is replaced with the actor's id at
//! resolution time, or with [`FilterValue::Unbound`] for anonymous actors so
//! owner-scoped rules match nothing rather than everything.

use crate::error::CoreError;
use crate::filter::{Filter, FilterNode, FilterValue, Operator, Scalar, Where};
use crate::roles::{role_of, Actor, Role};

// ---------------------------------------------------------------------------
// Verbs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Create, Verb::Read, Verb::Update, Verb::Delete];

    fn slot(self) -> usize {
        match self {
            Verb::Create => 0,
            Verb::Read => 1,
            Verb::Update => 2,
            Verb::Delete => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Value side of a template predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Literal(FilterValue),
    /// Replaced with the acting user's id when the template is resolved.
    ActorIdentity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePredicate {
    pub field: String,
    pub operator: Operator,
    pub value: TemplateValue,
}

impl TemplatePredicate {
    pub fn literal(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: TemplateValue::Literal(value.into()),
        }
    }

    /// `field = <acting user id>`.
    pub fn owned_by(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Eq,
            value: TemplateValue::ActorIdentity,
        }
    }

    fn resolve(&self, actor: Option<&Actor>) -> Where {
        let value = match &self.value {
            TemplateValue::Literal(v) => v.clone(),
            TemplateValue::ActorIdentity => match actor {
                Some(a) => FilterValue::Scalar(Scalar::Int(a.id)),
                None => FilterValue::Unbound,
            },
        };
        Where {
            field: self.field.clone(),
            operator: self.operator,
            value,
        }
    }
}

/// One element of a template AND chain.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Where(TemplatePredicate),
    AnyOf(Vec<TemplatePredicate>),
}

impl From<TemplatePredicate> for TemplateNode {
    fn from(p: TemplatePredicate) -> Self {
        TemplateNode::Where(p)
    }
}

/// Template filter restricting rows to those owned by the actor.
pub fn owner_scope(created_by_field: &str) -> Vec<TemplateNode> {
    vec![TemplatePredicate::owned_by(created_by_field).into()]
}

/// An unresolved criteria slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaTemplate {
    pub fields: Vec<String>,
    pub filter: Vec<TemplateNode>,
}

// ---------------------------------------------------------------------------
// Resolved criteria
// ---------------------------------------------------------------------------

/// Resolved, actor-bound access criteria for one verb.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessCriteria {
    /// Fields the actor may read or write, in declaration order.
    pub fields: Vec<String>,
    /// Row filter every statement of the action must include.
    pub filter: Filter,
}

impl AccessCriteria {
    pub fn allows(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// Four-slot access declaration for one role on one entity type.
#[derive(Debug, Clone)]
pub struct AccessRule {
    declared_fields: Vec<String>,
    slots: [Option<CriteriaTemplate>; 4],
}

impl AccessRule {
    /// An empty rule set: every verb is denied until a slot is set.
    pub fn new(declared_fields: &[&str]) -> Self {
        Self {
            declared_fields: declared_fields.iter().map(|f| f.to_string()).collect(),
            slots: Default::default(),
        }
    }

    /// Configure the slot for `verb`. An empty `fields` list means every
    /// declared field.
    pub fn set(&mut self, verb: Verb, fields: &[&str], filter: Vec<TemplateNode>) -> &mut Self {
        let fields = if fields.is_empty() {
            self.declared_fields.clone()
        } else {
            fields.iter().map(|f| f.to_string()).collect()
        };
        self.slots[verb.slot()] = Some(CriteriaTemplate { fields, filter });
        self
    }

    pub fn set_create(&mut self, fields: &[&str], filter: Vec<TemplateNode>) -> &mut Self {
        self.set(Verb::Create, fields, filter)
    }

    pub fn set_read(&mut self, fields: &[&str], filter: Vec<TemplateNode>) -> &mut Self {
        self.set(Verb::Read, fields, filter)
    }

    pub fn set_update(&mut self, fields: &[&str], filter: Vec<TemplateNode>) -> &mut Self {
        self.set(Verb::Update, fields, filter)
    }

    pub fn set_delete(&mut self, fields: &[&str], filter: Vec<TemplateNode>) -> &mut Self {
        self.set(Verb::Delete, fields, filter)
    }

    /// Deny `verb` unconditionally.
    pub fn remove(&mut self, verb: Verb) -> &mut Self {
        self.slots[verb.slot()] = None;
        self
    }

    pub fn remove_create(&mut self) -> &mut Self {
        self.remove(Verb::Create)
    }

    pub fn remove_read(&mut self) -> &mut Self {
        self.remove(Verb::Read)
    }

    pub fn remove_update(&mut self) -> &mut Self {
        self.remove(Verb::Update)
    }

    pub fn remove_delete(&mut self) -> &mut Self {
        self.remove(Verb::Delete)
    }

    pub fn remove_all(&mut self) -> &mut Self {
        for verb in Verb::ALL {
            self.remove(verb);
        }
        self
    }

    pub fn template(&self, verb: Verb) -> Option<&CriteriaTemplate> {
        self.slots[verb.slot()].as_ref()
    }

    /// Resolve the slot for `verb`. `None` means the verb is forbidden.
    pub fn resolve(&self, verb: Verb, actor: Option<&Actor>) -> Option<AccessCriteria> {
        let template = self.template(verb)?;
        let filter = template
            .filter
            .iter()
            .map(|node| match node {
                TemplateNode::Where(p) => FilterNode::Where(p.resolve(actor)),
                TemplateNode::AnyOf(group) => {
                    FilterNode::AnyOf(group.iter().map(|p| p.resolve(actor)).collect())
                }
            })
            .collect();

        Some(AccessCriteria {
            fields: template.fields.clone(),
            filter,
        })
    }

    pub fn resolve_create(&self, actor: Option<&Actor>) -> Option<AccessCriteria> {
        self.resolve(Verb::Create, actor)
    }

    pub fn resolve_read(&self, actor: Option<&Actor>) -> Option<AccessCriteria> {
        self.resolve(Verb::Read, actor)
    }

    pub fn resolve_update(&self, actor: Option<&Actor>) -> Option<AccessCriteria> {
        self.resolve(Verb::Update, actor)
    }

    pub fn resolve_delete(&self, actor: Option<&Actor>) -> Option<AccessCriteria> {
        self.resolve(Verb::Delete, actor)
    }
}

// ---------------------------------------------------------------------------
// Policy (one rule set per role)
// ---------------------------------------------------------------------------

/// Access rules for every standard role on one entity type.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin: AccessRule,
    user: AccessRule,
    guest: AccessRule,
}

impl AccessPolicy {
    /// The standard convention shared by all entity types:
    ///
    /// - `admin`: unrestricted on all four verbs.
    /// - `user`: full create; read/update/delete limited to own rows.
    /// - `guest`: nothing.
    pub fn standard(declared_fields: &[&str], created_by_field: &str) -> Self {
        let mut admin = AccessRule::new(declared_fields);
        admin
            .set_create(&[], vec![])
            .set_read(&[], vec![])
            .set_update(&[], vec![])
            .set_delete(&[], vec![]);

        let mut user = AccessRule::new(declared_fields);
        user.set_create(&[], vec![])
            .set_read(&[], owner_scope(created_by_field))
            .set_update(&[], owner_scope(created_by_field))
            .set_delete(&[], owner_scope(created_by_field));

        let guest = AccessRule::new(declared_fields);

        Self { admin, user, guest }
    }

    pub fn rule(&self, role: Role) -> &AccessRule {
        match role {
            Role::Admin => &self.admin,
            Role::User => &self.user,
            Role::Guest => &self.guest,
        }
    }

    pub fn admin_mut(&mut self) -> &mut AccessRule {
        &mut self.admin
    }

    pub fn user_mut(&mut self) -> &mut AccessRule {
        &mut self.user
    }

    pub fn guest_mut(&mut self) -> &mut AccessRule {
        &mut self.guest
    }

    /// Resolve criteria for the actor's role, or fail with the access
    /// denial appropriate for the actor (401 anonymous, 403 authenticated).
    pub fn authorize(&self, actor: Option<&Actor>, verb: Verb) -> Result<AccessCriteria, CoreError> {
        self.rule(role_of(actor))
            .resolve(verb, actor)
            .ok_or_else(|| CoreError::access_denied(actor.is_some()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const FIELDS: &[&str] = &["id", "title", "status", "createdById", "createdAt"];

    fn policy() -> AccessPolicy {
        AccessPolicy::standard(FIELDS, "createdById")
    }

    #[test]
    fn unset_slots_resolve_to_nothing_for_every_verb() {
        let p = policy();
        for verb in Verb::ALL {
            assert!(p.rule(Role::Guest).resolve(verb, None).is_none());
        }
    }

    #[test]
    fn unset_slot_denies_with_401_for_anonymous() {
        let p = policy();
        assert_matches!(p.authorize(None, Verb::Read), Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn removed_slot_denies_with_403_for_authenticated() {
        let mut p = policy();
        p.user_mut().remove_delete();
        let actor = Actor::new(7, "user");
        assert_matches!(
            p.authorize(Some(&actor), Verb::Delete),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn owner_scope_binds_actor_identity() {
        let p = policy();
        let actor = Actor::new(42, "user");
        let criteria = p.authorize(Some(&actor), Verb::Update).unwrap();
        assert_eq!(criteria.filter.to_string(), "createdById = 42");
    }

    #[test]
    fn owner_scope_without_actor_matches_nothing() {
        let p = policy();
        let criteria = p.rule(Role::User).resolve_read(None).unwrap();
        let only = criteria.filter.predicates().next().unwrap();
        assert_eq!(only.value, FilterValue::Unbound);
        assert_eq!(criteria.filter.to_sql(1).text, "FALSE");
    }

    #[test]
    fn empty_field_list_means_all_declared_fields() {
        let p = policy();
        let actor = Actor::new(1, "admin");
        let criteria = p.authorize(Some(&actor), Verb::Read).unwrap();
        assert_eq!(criteria.fields, FIELDS);
        assert!(criteria.filter.is_empty());
    }

    #[test]
    fn explicit_fields_restrict_projection() {
        let mut p = policy();
        p.user_mut().set_update(&["title"], owner_scope("createdById"));
        let actor = Actor::new(3, "user");
        let criteria = p.authorize(Some(&actor), Verb::Update).unwrap();
        assert!(criteria.allows("title"));
        assert!(!criteria.allows("status"));
    }

    #[test]
    fn or_groups_resolve_recursively_preserving_shape() {
        let mut p = policy();
        p.user_mut().set_read(
            &[],
            vec![
                TemplateNode::AnyOf(vec![
                    TemplatePredicate::owned_by("createdById"),
                    TemplatePredicate::literal("status", Operator::Eq, "active"),
                ]),
                TemplatePredicate::literal("id", Operator::Gt, 0).into(),
            ],
        );
        let actor = Actor::new(9, "user");
        let criteria = p.authorize(Some(&actor), Verb::Read).unwrap();
        assert_eq!(
            criteria.filter.to_string(),
            "(createdById = 9 OR status = \"active\") AND id > 0"
        );
    }

    #[test]
    fn remove_all_clears_every_slot() {
        let mut p = policy();
        p.admin_mut().remove_all();
        let admin = Actor::new(1, "admin");
        for verb in Verb::ALL {
            assert_matches!(p.authorize(Some(&admin), verb), Err(CoreError::Forbidden(_)));
        }
    }

    #[test]
    fn unknown_role_gets_guest_rules() {
        let mut p = policy();
        p.guest_mut().set_read(&[], vec![]);
        let odd = Actor::new(5, "moderator");
        assert!(p.authorize(Some(&odd), Verb::Read).is_ok());
        assert_matches!(p.authorize(Some(&odd), Verb::Create), Err(CoreError::Forbidden(_)));
    }
}
