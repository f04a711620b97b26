//! Well-known roles and the acting identity.
//!
//! Role names must match the values stored in `users.role`.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLE_GUEST: &str = "guest";

/// The three standard roles every access policy is declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    /// Map a stored role name to a [`Role`].
    ///
    /// Unknown names fall back to [`Role::Guest`] so an unrecognised role
    /// never gains more than anonymous access.
    pub fn from_name(name: &str) -> Self {
        match name {
            ROLE_ADMIN => Role::Admin,
            ROLE_USER => Role::User,
            _ => Role::Guest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::User => ROLE_USER,
            Role::Guest => ROLE_GUEST,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity an action runs on behalf of.
///
/// Anonymous access is modelled as `Option<&Actor>` being `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: String,
}

impl Actor {
    pub fn new(id: DbId, role: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
        }
    }

    pub fn role(&self) -> Role {
        Role::from_name(&self.role)
    }
}

/// Resolve the effective role of a possibly anonymous actor.
pub fn role_of(actor: Option<&Actor>) -> Role {
    actor.map_or(Role::Guest, Actor::role)
}
