//! Authenticated caller identity and role claims.

use crate::dispatch::domain::TechnicianId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an authenticated user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Roles carried as claims on the authentication token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Universal override; bypasses role checks but never state rules.
    Admin,
    /// Creates tasks and manages assignments.
    Dispatcher,
    /// Monitors workload and task progress.
    Supervisor,
    /// Executes assigned tasks in the field.
    Technician,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Dispatcher => "dispatcher",
            Self::Supervisor => "supervisor",
            Self::Technician => "technician",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "admin" => Ok(Self::Admin),
            "dispatcher" => Ok(Self::Dispatcher),
            "supervisor" => Ok(Self::Supervisor),
            "technician" => Ok(Self::Technician),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned while parsing roles from token claims.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// Authenticated caller credentials.
///
/// The technician identity is a first-class claim rather than something
/// derived from a username, so ownership checks compare typed identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    roles: Vec<Role>,
    technician_id: Option<TechnicianId>,
}

impl Principal {
    /// Creates a principal with the given identity and role claims.
    #[must_use]
    pub fn new(user_id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id,
            roles: roles.into_iter().collect(),
            technician_id: None,
        }
    }

    /// Attaches the technician identity claim.
    #[must_use]
    pub fn with_technician_id(mut self, technician_id: TechnicianId) -> Self {
        self.technician_id = Some(technician_id);
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the role claims.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns the technician identity claim, if present.
    #[must_use]
    pub const fn technician_id(&self) -> Option<TechnicianId> {
        self.technician_id
    }

    /// Returns `true` when the principal carries the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
