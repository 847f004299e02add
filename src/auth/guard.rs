//! Role-based authorization guard for dispatch operations.

use super::{error::AccessError, principal::Principal, principal::Role};
use std::fmt;

/// Guarded dispatch operations and their required role sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a new service task.
    CreateTask,
    /// Assign a task to a technician.
    AssignTask,
    /// Reassign a task to a different technician.
    ReassignTask,
    /// Report progress on an assigned task.
    UpdateTaskStatus,
    /// List and filter tasks.
    ListTasks,
}

impl Operation {
    /// Returns the roles permitted to perform this operation.
    ///
    /// An empty slice means any authenticated principal is allowed.
    #[must_use]
    pub const fn required_roles(self) -> &'static [Role] {
        match self {
            Self::CreateTask | Self::AssignTask | Self::ReassignTask => &[Role::Dispatcher],
            Self::UpdateTaskStatus => &[Role::Technician],
            Self::ListTasks => &[],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateTask => "create task",
            Self::AssignTask => "assign task",
            Self::ReassignTask => "reassign task",
            Self::UpdateTaskStatus => "update task status",
            Self::ListTasks => "list tasks",
        };
        write!(f, "{name}")
    }
}

/// Fail-closed role check applied before any business logic executes.
///
/// The guard receives caller credentials explicitly; a missing principal is
/// rejected before the role table is consulted, and `ADMIN` overrides role
/// requirements unconditionally. The override never extends to state-machine
/// or ownership rules, which live in the domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGuard;

impl AuthorizationGuard {
    /// Creates a guard with the built-in role table.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Authorizes `caller` for `operation`, returning the principal on
    /// success so callers can read its identity claims.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] when no principal is
    /// supplied, or [`AccessError::Forbidden`] when the principal holds
    /// neither `ADMIN` nor one of the operation's required roles.
    pub fn authorize<'p>(
        &self,
        caller: Option<&'p Principal>,
        operation: Operation,
    ) -> Result<&'p Principal, AccessError> {
        let principal = caller.ok_or(AccessError::Unauthenticated)?;

        if principal.has_role(Role::Admin) {
            return Ok(principal);
        }

        let required = operation.required_roles();
        if required.is_empty() || required.iter().any(|role| principal.has_role(*role)) {
            return Ok(principal);
        }

        Err(AccessError::Forbidden { operation })
    }
}
