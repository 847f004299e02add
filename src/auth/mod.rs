//! Caller identity and role-based authorization.
//!
//! Every mutating dispatch operation is gated by [`AuthorizationGuard`]
//! before any business logic runs. Caller credentials are passed explicitly
//! as a [`Principal`] rather than read from an ambient security context, so
//! the guard can be exercised in tests without a request framework.

mod error;
mod guard;
mod principal;

pub use error::AccessError;
pub use guard::{AuthorizationGuard, Operation};
pub use principal::{ParseRoleError, Principal, Role, UserId};
