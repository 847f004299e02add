//! Field-service task assignment and lifecycle engine.
//!
//! The bounded context is split hexagonally: `domain` holds the task
//! aggregate, the assignment ledger, and the status state machine;
//! `ports` defines the persistence, identity-store, and notification
//! seams; `adapters` provides in-memory and PostgreSQL implementations;
//! `services` orchestrates operations behind the authorization guard.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
