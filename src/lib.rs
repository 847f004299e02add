//! Foreman: field-service task assignment and lifecycle engine.
//!
//! This crate implements the core of a field-service dispatch system:
//! dispatchers create service tasks and assign them to technicians,
//! technicians report progress, and supervisors monitor workload. The crate
//! covers the task status state machine, the transactional assignment
//! ledger with its append-only audit trail, the workload advisory, and the
//! role-based authorization guard. HTTP routing, schema migrations,
//! geospatial lookups, and notification transports stay outside the crate
//! boundary and are consumed through ports.
//!
//! # Architecture
//!
//! Foreman follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, fakes)
//!
//! # Modules
//!
//! - [`auth`]: Caller identity, roles, and the authorization guard
//! - [`dispatch`]: Task lifecycle, assignment ledger, and orchestration

pub mod auth;
pub mod dispatch;
