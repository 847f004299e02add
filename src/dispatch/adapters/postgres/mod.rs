//! `PostgreSQL` adapters for dispatch persistence.

mod models;
mod repository;
mod schema;

pub use repository::{DispatchPgPool, PgDispatchRepository};
