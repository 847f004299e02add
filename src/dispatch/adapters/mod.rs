//! Adapter implementations of the dispatch ports.

pub mod memory;
pub mod postgres;
