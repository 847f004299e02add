//! Unit tests for the dispatch bounded context.

mod service_tests;
mod state_transition_tests;
