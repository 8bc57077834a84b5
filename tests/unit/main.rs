//! Engine-level tests against the in-memory catalog.

#[path = "../common/mod.rs"]
mod common;

mod cancellation_tests;
mod config_tests;
mod search_tests;
