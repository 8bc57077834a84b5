//! prepcat - exam-preparation catalog search engine
//!
//! Faceted search, ranking, trending analytics and side-by-side comparison
//! over a catalog of subjects held by an external [`catalog::CatalogStore`].

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod search;
pub mod test_utils;

pub use error::{PrepError, Result};
