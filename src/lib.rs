//! Reconciles part transactions against certification master data and builds the customs and
//! certification report workbook.
//!
//! The core is synchronous and works on already-parsed `Table`s:
//! [`catalog::ReferenceCatalog`] joins the master and model tables,
//! [`manual::ManualEntryStore`] holds hand-entered rows, [`reconcile::merge`] joins transactions
//! to the catalog, [`summary`] aggregates the merged rows and [`report::export`] packages the four
//! output sheets. [`session::Session`] ties these together for one run.

pub mod args;
pub mod catalog;
pub mod commands;
mod config;
mod error;
pub mod manual;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod session;
pub mod source;
pub mod summary;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{Error, ReconError, ReconResult, Result};
