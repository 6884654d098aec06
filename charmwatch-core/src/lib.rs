//! charmwatch core library
//!
//! Fetches the charm store's daily changes feed, classifies each published
//! package as new or updated and promulgated or community, and publishes a
//! static HTML report with a `new.html` pointer to the latest one.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod orchestrator;
pub mod publish;
pub mod report;

pub use catalog::{CatalogSource, ChangeRecord, CharmStoreClient, PackageId, Promulgation};
pub use classify::{classify, Category, Classification, PackageInfo};
pub use config::RunConfig;
pub use error::{CatalogError, ConfigError, RunError};
pub use orchestrator::{Orchestrator, RunStage, RunSummary};
