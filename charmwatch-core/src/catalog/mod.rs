//! Charm store catalog access
//!
//! # Overview
//!
//! The catalog module wraps the two charm store endpoints a report run needs:
//!
//! ```text
//! {base}/changes/published?start=DATE&stop=DATE   ← packages published that day
//! {base}/{id}/meta/promulgated                     ← {"Promulgated": bool}
//! ```
//!
//! [`CatalogSource`] is the seam the classifier and orchestrator depend on;
//! [`CharmStoreClient`] is the HTTP implementation.

mod client;
mod types;

pub use client::{CatalogSource, CharmStoreClient};
pub use types::{normalize, parse_revision, ChangeRecord, PackageId, Promulgation, SCHEME_PREFIX};
