//! Report run orchestration
//!
//! A run walks a fixed sequence of stages:
//!
//! ```text
//! Start → FetchChanges → Classify → Render → Persist → RepublishPointer → Done
//!              │
//!              └─ feed unavailable ─→ Failed (nothing written)
//! ```
//!
//! Any stage error also ends in `Failed`. The run owns its [`Diagnostics`]
//! sink for its whole duration.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::catalog::{CatalogSource, CharmStoreClient};
use crate::classify::{classify, Category, Classification};
use crate::config::RunConfig;
use crate::diagnostics::Diagnostics;
use crate::error::RunError;
use crate::{publish, report};

/// Stages of a report run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Start,
    FetchChanges,
    Classify,
    Render,
    Persist,
    RepublishPointer,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Start => "start",
            RunStage::FetchChanges => "fetch-changes",
            RunStage::Classify => "classify",
            RunStage::Render => "render",
            RunStage::Persist => "persist",
            RunStage::RepublishPointer => "republish-pointer",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Per-category package counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub new_promulgated: usize,
    pub new_community: usize,
    pub updated_promulgated: usize,
    pub updated_community: usize,
}

impl From<&Classification> for CategoryCounts {
    fn from(c: &Classification) -> Self {
        Self {
            new_promulgated: c.ids(Category::NewPromulgated).len(),
            new_community: c.ids(Category::NewCommunity).len(),
            updated_promulgated: c.ids(Category::UpdatedPromulgated).len(),
            updated_community: c.ids(Category::UpdatedCommunity).len(),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub report_path: PathBuf,
    pub pointer_path: PathBuf,
    pub changes: usize,
    pub counts: CategoryCounts,
    /// Packages whose promulgation lookup failed
    pub unknown_promulgation: usize,
    #[serde(skip)]
    pub classification: Classification,
}

/// Drives one report run against a catalog source
pub struct Orchestrator {
    config: RunConfig,
    source: Box<dyn CatalogSource>,
}

impl Orchestrator {
    /// Validate `config` and connect to the configured charm store
    pub fn new(config: RunConfig) -> Result<Self, RunError> {
        config.validate()?;
        let client = CharmStoreClient::new(&config.catalog)?;
        Ok(Self::with_source(config, Box::new(client)))
    }

    /// Use a custom catalog source
    pub fn with_source(config: RunConfig, source: Box<dyn CatalogSource>) -> Self {
        Self { config, source }
    }

    /// Generate the report for today's local date
    pub async fn run_today(&self) -> Result<RunSummary, RunError> {
        self.run(Local::now().date_naive()).await
    }

    /// Generate the report for `date`
    pub async fn run(&self, date: NaiveDate) -> Result<RunSummary, RunError> {
        self.config.validate()?;
        let _diagnostics =
            Diagnostics::open(self.config.log_file.as_deref(), &self.config.log_level)?;

        info!("Started report run for {} using {}", date, self.source.name());

        let mut stage = RunStage::Start;
        match self.run_stages(date, &mut stage).await {
            Ok(summary) => {
                enter(&mut stage, RunStage::Done);
                info!(
                    "Finished report run for {}: {} packages, report at {}",
                    date,
                    summary.classification.total(),
                    summary.report_path.display()
                );
                Ok(summary)
            }
            Err(e) => {
                let failed_at = stage;
                enter(&mut stage, RunStage::Failed);
                error!("Report run for {} failed during {}: {:#}", date, failed_at, e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        date: NaiveDate,
        stage: &mut RunStage,
    ) -> Result<RunSummary, RunError> {
        let day = date.format("%Y-%m-%d").to_string();
        let report_config = &self.config.report;

        enter(stage, RunStage::FetchChanges);
        let records = self
            .source
            .fetch_changes(date)
            .await?
            .ok_or(RunError::UpstreamUnavailable { date })?;

        enter(stage, RunStage::Classify);
        let classification =
            classify(self.source.as_ref(), &records, self.config.lookup_concurrency).await;

        enter(stage, RunStage::Render);
        let html = report::render(&classification, &day, report_config.row_width)?;

        enter(stage, RunStage::Persist);
        let file_name = publish::report_file_name(&report_config.prefix, date);
        let report_path = publish::write_report(&report_config.output_dir, &file_name, &html)?;

        enter(stage, RunStage::RepublishPointer);
        let pointer_path = publish::republish_pointer(&report_config.output_dir, &file_name)?;

        Ok(RunSummary {
            date,
            report_path,
            pointer_path,
            changes: records.len(),
            counts: CategoryCounts::from(&classification),
            unknown_promulgation: classification.unknown_promulgation(),
            classification,
        })
    }
}

fn enter(stage: &mut RunStage, next: RunStage) {
    debug!("Run stage {} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(RunStage::FetchChanges.to_string(), "fetch-changes");
        assert_eq!(RunStage::RepublishPointer.to_string(), "republish-pointer");
    }

    #[test]
    fn test_enter_updates_stage() {
        let mut stage = RunStage::Start;
        enter(&mut stage, RunStage::Classify);
        assert_eq!(stage, RunStage::Classify);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = RunConfig::default();
        config.report.row_width = 0;
        assert!(matches!(
            Orchestrator::new(config),
            Err(RunError::Config(_))
        ));
    }
}
