//! Change classification
//!
//! Enriches each change record with its revision and promulgation status and
//! partitions the packages into four disjoint categories:
//!
//! | revision | promulgated | category             |
//! |----------|-------------|----------------------|
//! | 0        | yes         | new promulgated      |
//! | 0        | no/unknown  | new community        |
//! | other    | yes         | updated promulgated  |
//! | other    | no/unknown  | updated community    |
//!
//! A missing or non-numeric revision counts as "updated".

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::catalog::{CatalogSource, ChangeRecord, PackageId, Promulgation};

/// Per-package facts gathered during classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub revision: Option<u64>,
    pub promulgation: Promulgation,
}

impl PackageInfo {
    pub fn is_new(&self) -> bool {
        self.revision == Some(0)
    }

    pub fn category(&self) -> Category {
        match (self.is_new(), self.promulgation.is_promulgated()) {
            (true, true) => Category::NewPromulgated,
            (true, false) => Category::NewCommunity,
            (false, true) => Category::UpdatedPromulgated,
            (false, false) => Category::UpdatedCommunity,
        }
    }
}

/// One of the four report buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NewPromulgated,
    NewCommunity,
    UpdatedPromulgated,
    UpdatedCommunity,
}

impl Category {
    /// Report order
    pub const ALL: [Category; 4] = [
        Category::NewPromulgated,
        Category::NewCommunity,
        Category::UpdatedPromulgated,
        Category::UpdatedCommunity,
    ];
}

/// Packages partitioned into the four categories, in feed order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    pub new_promulgated: Vec<PackageId>,
    pub new_community: Vec<PackageId>,
    pub updated_promulgated: Vec<PackageId>,
    pub updated_community: Vec<PackageId>,
    #[serde(skip)]
    infos: HashMap<PackageId, PackageInfo>,
}

impl Classification {
    /// Partition packages in the given order.
    ///
    /// A repeated id keeps the position of its first occurrence and the info
    /// of its last.
    pub fn from_infos<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (PackageId, PackageInfo)>,
    {
        let mut order = Vec::new();
        let mut infos = HashMap::new();

        for (id, info) in entries {
            if infos.insert(id.clone(), info).is_some() {
                debug!("Duplicate change for {}; keeping the latest", id);
            } else {
                order.push(id);
            }
        }

        let mut result = Classification {
            infos,
            ..Default::default()
        };

        for id in order {
            let category = result.infos[&id].category();
            result.bucket_mut(category).push(id);
        }

        result
    }

    pub fn ids(&self, category: Category) -> &[PackageId] {
        match category {
            Category::NewPromulgated => &self.new_promulgated,
            Category::NewCommunity => &self.new_community,
            Category::UpdatedPromulgated => &self.updated_promulgated,
            Category::UpdatedCommunity => &self.updated_community,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<PackageId> {
        match category {
            Category::NewPromulgated => &mut self.new_promulgated,
            Category::NewCommunity => &mut self.new_community,
            Category::UpdatedPromulgated => &mut self.updated_promulgated,
            Category::UpdatedCommunity => &mut self.updated_community,
        }
    }

    pub fn info(&self, id: &PackageId) -> Option<&PackageInfo> {
        self.infos.get(id)
    }

    /// Number of distinct packages
    pub fn total(&self) -> usize {
        self.infos.len()
    }

    /// Packages whose promulgation lookup failed
    pub fn unknown_promulgation(&self) -> usize {
        self.infos
            .values()
            .filter(|info| info.promulgation.is_unknown())
            .count()
    }
}

/// Classify the changes feed, querying `source` once per record.
///
/// With `concurrency` of 1 the lookups run strictly in sequence; larger
/// values keep up to that many lookups in flight. Results keep feed order
/// either way.
pub async fn classify(
    source: &dyn CatalogSource,
    records: &[ChangeRecord],
    concurrency: usize,
) -> Classification {
    let ids: Vec<PackageId> = records.iter().map(ChangeRecord::package_id).collect();

    let lookups: Vec<Promulgation> = stream::iter(ids.iter().map(|id| source.fetch_promulgation(id)))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let entries = ids.into_iter().zip(lookups).map(|(id, promulgation)| {
        if promulgation.is_unknown() {
            warn!("Promulgation unknown for {}; treating as community", id);
        }
        let info = PackageInfo {
            revision: id.revision(),
            promulgation,
        };
        (id, info)
    });

    let classification = Classification::from_infos(entries);

    debug!(
        "Classified {} packages via {}: {} new promulgated, {} new community, {} updated promulgated, {} updated community",
        classification.total(),
        source.name(),
        classification.new_promulgated.len(),
        classification.new_community.len(),
        classification.updated_promulgated.len(),
        classification.updated_community.len()
    );

    classification
}
