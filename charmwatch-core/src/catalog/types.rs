//! Catalog data types: package ids, change records, promulgation status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme prefix carried by charm store ids (e.g. `cs:trusty/mysql-12`)
pub const SCHEME_PREFIX: &str = "cs:";

/// Strip every leading `cs:` scheme prefix from a raw id.
///
/// Stripping repeatedly keeps the operation idempotent: normalizing an
/// already normalized id never changes it.
pub fn normalize(raw: &str) -> &str {
    let mut id = raw;
    while let Some(rest) = id.strip_prefix(SCHEME_PREFIX) {
        id = rest;
    }
    id
}

/// Parse the revision from the segment after the last `-`.
///
/// An id without `-` is parsed as a whole. Anything that is not an unsigned
/// integer yields `None`.
pub fn parse_revision(id: &str) -> Option<u64> {
    id.rsplit('-').next().and_then(|segment| segment.parse().ok())
}

/// Normalized identifier of a published package
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Build a package id from a raw feed id, stripping the scheme prefix
    pub fn parse(raw: &str) -> Self {
        Self(normalize(raw).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Revision suffix, if the id carries a numeric one
    pub fn revision(&self) -> Option<u64> {
        parse_revision(&self.0)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry of the `changes/published` feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Raw id as published, e.g. `cs:~user/xenial/foo-3`
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(
        rename = "PublishTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub publish_time: Option<String>,
}

impl ChangeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            publish_time: None,
        }
    }

    pub fn package_id(&self) -> PackageId {
        PackageId::parse(&self.id)
    }
}

/// Result of a `meta/promulgated` lookup
///
/// `Unknown` records a failed lookup. It is never treated as promulgated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Promulgation {
    Promulgated,
    NotPromulgated,
    Unknown,
}

impl Promulgation {
    pub fn is_promulgated(self) -> bool {
        matches!(self, Promulgation::Promulgated)
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Promulgation::Unknown)
    }
}

impl From<bool> for Promulgation {
    fn from(value: bool) -> Self {
        if value {
            Promulgation::Promulgated
        } else {
            Promulgation::NotPromulgated
        }
    }
}

/// Body of `GET {id}/meta/promulgated`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PromulgatedResponse {
    #[serde(rename = "Promulgated")]
    pub promulgated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_revision() {
        assert_eq!(parse_revision("foo-12"), Some(12));
        assert_eq!(parse_revision("foo-bar"), None);
        assert_eq!(parse_revision("justid"), None);
        assert_eq!(parse_revision("trusty/my-charm-0"), Some(0));
        assert_eq!(parse_revision("foo-"), None);
    }

    #[test]
    fn test_normalize_strips_scheme() {
        assert_eq!(normalize("cs:foo-0"), "foo-0");
        assert_eq!(normalize("cs:~user/xenial/bar-3"), "~user/xenial/bar-3");
        assert_eq!(normalize("foo-0"), "foo-0");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["cs:foo-0", "cs:cs:foo-1", "foo", "", "cs:", "xcs:foo"] {
            let once = normalize(raw);
            assert_eq!(normalize(once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_package_id_revision() {
        let id = PackageId::parse("cs:bar-3");
        assert_eq!(id.as_str(), "bar-3");
        assert_eq!(id.revision(), Some(3));
        assert_eq!(id.to_string(), "bar-3");
    }

    #[test]
    fn test_change_record_deserialize_ignores_unknown_fields() {
        let records: Vec<ChangeRecord> = serde_json::from_str(
            r#"[{"Id":"cs:foo-0","PublishTime":"2016-08-05T10:00:00Z","Extra":1},{"Id":"cs:bar-3"}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].package_id().as_str(), "foo-0");
        assert_eq!(
            records[0].publish_time.as_deref(),
            Some("2016-08-05T10:00:00Z")
        );
        assert_eq!(records[1].publish_time, None);
    }

    #[test]
    fn test_promulgation_from_bool() {
        assert!(Promulgation::from(true).is_promulgated());
        assert!(!Promulgation::from(false).is_promulgated());
        assert!(!Promulgation::Unknown.is_promulgated());
        assert!(Promulgation::Unknown.is_unknown());
    }
}
