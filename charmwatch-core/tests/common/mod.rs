//! Shared helpers for charmwatch-core integration tests

use charmwatch_core::RunConfig;
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a changes feed for `date` listing `ids`
pub async fn mount_changes(server: &MockServer, date: &str, ids: &[&str]) {
    let body: Vec<_> = ids.iter().map(|id| json!({ "Id": id })).collect();

    Mock::given(method("GET"))
        .and(path("/changes/published"))
        .and(query_param("start", date))
        .and(query_param("stop", date))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a `meta/promulgated` answer for a normalized id
pub async fn mount_promulgated(server: &MockServer, id: &str, promulgated: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/{id}/meta/promulgated")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Promulgated": promulgated })))
        .mount(server)
        .await;
}

/// Config pointing at `server`, writing into `output_dir`, no log file
pub fn test_config(server: &MockServer, output_dir: &Path) -> RunConfig {
    let mut config = RunConfig::default();
    config.catalog.base_url = server.uri();
    config.catalog.timeout_seconds = 5;
    config.report.output_dir = output_dir.to_path_buf();
    config.report.prefix = "whats-new".to_string();
    config.log_file = None;
    config.log_level = "debug".to_string();
    config
}
