//! Cross-deployment image-version comparison.
//!
//! Integration glue: fetch each sibling deployment's job definitions over
//! HTTP, pull out the image strings, and report per-job versions side by
//! side. A peer that cannot be reached is reported inline rather than
//! failing the whole comparison.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::config::PeerDeployment;

/// Per-job image versions across deployments.
#[derive(Debug, Serialize)]
pub struct ComponentVersions {
    pub job_type: String,
    /// namespace -> image string (or an error note for unreachable peers)
    pub versions: BTreeMap<String, String>,
    pub in_sync: bool,
}

/// Image string per job type for one deployment, pulled from its job-defs
/// payload.
pub fn image_map(defs: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    if let Value::Object(map) = defs {
        for (job, def) in map {
            if let Some(image) = def.get("IMAGE").and_then(Value::as_str) {
                out.insert(job.clone(), image.to_string());
            }
        }
    }

    out
}

/// Merge the local image map with each peer's into a per-job comparison.
/// A job is in sync when every deployment that knows it reports the same
/// image and no deployment errored for it.
pub fn compare(
    local_namespace: &str,
    local: BTreeMap<String, String>,
    peers: Vec<(String, Result<BTreeMap<String, String>, String>)>,
) -> Vec<ComponentVersions> {
    let mut by_namespace: Vec<(String, BTreeMap<String, String>)> = Vec::new();
    let mut failed: Vec<(String, String)> = Vec::new();

    by_namespace.push((local_namespace.to_string(), local));
    for (namespace, result) in peers {
        match result {
            Ok(map) => by_namespace.push((namespace, map)),
            Err(cause) => failed.push((namespace, cause)),
        }
    }

    let job_types: BTreeSet<String> = by_namespace
        .iter()
        .flat_map(|(_, map)| map.keys().cloned())
        .collect();

    job_types
        .into_iter()
        .map(|job_type| {
            let mut versions = BTreeMap::new();
            let mut seen = BTreeSet::new();

            for (namespace, map) in &by_namespace {
                if let Some(image) = map.get(&job_type) {
                    versions.insert(namespace.clone(), image.clone());
                    seen.insert(image.clone());
                }
            }
            for (namespace, cause) in &failed {
                versions.insert(namespace.clone(), format!("error: {cause}"));
            }

            let in_sync = seen.len() == 1 && failed.is_empty();

            ComponentVersions {
                job_type,
                versions,
                in_sync,
            }
        })
        .collect()
}

/// Fetch a peer's job definitions with its bearer token.
pub async fn fetch_peer_defs(
    client: &reqwest::Client,
    peer: &PeerDeployment,
) -> Result<BTreeMap<String, String>, String> {
    let url = format!("{}/get_job_defs", peer.url.trim_end_matches('/'));

    let response = client
        .get(&url)
        .bearer_auth(&peer.token)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("peer returned {}", response.status()));
    }

    let defs: Value = response.json().await.map_err(|e| e.to_string())?;
    Ok(image_map(&defs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defs() -> Value {
        json!({
            "staging": { "IMAGE": "containers.renci.org/eds/stagedata:v1.0.0" },
            "hazus": { "IMAGE": "containers.renci.org/eds/adras:v2.0.0" },
            "no-image-job": { "COMMAND_LINE": [] }
        })
    }

    #[test]
    fn image_map_skips_defs_without_an_image() {
        let map = image_map(&defs());
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get("staging").map(String::as_str),
            Some("containers.renci.org/eds/stagedata:v1.0.0")
        );
    }

    #[test]
    fn matching_versions_are_in_sync() {
        let local = image_map(&defs());
        let peer = image_map(&defs());

        let report = compare("dev", local, vec![("prod".to_string(), Ok(peer))]);

        assert!(report.iter().all(|c| c.in_sync));
        let staging = report.iter().find(|c| c.job_type == "staging").unwrap();
        assert_eq!(staging.versions.len(), 2);
    }

    #[test]
    fn drifted_version_is_flagged() {
        let local = image_map(&defs());
        let mut peer = image_map(&defs());
        peer.insert(
            "staging".to_string(),
            "containers.renci.org/eds/stagedata:v1.1.0".to_string(),
        );

        let report = compare("dev", local, vec![("prod".to_string(), Ok(peer))]);

        let staging = report.iter().find(|c| c.job_type == "staging").unwrap();
        assert!(!staging.in_sync);
        let hazus = report.iter().find(|c| c.job_type == "hazus").unwrap();
        assert!(hazus.in_sync);
    }

    #[test]
    fn unreachable_peer_is_reported_inline() {
        let local = image_map(&defs());

        let report = compare(
            "dev",
            local,
            vec![("prod".to_string(), Err("connection refused".to_string()))],
        );

        let staging = report.iter().find(|c| c.job_type == "staging").unwrap();
        assert!(!staging.in_sync);
        assert_eq!(
            staging.versions.get("prod").map(String::as_str),
            Some("error: connection refused")
        );
    }
}
