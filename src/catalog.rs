//! Catalog discovery: which repository serves a language + organization,
//! and which release tag/ZIP URL to fetch it at.
//!
//! Results are cached for an hour under `catalog:{lang}:{org}:{stage}`.
//! A failing catalog host yields an empty list, never an error — one
//! unreachable organization must not abort discovery across others.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{catalog_key, TieredCache};
use crate::client::RemoteSource;
use crate::models::CatalogEntry;
use crate::tracer::Tracer;

/// Subjects that carry Scripture text (as opposed to helps resources).
pub const SCRIPTURE_SUBJECTS: &[&str] = &["Bible", "Aligned Bible"];

/// Subject names for the TSV-based helps resource families.
pub mod subjects {
    pub const TRANSLATION_NOTES: &str = "TSV Translation Notes";
    pub const TRANSLATION_QUESTIONS: &str = "TSV Translation Questions";
    pub const TRANSLATION_WORDS_LINKS: &str = "TSV Translation Words Links";
}

/// Resolves catalog searches against the upstream content host.
pub struct CatalogResolver {
    cache: Arc<TieredCache>,
    source: Arc<dyn RemoteSource>,
    host: String,
    ttl_secs: u64,
}

impl CatalogResolver {
    pub fn new(
        cache: Arc<TieredCache>,
        source: Arc<dyn RemoteSource>,
        host: &str,
        ttl_secs: u64,
    ) -> Self {
        Self {
            cache,
            source,
            host: host.trim_end_matches('/').to_string(),
            ttl_secs,
        }
    }

    /// Discover the resource repositories serving a language + organization.
    ///
    /// Entries are deduplicated by `(owner, name)` and, when `subjects` is
    /// given, filtered to that allow-list. The subject filter is applied
    /// client-side after parsing: the search query and cache key cover all
    /// subjects, so one cached search serves every resource family. The
    /// raw search JSON is cached; upstream failure returns an empty list
    /// with a warning.
    pub async fn resolve(
        &self,
        language: &str,
        organization: &str,
        subjects: Option<&[&str]>,
        stage: &str,
        tracer: &Tracer,
    ) -> Result<Vec<CatalogEntry>> {
        let url = self.search_url(language, organization, stage);
        let key = catalog_key(language, organization, stage);

        if let Some(cached) = self.cache.get(&key, self.ttl_secs).await {
            tracer.record_call(&url, std::time::Duration::ZERO, None, Some(cached.len()), true);
            return Ok(parse_entries(&cached, subjects));
        }

        let started = Instant::now();
        let response = match self.source.get(&url).await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "catalog search failed");
                return Ok(Vec::new());
            }
        };
        tracer.record_call(
            &url,
            started.elapsed(),
            Some(response.status),
            Some(response.body.len()),
            false,
        );

        if !response.is_success() {
            warn!(url = %url, status = response.status, "catalog search returned non-success");
            return Ok(Vec::new());
        }

        let entries = parse_entries(&response.body, subjects);
        debug!(url = %url, count = entries.len(), "catalog search resolved");

        self.cache.set(&key, &response.body, self.ttl_secs).await;
        Ok(entries)
    }

    fn search_url(&self, language: &str, organization: &str, stage: &str) -> String {
        format!(
            "{}/api/v1/catalog/search?lang={}&owner={}&stage={}",
            self.host,
            encode_query(language),
            encode_query(organization),
            encode_query(stage),
        )
    }
}

/// Parse a catalog search body into entries: read the `data` array,
/// deduplicate by `(owner, name)`, and apply the subject allow-list.
/// Malformed entries are skipped, a malformed body yields nothing.
fn parse_entries(body: &[u8], subjects: Option<&[&str]>) -> Vec<CatalogEntry> {
    let json: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "catalog response was not valid JSON");
            return Vec::new();
        }
    };

    let data = match json.get("data").and_then(|d| d.as_array()) {
        Some(d) => d,
        None => return Vec::new(),
    };

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut entries = Vec::new();

    for item in data {
        let entry: CatalogEntry = match serde_json::from_value(item.clone()) {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping malformed catalog entry");
                continue;
            }
        };
        if !seen.insert((entry.owner.clone(), entry.name.clone())) {
            continue;
        }
        if let Some(allowed) = subjects {
            let subject = entry.subject.as_deref().unwrap_or("");
            if !allowed.contains(&subject) {
                continue;
            }
        }
        entries.push(entry);
    }

    entries
}

/// Minimal query-component encoding for the characters that actually occur
/// in catalog parameters (spaces in organization names).
fn encode_query(component: &str) -> String {
    component.replace(' ', "%20")
}
