//! Versioned ZIP archive fetching and entry extraction.
//!
//! An archive is keyed by `(organization, repository, ref)`; a given tag's
//! ZIP never changes upstream, so cached bytes are reused for 30 days.
//! Download failure is not an error — the affected catalog entry is simply
//! unavailable and the caller moves on to the next one.

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::cache::{zip_key, TieredCache};
use crate::client::RemoteSource;
use crate::tracer::Tracer;

/// Ref used when a catalog entry carries no release pointer.
pub const DEFAULT_REF: &str = "master";

/// Maximum decompressed bytes read from a single ZIP entry.
const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Downloads repository ZIP archives, backed by the tiered cache.
pub struct ArchiveFetcher {
    cache: Arc<TieredCache>,
    source: Arc<dyn RemoteSource>,
    content_host: String,
    ttl_secs: u64,
}

impl ArchiveFetcher {
    pub fn new(
        cache: Arc<TieredCache>,
        source: Arc<dyn RemoteSource>,
        content_host: &str,
        ttl_secs: u64,
    ) -> Self {
        Self {
            cache,
            source,
            content_host: content_host.trim_end_matches('/').to_string(),
            ttl_secs,
        }
    }

    /// Fetch a repository's ZIP archive at a ref, cache-first.
    ///
    /// `zipball_url` (from the catalog's release pointer) wins over the
    /// conventional `archive/{ref}.zip` URL. `Ok(None)` means the archive
    /// could not be downloaded — the resource is unavailable for this
    /// entry, not a fatal error.
    pub async fn fetch(
        &self,
        organization: &str,
        repository: &str,
        git_ref: Option<&str>,
        zipball_url: Option<&str>,
        tracer: &Tracer,
    ) -> Result<Option<Vec<u8>>> {
        let ref_label = git_ref.unwrap_or(DEFAULT_REF);
        let key = zip_key(organization, repository, ref_label);

        let url = match zipball_url {
            Some(u) => u.to_string(),
            None => format!(
                "{}/{}/{}/archive/{}.zip",
                self.content_host, organization, repository, ref_label
            ),
        };

        if let Some(bytes) = self.cache.get(&key, self.ttl_secs).await {
            tracer.record_call(&url, std::time::Duration::ZERO, None, Some(bytes.len()), true);
            return Ok(Some(bytes));
        }

        let started = Instant::now();
        let response = match self.source.get(&url).await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "archive download failed");
                return Ok(None);
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
            warn!(url = %url, status = response.status, "archive download returned non-success");
            return Ok(None);
        }

        debug!(url = %url, size = response.body.len(), "archive downloaded");
        self.cache.set(&key, &response.body, self.ttl_secs).await;
        Ok(Some(response.body))
    }

    /// Last-resort fallback: fetch one file's raw text from the content
    /// host, bypassing the ZIP entirely.
    pub async fn fetch_raw_file(
        &self,
        organization: &str,
        repository: &str,
        git_ref: Option<&str>,
        path: &str,
        tracer: &Tracer,
    ) -> Option<String> {
        let ref_label = git_ref.unwrap_or(DEFAULT_REF);
        let url = format!(
            "{}/{}/{}/raw/{}/{}",
            self.content_host,
            organization,
            repository,
            ref_label,
            path.trim_start_matches("./"),
        );

        let started = Instant::now();
        let response = match self.source.get(&url).await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "raw file fetch failed");
                return None;
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
            return None;
        }
        Some(response.text())
    }
}

/// Read one entry's text out of ZIP bytes.
///
/// Repository zipballs nest everything under a top-level directory named
/// after the repo, and ingredient paths often carry a `./` prefix, so the
/// match is on the exact name or a `/{path}` suffix. Corrupt archives and
/// missing entries both read as `None` — callers treat them as not-found.
pub fn read_entry(zip_bytes: &[u8], path: &str) -> Option<String> {
    let wanted = path.trim_start_matches("./");

    let mut archive = match ZipArchive::new(Cursor::new(zip_bytes)) {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "could not open archive");
            return None;
        }
    };

    let name = archive
        .file_names()
        .find(|n| *n == wanted || n.ends_with(&format!("/{}", wanted)))
        .map(|n| n.to_string())?;

    let mut entry = archive.by_name(&name).ok()?;
    let mut bytes = Vec::new();
    entry
        .take(MAX_ENTRY_BYTES)
        .read_to_end(&mut bytes)
        .ok()?;
    if bytes.len() as u64 >= MAX_ENTRY_BYTES {
        warn!(name = %name, "archive entry exceeds size limit");
        return None;
    }

    Some(String::from_utf8_lossy(&bytes).into_owned())
}
