//! The orchestrating resource fetcher.
//!
//! Composition root of the pipeline, consumed by endpoint layers:
//!
//! 1. Parse the reference.
//! 2. Resolve the catalog (cache-checked) for the configured
//!    language/organization/stage.
//! 3. Per catalog entry: pick the release pointer, fetch the ZIP archive
//!    (cache-checked), locate the book's file, extract the referenced text.
//! 4. Record every upstream/cache access on the request's [`Tracer`].
//!
//! Entries are independent units of work: one entry failing (archive
//! unreachable, book missing, extraction empty) only skips that entry.
//! The one hard error is a missing reference — a caller-contract
//! violation, not a runtime failure.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::debug;

use crate::archive::{self, ArchiveFetcher};
use crate::books;
use crate::cache::TieredCache;
use crate::catalog::{CatalogResolver, SCRIPTURE_SUBJECTS};
use crate::client::RemoteSource;
use crate::config::Config;
use crate::ingredients::resolve_ingredient_path;
use crate::models::{CatalogEntry, ScripturePassage};
use crate::reference::parse;
use crate::tracer::Tracer;
use crate::{tsv, usfm};

/// Where to look for a book's file next. Strategies escalate: each is
/// only attempted when every previous one failed.
enum BookSource {
    /// An entry inside the fetched ZIP archive.
    ArchiveEntry(String),
    /// A raw single-file fetch from the content host, bypassing the ZIP.
    RawFile(String),
}

pub struct ResourceFetcher {
    catalog: CatalogResolver,
    archives: ArchiveFetcher,
    language: String,
    organization: String,
    stage: String,
}

impl ResourceFetcher {
    pub fn new(cache: Arc<TieredCache>, source: Arc<dyn RemoteSource>, config: &Config) -> Self {
        let catalog = CatalogResolver::new(
            cache.clone(),
            source.clone(),
            &config.catalog.host,
            config.cache.catalog_ttl_secs,
        );
        let archives = ArchiveFetcher::new(
            cache,
            source,
            &config.catalog.host,
            config.cache.archive_ttl_secs,
        );
        Self {
            catalog,
            archives,
            language: config.catalog.language.clone(),
            organization: config.catalog.organization.clone(),
            stage: config.catalog.stage.clone(),
        }
    }

    pub fn catalog(&self) -> &CatalogResolver {
        &self.catalog
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Fetch Scripture text for a reference from every matching translation.
    ///
    /// `resource` optionally narrows the translations by a name substring
    /// (e.g. `"ult"`). An unparseable reference or a reference no resource
    /// serves yields an empty vector — the caller decides what not-found
    /// looks like. An empty reference string is a contract violation.
    pub async fn fetch_scripture(
        &self,
        reference: &str,
        resource: Option<&str>,
        tracer: &Tracer,
    ) -> Result<Vec<ScripturePassage>> {
        if reference.trim().is_empty() {
            bail!("a scripture reference is required");
        }
        let parsed = parse(reference);
        if !parsed.is_valid {
            return Ok(Vec::new());
        }

        let entries = self
            .catalog
            .resolve(
                &self.language,
                &self.organization,
                Some(SCRIPTURE_SUBJECTS),
                &self.stage,
                tracer,
            )
            .await?;

        let mut passages = Vec::new();
        for entry in entries {
            if let Some(filter) = resource {
                if !entry.name.to_lowercase().contains(&filter.to_lowercase()) {
                    continue;
                }
            }

            let file_text = match self.book_file_text(&entry, &parsed.book, tracer).await {
                Some(t) => t,
                None => {
                    debug!(resource = %entry.name, book = %parsed.book, "no file found for book");
                    continue;
                }
            };

            let text = usfm::extract_scripture(&file_text, &parsed);
            if text.is_empty() {
                continue;
            }
            passages.push(ScripturePassage {
                text,
                translation: entry.label().to_string(),
            });
        }

        Ok(passages)
    }

    /// Fetch annotation rows for a reference from a TSV resource family
    /// (see [`crate::catalog::subjects`]). Returns the rows of the first
    /// entry that yields any.
    pub async fn fetch_tsv_resource(
        &self,
        reference: &str,
        subject: &str,
        tracer: &Tracer,
    ) -> Result<Vec<HashMap<String, String>>> {
        if reference.trim().is_empty() {
            bail!("a scripture reference is required");
        }
        let parsed = parse(reference);
        if !parsed.is_valid {
            return Ok(Vec::new());
        }

        let entries = self
            .catalog
            .resolve(
                &self.language,
                &self.organization,
                Some(&[subject]),
                &self.stage,
                tracer,
            )
            .await?;

        for entry in entries {
            let file_text = match self.book_file_text(&entry, &parsed.book, tracer).await {
                Some(t) => t,
                None => continue,
            };
            let rows = tsv::extract_tsv_rows(&file_text, &parsed);
            if !rows.is_empty() {
                return Ok(rows);
            }
        }

        Ok(Vec::new())
    }

    /// Locate a book's file text for one catalog entry, escalating through
    /// the ingredient path, the canonical filename, and finally a raw
    /// single-file fetch.
    async fn book_file_text(
        &self,
        entry: &CatalogEntry,
        book: &str,
        tracer: &Tracer,
    ) -> Option<String> {
        let release = entry.resource_ref(&self.stage);
        let git_ref = release.and_then(|r| r.branch_or_tag.as_deref());
        let zip_url = release.and_then(|r| r.zipball_url.as_deref());

        let archive_bytes = self
            .archives
            .fetch(&entry.owner, &entry.name, git_ref, zip_url, tracer)
            .await
            .ok()
            .flatten();

        let ingredient = resolve_ingredient_path(&entry.ingredients, book);
        let canonical = books::canonical_filename(book);

        let mut strategies = Vec::new();
        if let Some(path) = &ingredient {
            strategies.push(BookSource::ArchiveEntry(path.clone()));
        }
        if let Some(name) = &canonical {
            strategies.push(BookSource::ArchiveEntry(name.clone()));
        }
        if let Some(path) = ingredient.or(canonical) {
            strategies.push(BookSource::RawFile(path));
        }

        for strategy in strategies {
            match strategy {
                BookSource::ArchiveEntry(path) => {
                    if let Some(bytes) = archive_bytes.as_deref() {
                        if let Some(text) = archive::read_entry(bytes, &path) {
                            return Some(text);
                        }
                    }
                }
                BookSource::RawFile(path) => {
                    if let Some(text) = self
                        .archives
                        .fetch_raw_file(&entry.owner, &entry.name, git_ref, &path, tracer)
                        .await
                    {
                        return Some(text);
                    }
                }
            }
        }

        None
    }
}
