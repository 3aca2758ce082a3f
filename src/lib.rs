//! # Scripture Harness
//!
//! A catalog-driven Scripture and translation-helps fetching pipeline.
//!
//! Scripture Harness resolves a human Scripture reference against a
//! Git-based content catalog (Door43 Content Service), downloads the
//! matching resource repository's versioned ZIP archive, extracts the
//! requested verse/chapter/book text out of USFM (or annotation rows out
//! of TSV), and caches every expensive artifact across a two-tier cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐
//! │ Reference │──▶│ Catalog  │──▶│   ZIP    │──▶│ USFM/TSV  │
//! │  Parser   │   │ Resolver │   │ Fetcher  │   │ Extractor │
//! └───────────┘   └────┬─────┘   └────┬─────┘   └───────────┘
//!                      │              │
//!                      ▼              ▼
//!                 ┌─────────────────────────┐
//!                 │  Tiered Cache            │
//!                 │  memory ▸ SQLite         │
//!                 └─────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scr init                          # create the cache database
//! scr fetch "John 3:16"             # fetch a verse from every translation
//! scr fetch "Genesis 1-3" --resource ult
//! scr rows "Titus 1:1" --subject notes
//! scr catalog                       # list discovered resources
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`reference`] | Scripture reference parsing |
//! | [`cache`] | Tiered cache front and memory tier |
//! | [`sqlite_cache`] | Persistent SQLite cache tier |
//! | [`catalog`] | Catalog search and resolution |
//! | [`archive`] | ZIP archive fetching and entry reads |
//! | [`ingredients`] | Book-to-file-path resolution |
//! | [`usfm`] | USFM text extraction |
//! | [`tsv`] | TSV annotation-row extraction |
//! | [`fetcher`] | Orchestrating pipeline |
//! | [`tracer`] | Request-scoped access diagnostics |
//! | [`config`] | TOML configuration parsing |

pub mod archive;
pub mod books;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod fetcher;
pub mod ingredients;
pub mod models;
pub mod reference;
pub mod sqlite_cache;
pub mod tracer;
pub mod tsv;
pub mod usfm;
