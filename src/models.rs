//! Core data models used throughout the fetching pipeline.
//!
//! These types mirror the shapes reported by the upstream catalog service
//! plus the extraction results that flow back out to callers.

use serde::{Deserialize, Deserializer, Serialize};

/// One resource repository's metadata as reported by the catalog search API.
///
/// Fetched on cache miss and cached for an hour; release metadata changes
/// rarely, and only TTL expiry invalidates it.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(deserialize_with = "de_owner")]
    pub owner: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub catalog: Option<CatalogRefs>,
}

/// A manifest entry mapping a canonical book identifier to its file path
/// inside the resource's ZIP archive.
#[derive(Debug, Clone, Deserialize)]
pub struct Ingredient {
    pub identifier: String,
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Release pointers by stage, as nested under the entry's `catalog` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRefs {
    #[serde(default)]
    pub prod: Option<CatalogRef>,
    #[serde(default)]
    pub preprod: Option<CatalogRef>,
    #[serde(default)]
    pub latest: Option<CatalogRef>,
}

/// One release pointer: the tag to fetch and the archive URL serving it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRef {
    #[serde(default, rename = "branch_or_tag_name")]
    pub branch_or_tag: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
}

impl CatalogEntry {
    /// The release pointer for a stage, falling back through the other
    /// stages when the requested one is absent. `None` means the fetcher
    /// should use the conventional `archive/master.zip` URL instead.
    pub fn resource_ref(&self, stage: &str) -> Option<&CatalogRef> {
        let refs = self.catalog.as_ref()?;
        let primary = match stage {
            "preprod" => refs.preprod.as_ref(),
            "latest" => refs.latest.as_ref(),
            _ => refs.prod.as_ref(),
        };
        primary
            .or(refs.prod.as_ref())
            .or(refs.preprod.as_ref())
            .or(refs.latest.as_ref())
    }

    /// Human-facing label for this resource (`title` when present, else `name`).
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

// The catalog search endpoint reports `owner` as a plain login string, but
// some repository endpoints nest it as `{ "login": ... }`. Accept both.
fn de_owner<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OwnerField {
        Login(String),
        Object { login: String },
    }
    Ok(match OwnerField::deserialize(de)? {
        OwnerField::Login(s) => s,
        OwnerField::Object { login } => login,
    })
}

/// Extracted Scripture text from one translation resource.
#[derive(Debug, Clone, Serialize)]
pub struct ScripturePassage {
    pub text: String,
    /// Which translation produced the text (e.g. `unfoldingWord® Literal Text`).
    pub translation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_accepts_string_or_object() {
        let e: CatalogEntry =
            serde_json::from_str(r#"{"name":"en_ult","owner":"unfoldingWord"}"#).unwrap();
        assert_eq!(e.owner, "unfoldingWord");

        let e: CatalogEntry =
            serde_json::from_str(r#"{"name":"en_ult","owner":{"login":"unfoldingWord"}}"#).unwrap();
        assert_eq!(e.owner, "unfoldingWord");
    }

    #[test]
    fn resource_ref_falls_back_across_stages() {
        let e: CatalogEntry = serde_json::from_str(
            r#"{
                "name": "en_ult",
                "owner": "unfoldingWord",
                "catalog": {
                    "latest": { "branch_or_tag_name": "master", "zipball_url": "https://host/zip" }
                }
            }"#,
        )
        .unwrap();

        // prod is requested but only latest exists.
        let r = e.resource_ref("prod").unwrap();
        assert_eq!(r.branch_or_tag.as_deref(), Some("master"));

        let bare: CatalogEntry =
            serde_json::from_str(r#"{"name":"en_ult","owner":"unfoldingWord"}"#).unwrap();
        assert!(bare.resource_ref("prod").is_none());
    }

    #[test]
    fn label_prefers_title() {
        let e: CatalogEntry = serde_json::from_str(
            r#"{"name":"en_ult","owner":"unfoldingWord","title":"Literal Text"}"#,
        )
        .unwrap();
        assert_eq!(e.label(), "Literal Text");
    }
}
