//! Ingredient-path resolution: map a book to its file inside an archive.
//!
//! Catalog manifests spell identifiers loosely (`"1co"`, `"1CO"`, `"1-Co"`),
//! so both sides are normalized before comparison. A missing match is the
//! signal to try the canonical-filename fallback and, after that, the raw
//! single-file fetch — each strategy only when the previous one failed.

use crate::books;
use crate::models::Ingredient;

/// Find the archive path serving a book, by normalized identifier match.
///
/// Returns the path with any `./` prefix stripped; `None` when no
/// ingredient matches.
pub fn resolve_ingredient_path(ingredients: &[Ingredient], book: &str) -> Option<String> {
    let wanted = books::normalize(&books::book_code(book));
    if wanted.is_empty() {
        return None;
    }
    ingredients
        .iter()
        .find(|ing| books::normalize(&ing.identifier) == wanted)
        .map(|ing| ing.path.trim_start_matches("./").to_string())
}
