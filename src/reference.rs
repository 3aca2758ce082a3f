//! Scripture reference parsing.
//!
//! Turns a human-readable reference string (`"John 3:16-18"`, `"Genesis 1-3"`)
//! into a structured [`ParsedReference`]. Patterns are tried in priority
//! order and the first match wins; only an empty input fails to parse.
//! Whether the book name is a real book is the caller's concern.

use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($pattern).unwrap());
    };
}

// Priority order matters: the most specific shape is tried first.
regex!(CROSS_CHAPTER_RANGE, r"^(.+?)\s+(\d+):(\d+)\s*-\s*(\d+):(\d+)$");
regex!(VERSE_RANGE, r"^(.+?)\s+(\d+):(\d+)\s*-\s*(\d+)$");
regex!(SINGLE_VERSE, r"^(.+?)\s+(\d+):(\d+)$");
regex!(CHAPTER_RANGE, r"^(.+?)\s+(\d+)\s*-\s*(\d+)$");
regex!(CHAPTER_ONLY, r"^(.+?)\s+(\d+)$");

/// A parsed Scripture reference.
///
/// Field combinations describe the request shape:
/// `end_chapter` means a chapter (or cross-chapter) range, `end_verse`
/// without `end_chapter` a same-chapter verse range, a lone `verse` a
/// single verse, a lone `chapter` a whole chapter, and no chapter at all
/// the whole book. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub book: String,
    pub chapter: Option<u32>,
    pub verse: Option<u32>,
    pub end_chapter: Option<u32>,
    pub end_verse: Option<u32>,
    /// The input string, verbatim.
    pub original: String,
    pub is_valid: bool,
}

impl ParsedReference {
    fn invalid(original: &str) -> Self {
        Self {
            book: String::new(),
            chapter: None,
            verse: None,
            end_chapter: None,
            end_verse: None,
            original: original.to_string(),
            is_valid: false,
        }
    }
}

fn num(m: &regex::Captures<'_>, i: usize) -> Option<u32> {
    m.get(i).and_then(|g| g.as_str().parse().ok())
}

/// Parse a reference string. Pure function, no I/O.
///
/// Shapes, in priority order:
/// 1. `Book C:V-C:V` — cross-chapter verse range
/// 2. `Book C:V-V` — same-chapter verse range
/// 3. `Book C:V` — single verse
/// 4. `Book C-C` — chapter range
/// 5. `Book C` — single chapter
/// 6. `Book` — whole book
pub fn parse(input: &str) -> ParsedReference {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ParsedReference::invalid(input);
    }

    if let Some(m) = CROSS_CHAPTER_RANGE.captures(trimmed) {
        return ParsedReference {
            book: m[1].to_string(),
            chapter: num(&m, 2),
            verse: num(&m, 3),
            end_chapter: num(&m, 4),
            end_verse: num(&m, 5),
            original: input.to_string(),
            is_valid: true,
        };
    }
    if let Some(m) = VERSE_RANGE.captures(trimmed) {
        return ParsedReference {
            book: m[1].to_string(),
            chapter: num(&m, 2),
            verse: num(&m, 3),
            end_chapter: None,
            end_verse: num(&m, 4),
            original: input.to_string(),
            is_valid: true,
        };
    }
    if let Some(m) = SINGLE_VERSE.captures(trimmed) {
        return ParsedReference {
            book: m[1].to_string(),
            chapter: num(&m, 2),
            verse: num(&m, 3),
            end_chapter: None,
            end_verse: None,
            original: input.to_string(),
            is_valid: true,
        };
    }
    if let Some(m) = CHAPTER_RANGE.captures(trimmed) {
        return ParsedReference {
            book: m[1].to_string(),
            chapter: num(&m, 2),
            verse: None,
            end_chapter: num(&m, 3),
            end_verse: None,
            original: input.to_string(),
            is_valid: true,
        };
    }
    if let Some(m) = CHAPTER_ONLY.captures(trimmed) {
        return ParsedReference {
            book: m[1].to_string(),
            chapter: num(&m, 2),
            verse: None,
            end_chapter: None,
            end_verse: None,
            original: input.to_string(),
            is_valid: true,
        };
    }

    // Anything non-empty that matched no numeric shape is a book-only reference.
    ParsedReference {
        book: trimmed.to_string(),
        chapter: None,
        verse: None,
        end_chapter: None,
        end_verse: None,
        original: input.to_string(),
        is_valid: true,
    }
}
