//! USFM text extraction.
//!
//! Given raw USFM file text and a [`ParsedReference`], pull out the
//! requested book/chapter/verse content with the alignment and word
//! markup stripped. Four modes apply depending on which reference fields
//! are set:
//!
//! - whole book — every chapter, with `## Chapter N` headers
//! - chapter range (`end_chapter` set) — headers for every chapter in range
//! - single chapter — `N. text` lines, no header
//! - verse or same-chapter verse range — bare text for a single verse,
//!   `N. ` prefixes re-inserted for ranges
//!
//! This is deliberately regex-pipeline text rewriting, not a USFM AST:
//! the raw-file fallback upstream is the safety net for pathological
//! input. The extractor never errors — malformed input, a missing
//! chapter, or a missing verse all yield an empty string, which callers
//! map to not-found. Verse numbers are taken verbatim from `\v N`
//! markers; no renumbering or validation happens here.

use regex::Regex;
use std::sync::LazyLock;

use crate::reference::ParsedReference;

macro_rules! regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($pattern).unwrap());
    };
}

regex!(CHAPTER_MARKER, r"\\c\s+(\d+)");
regex!(VERSE_MARKER, r"\\v\s+(\d+)\s*");
// Alignment milestones: \zaln-s |attrs\* ... \zaln-e\*
regex!(ALIGN_OPEN, r"\\zaln-s[^\\]*\\\*");
regex!(ALIGN_CLOSE, r"\\zaln-e\\\*");
// Word wrappers: \w text|attrs\w* keeps only the text.
regex!(WORD, r"\\w\s+([^|\\]*?)\s*(?:\|[^\\]*)?\\w\*");
// Any other milestone carrying pipe attributes, e.g. \k-s |key="x"\*
regex!(MILESTONE, r"\\[a-zA-Z0-9-]+\s*\|[^\\]*\\\*");
// Residual markers and stray closers: \p, \q1, \ts\*, \f, a bare \* ...
regex!(TAG, r"\\\+?[a-zA-Z0-9-]*\*?");
regex!(WHITESPACE, r"\s+");
regex!(SPACE_BEFORE_PUNCT, r"\s+([,.;:!?])");

/// Extract the referenced text from a USFM document.
pub fn extract_scripture(text: &str, reference: &ParsedReference) -> String {
    if !reference.is_valid {
        return String::new();
    }
    match (reference.chapter, reference.end_chapter, reference.verse) {
        (None, _, _) => extract_book(text),
        (Some(start), Some(end), _) => extract_chapter_range(text, start, end),
        (Some(chapter), None, None) => extract_chapter(text, chapter),
        (Some(chapter), None, Some(verse)) => {
            extract_verses(text, chapter, verse, reference.end_verse)
        }
    }
}

/// Strip USFM markup down to plain text.
///
/// Passes run in a fixed order: alignment milestones, word wrappers,
/// other pipe-attribute milestones, residual tags, leftover `*`/`{}`,
/// whitespace collapse, and finally space-before-punctuation cleanup.
pub fn strip_markers(text: &str) -> String {
    let cleaned = ALIGN_OPEN.replace_all(text, " ");
    let cleaned = ALIGN_CLOSE.replace_all(&cleaned, " ");
    let cleaned = WORD.replace_all(&cleaned, "$1");
    let cleaned = MILESTONE.replace_all(&cleaned, " ");
    let cleaned = TAG.replace_all(&cleaned, " ");
    let cleaned = cleaned.replace(['*', '{', '}'], " ");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    SPACE_BEFORE_PUNCT.replace_all(&cleaned, "$1").trim().to_string()
}

struct Chapter<'a> {
    number: u32,
    body: &'a str,
}

struct Verse<'a> {
    number: u32,
    body: &'a str,
}

fn chapters(text: &str) -> Vec<Chapter<'_>> {
    let marks: Vec<(usize, usize, u32)> = CHAPTER_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some((whole.start(), whole.end(), number))
        })
        .collect();

    marks
        .iter()
        .enumerate()
        .map(|(i, (_, body_start, number))| {
            let body_end = marks.get(i + 1).map(|m| m.0).unwrap_or(text.len());
            Chapter {
                number: *number,
                body: &text[*body_start..body_end],
            }
        })
        .collect()
}

fn verses(chapter_body: &str) -> Vec<Verse<'_>> {
    let marks: Vec<(usize, usize, u32)> = VERSE_MARKER
        .captures_iter(chapter_body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some((whole.start(), whole.end(), number))
        })
        .collect();

    marks
        .iter()
        .enumerate()
        .map(|(i, (_, body_start, number))| {
            let body_end = marks.get(i + 1).map(|m| m.0).unwrap_or(chapter_body.len());
            Verse {
                number: *number,
                body: &chapter_body[*body_start..body_end],
            }
        })
        .collect()
}

fn chapter_block(chapter: &Chapter<'_>) -> String {
    let mut out = format!("\n\n## Chapter {}\n\n", chapter.number);
    for verse in verses(chapter.body) {
        out.push_str(&format!("\n{}. {}", verse.number, strip_markers(verse.body)));
    }
    out
}

fn extract_book(text: &str) -> String {
    chapters(text).iter().map(chapter_block).collect()
}

fn extract_chapter_range(text: &str, start: u32, end: u32) -> String {
    chapters(text)
        .iter()
        .filter(|c| c.number >= start && c.number <= end)
        .map(chapter_block)
        .collect()
}

fn extract_chapter(text: &str, chapter: u32) -> String {
    let chapters = chapters(text);
    let found = match chapters.iter().find(|c| c.number == chapter) {
        Some(c) => c,
        None => return String::new(),
    };
    verses(found.body)
        .iter()
        .map(|v| format!("\n{}. {}", v.number, strip_markers(v.body)))
        .collect()
}

fn extract_verses(text: &str, chapter: u32, verse: u32, end_verse: Option<u32>) -> String {
    let chapters = chapters(text);
    let found = match chapters.iter().find(|c| c.number == chapter) {
        Some(c) => c,
        None => return String::new(),
    };
    let all = verses(found.body);

    match end_verse {
        // A single verse drops the number entirely.
        None => all
            .iter()
            .find(|v| v.number == verse)
            .map(|v| strip_markers(v.body))
            .unwrap_or_default(),
        // A range re-inserts one numbered line per verse.
        Some(end) => all
            .iter()
            .filter(|v| v.number >= verse && v.number <= end)
            .map(|v| format!("{}. {}", v.number, strip_markers(v.body)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::parse;

    const JOHN: &str = "\\id JHN unfoldingWord Literal Text\n\
        \\h John\n\
        \\toc3 Jhn\n\
        \\c 3\n\
        \\p\n\
        \\v 16 \\zaln-s |x-strong=\"G1063\" x-content=\"γὰρ\"\\*\\w For\\w*\\zaln-e\\* \
        \\zaln-s |x-strong=\"G2316\"\\*\\w God\\w*\\zaln-e\\* \
        \\w so\\w* \\w loved\\w* \\w the\\w* \\w world\\w*\\zaln-e\\* ,\n\
        \\v 17 \\w For\\w* \\w God\\w* \\w did\\w* \\w not\\w* \\w send\\w* \\w his\\w* \
        \\w Son\\w* \\w to\\w* \\w condemn\\w* \\w the\\w* \\w world\\w*\n\
        \\c 4\n\
        \\p\n\
        \\v 1 \\w Now\\w* \\w when\\w* \\w Jesus\\w* \\w learned\\w*\n\
        \\v 2 \\w although\\w* \\w Jesus\\w* \\w himself\\w* \\w was\\w* \\w not\\w* \\w baptizing\\w*\n";

    const GENESIS: &str = "\\id GEN\n\
        \\c 1\n\
        \\p\n\
        \\v 1 In the beginning God created the heavens and the earth.\n\
        \\v 2 The earth was without form and empty.\n\
        \\c 2\n\
        \\p\n\
        \\v 1 Then the heavens and the earth were finished.\n";

    #[test]
    fn single_verse_drops_the_number() {
        let out = extract_scripture(JOHN, &parse("John 3:16"));
        assert!(out.contains("For God so loved the world"));
        assert!(!out.starts_with("16"));
        assert!(!out.contains("condemn"));
    }

    #[test]
    fn verse_range_prefixes_each_verse() {
        let out = extract_scripture(JOHN, &parse("John 3:16-17"));
        assert!(out.starts_with("16. For God so loved the world"));
        assert!(out.contains("\n17. For God did not send his Son"));
    }

    #[test]
    fn range_contains_the_single_verse_text() {
        let single = extract_scripture(JOHN, &parse("John 3:16"));
        let range = extract_scripture(JOHN, &parse("John 3:16-17"));
        assert!(range.contains(&single));
        assert!(range.contains("condemn"));
    }

    #[test]
    fn chapter_mode_lists_every_verse_of_that_chapter_only() {
        let out = extract_scripture(GENESIS, &parse("Genesis 1"));
        assert!(out.starts_with("\n1. "));
        assert!(out.contains("In the beginning"));
        assert!(out.contains("\n2. The earth was without form"));
        assert!(!out.contains("finished"));
    }

    #[test]
    fn chapter_range_emits_headers_including_the_first() {
        let out = extract_scripture(JOHN, &parse("John 3-4"));
        assert!(out.starts_with("\n\n## Chapter 3\n\n"));
        assert!(out.contains("\n\n## Chapter 4\n\n"));
        assert!(out.contains("baptizing"));
    }

    #[test]
    fn book_mode_covers_every_chapter() {
        let out = extract_scripture(GENESIS, &parse("Genesis"));
        assert!(out.contains("## Chapter 1"));
        assert!(out.contains("## Chapter 2"));
        assert!(out.contains("\n1. Then the heavens"));
    }

    #[test]
    fn missing_chapter_or_verse_is_empty() {
        assert_eq!(extract_scripture(JOHN, &parse("John 99")), "");
        assert_eq!(extract_scripture(JOHN, &parse("John 3:99")), "");
        assert_eq!(extract_scripture(JOHN, &parse("John 17-19")), "");
        assert_eq!(extract_scripture("", &parse("John 3:16")), "");
    }

    #[test]
    fn invalid_reference_is_empty() {
        assert_eq!(extract_scripture(JOHN, &parse("")), "");
    }

    #[test]
    fn stripping_leaves_no_markup_behind() {
        let out = extract_scripture(JOHN, &parse("John"));
        assert!(!out.contains('\\'));
        assert!(!out.contains('|'));
        assert!(!out.contains('*'));
        assert!(!out.contains("zaln"));
        assert!(!out.contains("x-strong"));
    }

    #[test]
    fn stripping_removes_space_before_punctuation() {
        let out = extract_scripture(JOHN, &parse("John 3:16"));
        assert!(out.ends_with("world,"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let reference = parse("John 3:16-17");
        assert_eq!(
            extract_scripture(JOHN, &reference),
            extract_scripture(JOHN, &reference)
        );
    }

    #[test]
    fn strip_markers_handles_keyword_milestones() {
        let out = strip_markers("\\k-s |keyword=\"grace\"\\*\\w grace\\w*\\k-e\\* abounds");
        assert_eq!(out, "grace abounds");
    }

    #[test]
    fn strip_markers_on_plain_text_is_identity_modulo_whitespace() {
        assert_eq!(strip_markers("  plain   text  "), "plain text");
    }
}
