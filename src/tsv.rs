//! TSV resource extraction (Notes, Questions, Word Links).
//!
//! The first line is the header row; every following line is one
//! annotation row, split on tabs and keyed by header column. A row
//! matches a reference when its `Reference` column *contains*
//! `"{chapter}:{verse}"` (or `"{chapter}:"` when no verse is given).
//! The substring test is intentionally broad — `1:1` also matches
//! `1:10` — matching the documented behavior of the upstream resources'
//! consumers; do not tighten it to an exact field match.

use std::collections::HashMap;

use crate::reference::ParsedReference;

const REFERENCE_COLUMN: &str = "Reference";

/// Filter a TSV document's rows by reference.
///
/// Book-only references match every row. Returns an empty vector for
/// malformed input (no header, no `Reference` column) — never errors.
pub fn extract_tsv_rows(text: &str, reference: &ParsedReference) -> Vec<HashMap<String, String>> {
    if !reference.is_valid {
        return Vec::new();
    }

    let mut lines = text.lines();
    let header = match lines.next() {
        Some(h) if !h.trim().is_empty() => h,
        _ => return Vec::new(),
    };
    let columns: Vec<&str> = header.split('\t').collect();

    let ref_index = match columns.iter().position(|c| c.trim() == REFERENCE_COLUMN) {
        Some(i) => i,
        None => return Vec::new(),
    };

    let needle = match (reference.chapter, reference.verse) {
        (Some(chapter), Some(verse)) => format!("{}:{}", chapter, verse),
        (Some(chapter), None) => format!("{}:", chapter),
        _ => String::new(),
    };

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let matches = fields
            .get(ref_index)
            .map(|f| f.contains(&needle))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let row: HashMap<String, String> = columns
            .iter()
            .zip(fields.iter())
            .map(|(col, field)| (col.trim().to_string(), field.to_string()))
            .collect();
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::parse;

    const NOTES: &str = "Reference\tID\tTags\tNote\n\
        1:1\tabc1\t\tIn the beginning refers to creation.\n\
        1:10\tabc2\t\tThe gathered waters were called seas.\n\
        2:3\tabc3\t\tGod blessed the seventh day.\n\
        \n\
        3:16\tabc4\t\tThe most famous verse.\n";

    #[test]
    fn single_verse_matches_by_substring() {
        let rows = extract_tsv_rows(NOTES, &parse("Genesis 1:1"));

        // "1:1" also matches "1:10" — the broad match is intentional.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ID"], "abc1");
        assert_eq!(rows[1]["ID"], "abc2");
    }

    #[test]
    fn chapter_only_matches_the_whole_chapter() {
        let rows = extract_tsv_rows(NOTES, &parse("Genesis 1"));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["Reference"].starts_with("1:")));
    }

    #[test]
    fn book_only_matches_every_row() {
        let rows = extract_tsv_rows(NOTES, &parse("Genesis"));
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn rows_are_keyed_by_header_column() {
        let rows = extract_tsv_rows(NOTES, &parse("Genesis 2:3"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Note"], "God blessed the seventh day.");
        assert_eq!(rows[0]["Tags"], "");
    }

    #[test]
    fn missing_reference_yields_nothing() {
        assert!(extract_tsv_rows(NOTES, &parse("Genesis 9:9")).is_empty());
    }

    #[test]
    fn malformed_input_yields_nothing() {
        assert!(extract_tsv_rows("", &parse("Genesis 1:1")).is_empty());
        assert!(extract_tsv_rows("ID\tNote\n1\tno reference column\n", &parse("Genesis 1:1"))
            .is_empty());
        assert!(extract_tsv_rows(NOTES, &parse("")).is_empty());
    }

    #[test]
    fn short_rows_do_not_panic() {
        let text = "Reference\tID\tNote\n1:1\n";
        let rows = extract_tsv_rows(text, &parse("Genesis 1:1"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Note"), None);
    }
}
