//! Citation sanitizer - strips provider citation markup from answers.
//!
//! The hosted assistant annotates answers drawn from the document store with
//! inline citation markers (`【3:1†source.pdf】`) and reference-style footnote
//! markers (`[2]`). Neither renders sensibly in a chat widget, so both are
//! removed before the answer is returned to the caller.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the bracketed step-reference markers emitted by file search,
/// e.g. `【3:1†source.pdf】`.
static FILE_CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"【\d+:\d+†[^】]+】").expect("file citation pattern is valid"));

/// Matches bare numeric footnote markers, e.g. `[2]`.
static FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d+\]").expect("footnote pattern is valid"));

/// Matches runs of two or more line breaks.
static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("blank line pattern is valid"));

/// Removes citation markup and collapses excess blank lines.
///
/// Idempotent: sanitizing already-clean text only trims surrounding
/// whitespace.
pub fn sanitize(text: &str) -> String {
    // Removing a nested marker can expose another one ("[1[2]]" leaves
    // "[1]"), so strip markers to a fixed point before collapsing lines.
    let mut cleaned = text.to_string();
    loop {
        let pass = FILE_CITATION.replace_all(&cleaned, "");
        let pass = FOOTNOTE.replace_all(&pass, "").into_owned();
        if pass == cleaned {
            break;
        }
        cleaned = pass;
    }
    let cleaned = BLANK_LINES.replace_all(&cleaned, "\n");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_file_citation_markers() {
        let input = "The answer is 42【3:1†source.pdf】 and also [2].";
        assert_eq!(sanitize(input), "The answer is 42 and also .");
    }

    #[test]
    fn strips_multiple_markers() {
        let input = "See【1:0†a.pdf】 and【12:34†long name with spaces.docx】 here.";
        assert_eq!(sanitize(input), "See and here.");
    }

    #[test]
    fn strips_footnote_markers() {
        assert_eq!(sanitize("Fact[1] and fact[23]."), "Fact and fact.");
    }

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(sanitize("A\n\n\nB"), "A\nB");
        assert_eq!(sanitize("A\n\nB\n\n\n\nC"), "A\nB\nC");
    }

    #[test]
    fn single_line_breaks_are_preserved() {
        assert_eq!(sanitize("A\nB"), "A\nB");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize("  hello  "), "hello");
        assert_eq!(sanitize("\n\nhello\n\n"), "hello");
    }

    #[test]
    fn clean_text_passes_through() {
        let input = "No markers here, just a plain answer.";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn non_numeric_brackets_are_kept() {
        // Only digit-only brackets are footnotes; prose brackets stay.
        assert_eq!(sanitize("see [appendix] for details"), "see [appendix] for details");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n\n  "), "");
    }

    #[test]
    fn nested_markers_are_fully_removed() {
        assert_eq!(sanitize("[1[2]]"), "");
        assert_eq!(sanitize("a[1[2]]b"), "ab");
    }

    proptest! {
        // Alphabet biased toward marker delimiters to stress nesting and
        // partial-marker edge cases.
        #[test]
        fn sanitize_is_idempotent(s in "[\\[\\]【】†:0-9abc \\n]{0,48}") {
            let once = sanitize(&s);
            let twice = sanitize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn sanitize_never_emits_markers(s in "[\\[\\]【】†:0-9abc \\n]{0,48}") {
            let out = sanitize(&s);
            prop_assert!(!FILE_CITATION.is_match(&out));
            prop_assert!(!FOOTNOTE.is_match(&out));
            prop_assert!(!out.contains("\n\n"));
        }
    }
}
