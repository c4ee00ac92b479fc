use regex::RegexBuilder;
use serde::Serialize;

use crate::error::{PolicyError, Result};
use crate::policy::PolicyDocument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRef {
    pub title: String,
    pub anchor: String,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// The matched text as it appears in the document.
    pub matched: String,
    /// Byte offsets into the markdown.
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub section: Option<SectionRef>,
    pub snippet: String,
}

/// Byte offset `chars` characters before `idx`, or the start of `text`.
fn chars_before(text: &str, idx: usize, chars: usize) -> usize {
    if chars == 0 {
        return idx;
    }
    text[..idx]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset `chars` characters after `idx`, or the end of `text`.
fn chars_after(text: &str, idx: usize, chars: usize) -> usize {
    text[idx..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| idx + i)
        .unwrap_or(text.len())
}

/// Case-insensitive literal search with `context_chars` characters of context on each side.
pub fn search(
    doc: &PolicyDocument,
    query: &str,
    max_results: usize,
    context_chars: usize,
) -> Result<Vec<SearchHit>> {
    let q = query.trim();
    if q.is_empty() {
        return Err(PolicyError::EmptyQuery);
    }

    let pattern = RegexBuilder::new(&regex::escape(q))
        .case_insensitive(true)
        .build()
        .map_err(|e| PolicyError::InvalidRequest(e.to_string()))?;

    let text = doc.markdown();
    let limit = max_results.max(1);

    let hits = pattern
        .find_iter(text)
        .take(limit)
        .map(|m| {
            let left = chars_before(text, m.start(), context_chars);
            let right = chars_after(text, m.end(), context_chars);
            let line = text[..m.start()].matches('\n').count();
            let section = doc.heading_for_line(line).map(|h| SectionRef {
                title: h.title.clone(),
                anchor: h.anchor.clone(),
                level: h.level,
            });
            SearchHit {
                matched: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
                line,
                section,
                snippet: text[left..right].to_string(),
            }
        })
        .collect();

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_is_case_insensitive() {
        let doc = PolicyDocument::builtin();
        let hits = doc.search("QUALITY CHECK", 8, 20).unwrap();

        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.matched.eq_ignore_ascii_case("quality check")));
    }

    #[test]
    fn test_search_reports_enclosing_section() {
        let doc = PolicyDocument::builtin();
        let hits = doc.search("bank details received", 1, 40).unwrap();

        assert_eq!(hits.len(), 1);
        let section = hits[0].section.as_ref().unwrap();
        assert_eq!(section.anchor, "refund-methods-and-lead-times");
        assert!(hits[0].snippet.contains("bank details received"));
    }

    #[test]
    fn test_search_limits_results() {
        let doc = PolicyDocument::builtin();
        assert_eq!(doc.search("required", 3, 10).unwrap().len(), 3);
        assert_eq!(doc.search("required", 0, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let doc = PolicyDocument::new("# Lead times\n3–5 days – après");
        let hits = doc.search("days", 5, 2).unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 1);
        assert!(hits[0].snippet.contains("days"));
    }

    #[test]
    fn test_context_is_counted_in_characters() {
        let doc = PolicyDocument::new("# Lead times\n3–5 days – après");
        let hits = doc.search("days", 5, 4).unwrap();

        assert_eq!(hits[0].snippet, "3–5 days – a");

        let hits = doc.search("days", 5, 100).unwrap();
        assert_eq!(hits[0].snippet, "# Lead times\n3–5 days – après");

        let hits = doc.search("days", 5, 0).unwrap();
        assert_eq!(hits[0].snippet, "days");
    }

    #[test]
    fn test_query_is_literal() {
        let doc = PolicyDocument::new("# T\nCredit card / Installment (a.k.a. pay later)");
        assert_eq!(doc.search("(a.k.a.", 5, 0).unwrap().len(), 1);
        assert!(doc.search("a+k", 5, 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let doc = PolicyDocument::builtin();
        assert!(matches!(doc.search("   ", 8, 120), Err(PolicyError::EmptyQuery)));
    }
}
