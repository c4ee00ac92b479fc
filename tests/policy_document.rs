use return_policy::{PolicyDocument, PolicyError};

#[test]
fn top_level_sections_are_listed_in_order() {
    let doc = PolicyDocument::builtin();
    let titles: Vec<&str> = doc.sections(2).iter().map(|h| h.title.as_str()).collect();

    assert_eq!(
        titles,
        vec![
            "Return & Refund Policy",
            "Return Conditions",
            "Non-Returnable Items",
            "How to Return",
            "Refund Process if Return is Accepted or Order is Cancelled",
            "Contact Us",
        ]
    );
}

#[test]
fn section_by_title_and_by_anchor_match() {
    let doc = PolicyDocument::builtin();
    let by_title = doc.section("refund methods and lead times").unwrap();
    let by_anchor = doc.section("refund-methods-and-lead-times").unwrap();

    assert_eq!(by_title, by_anchor);
    assert!(by_title.markdown.starts_with("### Refund Methods and Lead Times"));
    assert!(by_title.markdown.contains("3–5 days after bank details received"));
    assert!(!by_title.markdown.contains("### The 1 Point"));
}

#[test]
fn parent_section_includes_its_subsections() {
    let doc = PolicyDocument::builtin();
    let section = doc.section("Return Conditions").unwrap();

    assert!(section.markdown.contains("### Return Window"));
    assert!(section.markdown.contains("### Category-Specific Conditions"));
    assert!(!section.markdown.contains("## Non-Returnable Items"));
}

#[test]
fn missing_section_is_an_error() {
    let doc = PolicyDocument::builtin();
    assert!(matches!(doc.section("Shipping"), Err(PolicyError::SectionNotFound(_))));
}

#[test]
fn search_reports_the_enclosing_section() {
    let doc = PolicyDocument::builtin();
    let hits = doc.search("billing cycle", 5, 30).unwrap();

    assert_eq!(hits.len(), 1);
    let section = hits[0].section.as_ref().unwrap();
    assert_eq!(section.anchor, "refund-methods-and-lead-times");
    assert!(hits[0].snippet.contains("Next billing cycle"));
}

#[test]
fn search_respects_max_results() {
    let doc = PolicyDocument::builtin();
    let hits = doc.search("required", 3, 10).unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn blank_query_is_rejected() {
    let doc = PolicyDocument::builtin();
    assert!(matches!(doc.search("   ", 5, 10), Err(PolicyError::EmptyQuery)));
}
