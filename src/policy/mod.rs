//! The human-readable return & refund policy, with section lookup and keyword search.

pub mod search;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{PolicyError, Result};
pub use search::{SearchHit, SectionRef};

const BUILTIN_POLICY: &str = include_str!("../../docs/return-policy.md");

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<hashes>#{1,6})\s+(?P<title>.+?)\s*$").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_`~]+").unwrap());
static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\-\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Anchor slug for a heading title, GitHub style.
pub fn slugify(title: &str) -> String {
    let s = title.trim().to_lowercase();
    let s = HTML_TAG.replace_all(&s, "");
    let s = EMPHASIS.replace_all(&s, "");
    let s = NON_SLUG.replace_all(&s, "");
    WHITESPACE.replace_all(&s, "-").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    pub anchor: String,
    /// Zero-based line index.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub anchor: String,
    pub level: usize,
    pub markdown: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone)]
pub struct PolicyDocument {
    markdown: String,
    headings: Vec<Heading>,
}

impl PolicyDocument {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_POLICY)
    }

    pub fn new(markdown: impl Into<String>) -> Self {
        let markdown = markdown.into();
        let headings = parse_headings(&markdown);
        Self { markdown, headings }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn len(&self) -> usize {
        self.markdown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markdown.is_empty()
    }

    /// Headings down to `levels` deep. Zero is treated as one.
    pub fn sections(&self, levels: usize) -> Vec<&Heading> {
        let max = levels.max(1);
        self.headings.iter().filter(|h| h.level <= max).collect()
    }

    /// The section under a heading, matched by title (case-insensitive) or anchor.
    /// It runs until the next heading of the same or a higher level.
    pub fn section(&self, title_or_anchor: &str) -> Result<Section> {
        let key = title_or_anchor.trim().to_lowercase();
        let target = self
            .headings
            .iter()
            .find(|h| h.title.trim().to_lowercase() == key || h.anchor == key)
            .ok_or_else(|| PolicyError::SectionNotFound(title_or_anchor.to_string()))?;

        let lines: Vec<&str> = self.markdown.lines().collect();
        let end = self
            .headings
            .iter()
            .find(|h| h.line > target.line && h.level <= target.level)
            .map(|h| h.line)
            .unwrap_or(lines.len());

        let body = lines[target.line..end].join("\n");
        Ok(Section {
            title: target.title.clone(),
            anchor: target.anchor.clone(),
            level: target.level,
            markdown: format!("{}\n", body.trim_end()),
            start_line: target.line,
            end_line: end.saturating_sub(1),
        })
    }

    /// Nearest heading at or above `line`.
    pub fn heading_for_line(&self, line: usize) -> Option<&Heading> {
        self.headings.iter().rev().find(|h| h.line <= line)
    }

    pub fn search(&self, query: &str, max_results: usize, context_chars: usize) -> Result<Vec<SearchHit>> {
        search::search(self, query, max_results, context_chars)
    }
}

fn parse_headings(markdown: &str) -> Vec<Heading> {
    markdown
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let caps = HEADING.captures(line)?;
            let title = caps["title"].trim().to_string();
            Some(Heading {
                level: caps["hashes"].len(),
                anchor: slugify(&title),
                title,
                line: idx,
            })
        })
        .collect()
}
