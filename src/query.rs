//! Query parsing, execution, and snippet extraction.
//!
//! A raw query string maps to one of three match policies:
//!
//! - exact mode: the whole string is a single literal substring
//! - `OR` mode: the string contains the token `OR` (case-insensitive,
//!   surrounded by spaces) and splits into ANY-of keywords
//! - AND mode: the string splits on whitespace into ALL-of keywords
//!
//! Results come back in storage order, capped, unranked. Matching is plain
//! substring matching; callers wanting a standalone word in exact mode pad
//! it with spaces themselves (the CLI does this for single words).

use chrono::{Local, TimeZone};
use std::path::Path;
use std::time::Duration;

use crate::cache::{SearchCache, CACHE_TTL};
use crate::config::Config;
use crate::error::EngineError;
use crate::models::{IndexedDocument, SearchHit};
use crate::store::{DocumentStore, Predicate};

/// Maximum rows examined per query.
pub const RESULT_CAP: i64 = 1000;

/// Characters of context kept on each side of a match.
const CONTEXT_RADIUS: usize = 100;
/// Fallback snippet length when no occurrence is found in the content.
const FALLBACK_CHARS: usize = 200;
/// Separator between per-keyword context windows in fuzzy mode.
const CONTEXT_SEPARATOR: &str = "\n...\n";

pub struct SearchEngine {
    store: DocumentStore,
    config: Config,
    cache: SearchCache,
}

impl SearchEngine {
    pub fn new(store: DocumentStore, config: Config) -> Self {
        Self::with_cache_ttl(store, config, CACHE_TTL)
    }

    pub fn with_cache_ttl(store: DocumentStore, config: Config, ttl: Duration) -> Self {
        Self {
            store,
            config,
            cache: SearchCache::new(ttl),
        }
    }

    /// Runs a query against the document store. May run concurrently with
    /// an ongoing indexing run; it then sees the index state as of the last
    /// committed run.
    pub async fn search(
        &self,
        query: &str,
        exact_match: bool,
        include_subfolders: bool,
    ) -> Result<Vec<SearchHit>, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidQuery("query is empty".to_string()));
        }

        if let Some(hits) = self.cache.get(query, exact_match, include_subfolders) {
            return Ok(hits);
        }

        let predicate = build_predicate(query, exact_match);
        let rows = self.store.query_contains(&predicate, RESULT_CAP).await?;

        let hits: Vec<SearchHit> = rows
            .iter()
            .filter(|doc| self.in_scope(doc, include_subfolders))
            .map(|doc| self.to_hit(doc, query, exact_match))
            .collect();

        self.cache
            .insert(query, exact_match, include_subfolders, hits.clone());
        Ok(hits)
    }

    /// Scope and exclusion post-filters. The exclusion check repeats the
    /// index-time rule in case patterns changed after a row was written.
    fn in_scope(&self, doc: &IndexedDocument, include_subfolders: bool) -> bool {
        let path = Path::new(&doc.path);
        if !include_subfolders && path.parent() != Some(self.config.source.folder.as_path()) {
            return false;
        }
        !self.config.is_excluded(path)
    }

    fn to_hit(&self, doc: &IndexedDocument, query: &str, exact_match: bool) -> SearchHit {
        let file_name = Path::new(&doc.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| doc.path.clone());
        SearchHit {
            path: doc.path.clone(),
            file_name,
            context: extract_context(&doc.content, query, exact_match),
            last_modified: format_timestamp(doc.last_modified),
        }
    }
}

/// Builds the match predicate for a query under the parsing policy above.
pub fn build_predicate(query: &str, exact_match: bool) -> Predicate {
    if exact_match {
        return Predicate::Literal(query.to_string());
    }

    if let Some(keywords) = split_or_keywords(query) {
        return Predicate::Any(keywords.into_iter().map(Predicate::Literal).collect());
    }

    Predicate::All(
        query
            .split_whitespace()
            .map(|k| Predicate::Literal(k.to_string()))
            .collect(),
    )
}

/// Splits on the ` OR ` token, case-insensitively, preserving keyword case.
/// Returns `None` when no token is present or every part is blank.
fn split_or_keywords(query: &str) -> Option<Vec<String>> {
    let lower = query.to_ascii_lowercase();
    let mut keywords = Vec::new();
    let mut last = 0;
    for (i, _) in lower.match_indices(" or ") {
        keywords.push(query[last..i].trim().to_string());
        last = i + 4;
    }
    if keywords.is_empty() {
        return None;
    }
    keywords.push(query[last..].trim().to_string());
    keywords.retain(|k| !k.is_empty());
    if keywords.is_empty() {
        None
    } else {
        Some(keywords)
    }
}

/// Extracts a bounded context snippet for a hit.
///
/// Exact mode: up to [`CONTEXT_RADIUS`] characters on each side of the first
/// occurrence of the literal query. Fuzzy mode: one window per keyword,
/// joined with a separator. Falls back to the head of the content when no
/// occurrence is found (the occurrence lookup is case-sensitive while the
/// store's LIKE is not, so a fallback can legitimately trigger).
pub(crate) fn extract_context(content: &str, query: &str, exact_match: bool) -> String {
    if exact_match {
        if let Some(start) = content.find(query) {
            return window_around(content, start, start + query.len()).to_string();
        }
    } else {
        let keywords = split_or_keywords(query)
            .unwrap_or_else(|| query.split_whitespace().map(str::to_string).collect());
        let windows: Vec<&str> = keywords
            .iter()
            .filter_map(|k| {
                content
                    .find(k.as_str())
                    .map(|start| window_around(content, start, start + k.len()))
            })
            .collect();
        if !windows.is_empty() {
            return windows.join(CONTEXT_SEPARATOR);
        }
    }
    head(content, FALLBACK_CHARS).to_string()
}

/// Expands `[start, end)` by up to [`CONTEXT_RADIUS`] characters on each
/// side, staying on char boundaries and truncating at content edges.
fn window_around(content: &str, start: usize, end: usize) -> &str {
    let from = content[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_RADIUS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = content[end..]
        .char_indices()
        .nth(CONTEXT_RADIUS)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());
    &content[from..to]
}

/// First `n` characters of `content` (char-boundary safe).
fn head(content: &str, n: usize) -> &str {
    content
        .char_indices()
        .nth(n)
        .map(|(i, _)| &content[..i])
        .unwrap_or(content)
}

fn format_timestamp(epoch_secs: i64) -> String {
    Local
        .timestamp_opt(epoch_secs, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mode_is_one_literal() {
        assert_eq!(
            build_predicate(" foo bar ", true),
            Predicate::Literal(" foo bar ".to_string())
        );
    }

    #[test]
    fn whitespace_split_builds_and() {
        assert_eq!(
            build_predicate("alpha  beta", false),
            Predicate::All(vec![
                Predicate::Literal("alpha".to_string()),
                Predicate::Literal("beta".to_string()),
            ])
        );
    }

    #[test]
    fn or_token_builds_any_case_insensitively() {
        let expected = Predicate::Any(vec![
            Predicate::Literal("alpha".to_string()),
            Predicate::Literal("beta".to_string()),
        ]);
        assert_eq!(build_predicate("alpha OR beta", false), expected);
        assert_eq!(build_predicate("alpha or beta", false), expected);
    }

    #[test]
    fn or_branches_may_contain_spaces() {
        assert_eq!(
            build_predicate("terminal block OR fuse", false),
            Predicate::Any(vec![
                Predicate::Literal("terminal block".to_string()),
                Predicate::Literal("fuse".to_string()),
            ])
        );
    }

    #[test]
    fn or_inside_a_word_is_not_a_token() {
        // "order" contains "or" but has no standalone token.
        assert_eq!(
            build_predicate("order form", false),
            Predicate::All(vec![
                Predicate::Literal("order".to_string()),
                Predicate::Literal("form".to_string()),
            ])
        );
    }

    #[test]
    fn exact_snippet_is_bounded() {
        let content = format!("{}needle{}", "a".repeat(500), "b".repeat(500));
        let snippet = extract_context(&content, "needle", true);
        assert!(snippet.contains("needle"));
        assert_eq!(snippet.chars().count(), 200 + "needle".len());
    }

    #[test]
    fn exact_snippet_truncates_at_content_edges() {
        let snippet = extract_context("needle at start", "needle", true);
        assert_eq!(snippet, "needle at start");
    }

    #[test]
    fn fuzzy_snippet_joins_keyword_windows() {
        let content = format!("alpha{}beta", " x".repeat(300));
        let snippet = extract_context(&content, "alpha beta", false);
        assert!(snippet.contains("alpha"));
        assert!(snippet.contains("beta"));
        assert!(snippet.contains("\n...\n"));
    }

    #[test]
    fn missing_occurrence_falls_back_to_head() {
        let content = "X".repeat(400);
        let snippet = extract_context(&content, "zzz", false);
        assert_eq!(snippet.chars().count(), 200);
    }

    #[test]
    fn snippet_windows_are_char_boundary_safe() {
        let content = format!("{}目標{}", "あ".repeat(150), "い".repeat(150));
        let snippet = extract_context(&content, "目標", true);
        assert!(snippet.contains("目標"));
        assert_eq!(snippet.chars().count(), 202);
    }

    #[test]
    fn format_timestamp_shape() {
        let formatted = format_timestamp(0);
        // Local-time rendering, so only check the shape.
        assert_eq!(formatted.len(), 19);
        assert_eq!(&formatted[4..5], "-");
        assert_eq!(&formatted[13..14], ":");
    }
}
