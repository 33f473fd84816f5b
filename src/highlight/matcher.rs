//! TermMatcher - whole-word dictionary matching via Aho-Corasick
//!
//! Every occurrence of every term is enumerated with an overlapping search
//! over a case-folded copy of the text, then filtered to whole words and
//! reduced greedily: earliest start wins, longest wins at the same start.
//! Folding keeps each character's UTF-8 width so offsets into the folded
//! copy are valid offsets into the original text.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, BuildError, MatchKind};
use serde::{Deserialize, Serialize};

use crate::terms::TermSet;

/// One whole-word occurrence, as byte offsets into the scanned text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMatch {
    pub start: usize,
    pub end: usize,
    /// Dictionary entry that matched (lower-case)
    pub term: String,
}

pub struct TermMatcher {
    automaton: AhoCorasick,
    terms: Vec<String>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Lower-case each character whose lower-case form has the same width
pub fn fold_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) if l.len_utf8() == c.len_utf8() => out.push(l),
            _ => out.push(c),
        }
    }
    out
}

fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

impl TermMatcher {
    /// Build the automaton for a term set. An empty set yields a matcher
    /// that never matches.
    pub fn build(terms: &TermSet) -> Result<Self, BuildError> {
        let mut patterns: Vec<String> = terms
            .iter()
            .map(fold_case)
            .filter(|t| !t.is_empty())
            .collect();
        patterns.sort();
        patterns.dedup();

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&patterns)?;

        Ok(Self {
            automaton,
            terms: patterns,
        })
    }

    pub fn pattern_count(&self) -> usize {
        self.terms.len()
    }

    /// Non-overlapping whole-word matches in ascending order
    pub fn find_all(&self, text: &str) -> Vec<TermMatch> {
        if self.terms.is_empty() || text.is_empty() {
            return Vec::new();
        }

        let folded = fold_case(text);
        let mut candidates: Vec<(usize, usize, usize)> = self
            .automaton
            .find_overlapping_iter(&folded)
            .filter(|m| is_whole_word(&folded, m.start(), m.end()))
            .map(|m| (m.start(), m.end(), m.pattern().as_usize()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut matches = Vec::new();
        let mut cursor = 0;
        for (start, end, pattern) in candidates {
            if start < cursor {
                continue;
            }
            matches.push(TermMatch {
                start,
                end,
                term: self.terms[pattern].clone(),
            });
            cursor = end;
        }
        matches
    }
}

// =============================================================================
// Tests
// =============================================================================
