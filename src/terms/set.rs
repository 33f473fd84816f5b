//! TermSet: the normalized dictionary of known medical terms

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Lower-cased, trimmed, deduplicated set of terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    terms: HashSet<String>,
}

impl TermSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and add a term. Blank entries are dropped.
    pub fn insert(&mut self, term: &str) -> bool {
        let normalized = term.trim().to_lowercase();
        if normalized.is_empty() {
            return false;
        }
        self.terms.insert(normalized)
    }

    /// Exact membership on an already-normalized term
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Order-independent content hash, used to skip automaton rebuilds when
    /// the dictionary has not changed between passes.
    pub fn fingerprint(&self) -> u64 {
        let mut sorted: Vec<&str> = self.iter().collect();
        sorted.sort_unstable();

        let mut hasher = DefaultHasher::new();
        sorted.hash(&mut hasher);
        hasher.finish()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TermSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TermSet::new();
        for term in iter {
            set.insert(term.as_ref());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_are_lowercased_and_deduplicated() {
        let set: TermSet = ["Diabetes", "diabetes", "  Asthma ", "ASTHMA"].into_iter().collect();

        assert_eq!(set.len(), 2);
        assert!(set.contains("diabetes"));
        assert!(set.contains("asthma"));
        assert!(!set.contains("Diabetes"));
    }

    #[test]
    fn test_blank_terms_dropped() {
        let set: TermSet = ["", "   ", "gout"].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_fingerprint_ignores_insertion_order() {
        let a: TermSet = ["gout", "asthma", "fever"].into_iter().collect();
        let b: TermSet = ["Fever", "gout", "asthma"].into_iter().collect();
        let c: TermSet = ["gout", "asthma"].into_iter().collect();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
