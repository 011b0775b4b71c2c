//! Trie data structure for longest-match prefix scanning
//!
//! Used by the date/time format translator, where specifiers overlap
//! (`MON` vs `MONTH`, `HH` vs `HH24`) and the longest one must win.

use std::collections::HashMap;

/// Result of following one character in a trie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieResult {
    /// Key not found in trie
    Failed,
    /// Key is a prefix of an existing key
    Prefix,
    /// Key exists in trie
    Exists,
}

/// A trie (prefix tree) mapping string keys to values
#[derive(Debug, Clone)]
pub struct Trie<V> {
    children: HashMap<char, Trie<V>>,
    value: Option<V>,
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Trie<V> {
    pub fn new() -> Self {
        Self {
            children: HashMap::new(),
            value: None,
        }
    }

    pub fn insert(&mut self, key: &str, value: V) {
        let mut current = self;
        for ch in key.chars() {
            current = current.children.entry(ch).or_insert_with(Trie::new);
        }
        current.value = Some(value);
    }

    /// Look up a whole key
    pub fn in_trie(&self, key: &str) -> (TrieResult, Option<&V>) {
        if key.is_empty() {
            return (TrieResult::Failed, None);
        }
        let mut current = self;
        for ch in key.chars() {
            match current.children.get(&ch) {
                Some(child) => current = child,
                None => return (TrieResult::Failed, None),
            }
        }
        match current.value.as_ref() {
            Some(value) => (TrieResult::Exists, Some(value)),
            None => (TrieResult::Prefix, None),
        }
    }

    /// Follow a single character from this node
    pub fn in_trie_char(&self, ch: char) -> (TrieResult, Option<&Trie<V>>) {
        match self.children.get(&ch) {
            Some(child) if child.value.is_some() => (TrieResult::Exists, Some(child)),
            Some(child) => (TrieResult::Prefix, Some(child)),
            None => (TrieResult::Failed, None),
        }
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Longest key that prefixes `chars`, as (length in chars, value)
    pub fn longest_match(&self, chars: &[char]) -> Option<(usize, &V)> {
        let mut current = self;
        let mut best = None;
        for (i, ch) in chars.iter().enumerate() {
            match current.in_trie_char(*ch) {
                (TrieResult::Failed, _) | (_, None) => break,
                (TrieResult::Exists, Some(child)) => {
                    best = child.value().map(|v| (i + 1, v));
                    current = child;
                }
                (TrieResult::Prefix, Some(child)) => current = child,
            }
        }
        best
    }
}

impl<'a, V> FromIterator<(&'a str, V)> for Trie<V> {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Self {
        let mut trie = Trie::new();
        for (key, value) in iter {
            trie.insert(key, value);
        }
        trie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_trie() {
        let trie: Trie<u8> = [("cat", 1), ("car", 2)].into_iter().collect();
        assert_eq!(trie.in_trie("cat"), (TrieResult::Exists, Some(&1)));
        assert_eq!(trie.in_trie("ca").0, TrieResult::Prefix);
        assert_eq!(trie.in_trie("dog").0, TrieResult::Failed);
        assert_eq!(trie.in_trie("").0, TrieResult::Failed);
    }

    #[test]
    fn test_longest_match_prefers_longer_key() {
        let trie: Trie<&str> = [("MON", "MMM"), ("MONTH", "MMMM"), ("MI", "mm")]
            .into_iter()
            .collect();
        let chars: Vec<char> = "MONTH-DD".chars().collect();
        assert_eq!(trie.longest_match(&chars), Some((5, &"MMMM")));
        let chars: Vec<char> = "MONDAY".chars().collect();
        assert_eq!(trie.longest_match(&chars), Some((3, &"MMM")));
        let chars: Vec<char> = "MX".chars().collect();
        assert_eq!(trie.longest_match(&chars), None);
    }
}
