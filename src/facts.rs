//! The fact database: a trie of known premises.
//!
//! Premises are flat token sequences. [`Trie`] is a linearized trie over a
//! flat node vector with `u32` child offsets; [`TrieFactDb`] layers fact
//! hashes (the engine's fast membership path) and the valid-insertion
//! registry that drives completion proposals on top of it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::EdgeType;
use crate::word::Word;

/// A proposed insertion: a word that extends the queried prefix toward a
/// known fact, with the edge type registered for inserting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// The word to insert.
    pub word: Word,
    /// The edge type registered for this word's insertion.
    pub edge_type: EdgeType,
}

/// Read-only interface to the premise store.
pub trait FactDb {
    /// Exact membership of a token sequence, with the caller's structural
    /// hash as a fast path.
    fn contains(&self, hash: u64, tokens: &[Word]) -> bool;

    /// Fill `out` with insertion candidates for the queried prefix and
    /// report whether the exact sequence itself is a known fact.
    fn completions(&self, tokens: &[Word], out: &mut Vec<Completion>) -> bool;
}

const NO_NODE: u32 = u32::MAX;

/// One trie node. Children are kept in insertion order; completion results
/// depend on it.
#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: Vec<(Word, u32)>,
    is_fact: bool,
}

/// A linearized trie over word sequences.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
}

impl Trie {
    /// Create an empty trie holding only the root.
    pub fn new() -> Self {
        Trie {
            nodes: vec![TrieNode::default()],
        }
    }

    /// Insert a token sequence as a known fact.
    pub fn add(&mut self, tokens: &[Word]) {
        let mut at = 0u32;
        for &token in tokens {
            let next = self.child(at, token);
            at = if next == NO_NODE {
                let fresh = self.nodes.len() as u32;
                self.nodes.push(TrieNode::default());
                self.nodes[at as usize].children.push((token, fresh));
                fresh
            } else {
                next
            };
        }
        if at != 0 {
            self.nodes[at as usize].is_fact = true;
        }
    }

    /// Whether the exact token sequence was added as a fact.
    ///
    /// A proper prefix of a fact is not itself a fact, and the empty
    /// sequence never is.
    pub fn contains(&self, tokens: &[Word]) -> bool {
        match self.node_at(tokens) {
            Some(node) if node != 0 => self.nodes[node as usize].is_fact,
            _ => false,
        }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether any fact was added.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn child(&self, node: u32, token: Word) -> u32 {
        self.nodes[node as usize]
            .children
            .iter()
            .find(|(word, _)| *word == token)
            .map(|(_, child)| *child)
            .unwrap_or(NO_NODE)
    }

    fn node_at(&self, tokens: &[Word]) -> Option<u32> {
        let mut at = 0u32;
        for &token in tokens {
            at = self.child(at, token);
            if at == NO_NODE {
                return None;
            }
        }
        Some(at)
    }

    fn children(&self, node: u32) -> &[(Word, u32)] {
        &self.nodes[node as usize].children
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

/// A premise store over a [`Trie`], with fact hashes and the
/// valid-insertion registry.
#[derive(Debug, Clone, Default)]
pub struct TrieFactDb {
    trie: Trie,
    hashes: HashSet<u64>,
    valid_insertions: HashMap<Word, EdgeType>,
}

impl TrieFactDb {
    /// Create an empty fact database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a premise by its token sequence.
    pub fn add(&mut self, tokens: &[Word]) {
        self.trie.add(tokens);
    }

    /// Add a premise along with its structural hash, enabling the engine's
    /// hash fast path for it.
    pub fn add_with_hash(&mut self, tokens: &[Word], hash: u64) {
        self.trie.add(tokens);
        self.hashes.insert(hash);
    }

    /// Register a word as a valid insertion with the given edge type.
    /// Completion proposals only ever report registered words.
    pub fn add_valid_insertion(&mut self, word: Word, edge_type: EdgeType) {
        self.valid_insertions.insert(word, edge_type);
    }

    /// Number of distinct fact hashes recorded.
    pub fn hash_count(&self) -> usize {
        self.hashes.len()
    }
}

impl FactDb for TrieFactDb {
    fn contains(&self, hash: u64, tokens: &[Word]) -> bool {
        self.hashes.contains(&hash) || self.trie.contains(tokens)
    }

    fn completions(&self, tokens: &[Word], out: &mut Vec<Completion>) -> bool {
        out.clear();

        // Append position: children of the node matching the whole prefix.
        if let Some(node) = self.trie.node_at(tokens) {
            for &(word, _) in self.trie.children(node) {
                self.propose(word, out);
            }
        }

        // Prepend position: root children whose immediate child is the
        // query head.
        if let Some(&head) = tokens.first() {
            for &(word, child) in self.trie.children(0) {
                if self.trie.child(child, head) != NO_NODE {
                    self.propose(word, out);
                }
            }
        }

        self.trie.contains(tokens)
    }
}

impl TrieFactDb {
    fn propose(&self, word: Word, out: &mut Vec<Completion>) {
        if let Some(&edge_type) = self.valid_insertions.get(&word) {
            if !out.iter().any(|c| c.word == word) {
                out.push(Completion { word, edge_type });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(raw: u32) -> Word {
        Word::new(raw)
    }

    #[test]
    fn trie_depth_1() {
        let mut trie = Trie::new();
        trie.add(&[w(42)]);
        assert!(trie.contains(&[w(42)]));
        assert!(!trie.contains(&[w(7)]));
    }

    #[test]
    fn trie_depth_2_prefix_is_not_a_fact() {
        let mut trie = Trie::new();
        trie.add(&[w(42), w(43)]);
        assert!(trie.contains(&[w(42), w(43)]));
        assert!(!trie.contains(&[w(42)]));
        trie.add(&[w(42)]);
        assert!(trie.contains(&[w(42), w(43)]));
        assert!(trie.contains(&[w(42)]));
    }

    #[test]
    fn trie_toy_example() {
        let mut trie = Trie::new();
        trie.add(&[w(42), w(43)]);
        trie.add(&[w(42), w(44)]);
        trie.add(&[w(7), w(44)]);
        assert!(trie.contains(&[w(42), w(43)]));
        assert!(trie.contains(&[w(7), w(44)]));
        assert!(trie.contains(&[w(42), w(44)]));
        assert!(!trie.contains(&[w(7), w(42)]));
        assert!(!trie.contains(&[w(42), w(7)]));
        assert!(!trie.contains(&[w(42), w(43), w(43)]));
        assert!(!trie.contains(&[]));
        assert!(!trie.contains(&[w(42)]));
    }

    fn seeded_db() -> TrieFactDb {
        let mut db = TrieFactDb::new();
        db.add(&[w(1), w(2)]);
        db.add(&[w(1), w(3)]);
        db.add(&[w(4), w(1)]);
        db.add(&[w(5), w(2), w(1)]);
        db
    }

    #[test]
    fn completion_proposes_append_then_prepend_in_insertion_order() {
        let mut db = seeded_db();
        for word in 1..=5 {
            db.add_valid_insertion(w(word), crate::graph::INSERTION);
        }
        let mut out = Vec::new();
        let contained = db.completions(&[w(1)], &mut out);
        assert!(!contained);
        let words: Vec<u32> = out.iter().map(|c| c.word.get()).collect();
        assert_eq!(words, vec![2, 3, 4]);
    }

    #[test]
    fn completion_no_match_is_empty() {
        let db = seeded_db();
        let mut out = Vec::new();
        assert!(!db.completions(&[w(6)], &mut out));
        assert!(out.is_empty());
        assert!(!db.completions(&[w(6), w(3)], &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn completion_reports_registered_edge_types() {
        let mut db = seeded_db();
        db.add_valid_insertion(w(1), 0);
        db.add_valid_insertion(w(2), 1);
        db.add_valid_insertion(w(3), 2);
        db.add_valid_insertion(w(4), 3);
        db.add_valid_insertion(w(5), 4);
        let mut out = Vec::new();
        assert!(!db.completions(&[w(1)], &mut out));
        let pairs: Vec<(u32, EdgeType)> =
            out.iter().map(|c| (c.word.get(), c.edge_type)).collect();
        assert_eq!(pairs, vec![(2, 1), (3, 2), (4, 3)]);
    }

    #[test]
    fn unregistered_words_are_never_proposed() {
        let mut db = seeded_db();
        db.add_valid_insertion(w(2), 0);
        let mut out = Vec::new();
        db.completions(&[w(1)], &mut out);
        let words: Vec<u32> = out.iter().map(|c| c.word.get()).collect();
        assert_eq!(words, vec![2]);
    }

    #[test]
    fn hash_fast_path_reports_contained() {
        let mut db = TrieFactDb::new();
        db.add_with_hash(&[w(9)], 0xDEAD_BEEF);
        assert!(db.contains(0xDEAD_BEEF, &[w(1), w(2)]));
        assert!(db.contains(0, &[w(9)]));
        assert!(!db.contains(0, &[w(1)]));
        assert_eq!(db.hash_count(), 1);
    }
}
