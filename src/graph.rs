//! The mutation graph: the lexical KB of licensed word-to-word edits.
//!
//! The search core consumes the graph through the read-only
//! [`MutationGraph`] trait. Edges are stored indexed by sink (the canonical
//! KB layout); [`InMemoryGraph`] additionally derives an outgoing overlay at
//! construction so the expander can walk edits in rewrite direction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::word::{TaggedWord, Word};

/// A mutation-edge type id.
pub type EdgeType = u8;

/// Hypernymy: rewrite toward a more general word.
pub const HYPERNYM: EdgeType = 0;
/// Hyponymy: rewrite toward a more specific word.
pub const HYPONYM: EdgeType = 1;
/// Noun antonymy.
pub const NOUN_ANTONYM: EdgeType = 2;
/// Noun synonymy.
pub const NOUN_SYNONYM: EdgeType = 3;
/// Verb antonymy.
pub const VERB_ANTONYM: EdgeType = 4;
/// Adjective antonymy.
pub const ADJ_ANTONYM: EdgeType = 5;
/// Adverb antonymy.
pub const ADV_ANTONYM: EdgeType = 6;
/// Adjective pertainymy.
pub const ADJ_PERTAINYM: EdgeType = 7;
/// Adverb pertainymy.
pub const ADV_PERTAINYM: EdgeType = 8;
/// Distributional nearest neighbor. Parametric noise, not a logical edit;
/// the expander skips these.
pub const NEAREST_NEIGHBOR: EdgeType = 9;
/// Subtree deletion.
pub const DELETION: EdgeType = 10;
/// Token insertion (proposed through fact-database completions).
pub const INSERTION: EdgeType = 11;
/// Number of edge types the weight tables are sized for.
pub const NUM_EDGE_TYPES: usize = 12;
/// Sentinel for "no previous edge" (the root of a search).
pub const NO_EDGE: EdgeType = 0xFF;

/// A licensed lexical substitution with a type and a cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// The word being rewritten.
    pub source: Word,
    /// Sense of the source word.
    pub source_sense: u8,
    /// The word rewritten to.
    pub sink: Word,
    /// Sense of the sink word.
    pub sink_sense: u8,
    /// The edit class of this edge.
    pub edge_type: EdgeType,
    /// The base cost of taking this edge.
    pub cost: f32,
}

/// Read-only interface to the mutation graph.
///
/// Implementations must keep edge slices stable across calls for at least
/// the lifetime of any engine consuming them.
pub trait MutationGraph {
    /// All edges whose sink is `sink` (the KB's canonical index).
    fn incoming_edges(&self, sink: Word) -> &[Edge];

    /// All edges whose source is `source` (the bidirectional overlay).
    fn outgoing_edges(&self, source: Word) -> &[Edge];

    /// A human-readable gloss for pretty-printing; `"<UNK>"` when the word
    /// is not in the vocabulary.
    fn gloss(&self, word: TaggedWord) -> &str;

    /// Whether deleting the edge's source word is permitted.
    fn contains_deletion(&self, edge: &Edge) -> bool;

    /// Size of the vocabulary.
    fn vocab_size(&self) -> u64;
}

/// A simple in-memory mutation graph with the word indexer and both edge
/// directions materialised.
#[derive(Debug)]
pub struct InMemoryGraph {
    glosses: Vec<Option<String>>,
    edges_by_sink: Vec<Vec<Edge>>,
    edges_by_source: Vec<Vec<Edge>>,
    /// Fast guard: true for words that have at least one flagged sense.
    maybe_invalid_deletion: Vec<bool>,
    invalid_deletions: HashSet<(Word, u8)>,
    vocab_size: u64,
}

impl MutationGraph for InMemoryGraph {
    fn incoming_edges(&self, sink: Word) -> &[Edge] {
        self.edges_by_sink
            .get(sink.get() as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn outgoing_edges(&self, source: Word) -> &[Edge] {
        self.edges_by_source
            .get(source.get() as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn gloss(&self, word: TaggedWord) -> &str {
        self.glosses
            .get(word.word().get() as usize)
            .and_then(Option::as_deref)
            .unwrap_or("<UNK>")
    }

    fn contains_deletion(&self, edge: &Edge) -> bool {
        // Words with no flagged sense delete freely; flagged words fall back
        // to the exact (word, sense) set.
        let flagged = self
            .maybe_invalid_deletion
            .get(edge.source.get() as usize)
            .copied()
            .unwrap_or(false);
        if flagged {
            !self
                .invalid_deletions
                .contains(&(edge.source, edge.source_sense))
        } else {
            true
        }
    }

    fn vocab_size(&self) -> u64 {
        self.vocab_size
    }
}

impl InMemoryGraph {
    /// Start building a graph.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }
}

/// Builder for [`InMemoryGraph`], used by KB loaders and tests.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    glosses: HashMap<u32, String>,
    edges: Vec<Edge>,
    invalid_deletions: HashSet<(Word, u8)>,
}

impl GraphBuilder {
    /// Register a gloss for a word.
    pub fn gloss(mut self, word: Word, gloss: impl Into<String>) -> Self {
        self.glosses.insert(word.get(), gloss.into());
        self
    }

    /// Add a mutation edge.
    pub fn edge(
        mut self,
        source: Word,
        sink: Word,
        edge_type: EdgeType,
        cost: f32,
    ) -> Self {
        self.edges.push(Edge {
            source,
            source_sense: 0,
            sink,
            sink_sense: 0,
            edge_type,
            cost,
        });
        self
    }

    /// Add a mutation edge with explicit senses.
    pub fn sense_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Flag a (word, sense) whose deletion is not permitted.
    pub fn invalid_deletion(mut self, word: Word, sense: u8) -> Self {
        self.invalid_deletions.insert((word, sense));
        self
    }

    /// Materialise the graph, sizing the vocabulary to the largest word seen.
    pub fn build(self) -> InMemoryGraph {
        let max_word = self
            .edges
            .iter()
            .flat_map(|e| [e.source.get(), e.sink.get()])
            .chain(self.glosses.keys().copied())
            .chain(self.invalid_deletions.iter().map(|(w, _)| w.get()))
            .max()
            .map(|w| w + 1)
            .unwrap_or(0) as usize;

        let mut glosses = vec![None; max_word];
        for (word, gloss) in self.glosses {
            glosses[word as usize] = Some(gloss);
        }

        let mut edges_by_sink = vec![Vec::new(); max_word];
        let mut edges_by_source = vec![Vec::new(); max_word];
        for edge in self.edges {
            edges_by_sink[edge.sink.get() as usize].push(edge);
            edges_by_source[edge.source.get() as usize].push(edge);
        }

        let mut maybe_invalid_deletion = vec![false; max_word];
        for (word, _) in &self.invalid_deletions {
            maybe_invalid_deletion[word.get() as usize] = true;
        }

        InMemoryGraph {
            glosses,
            edges_by_sink,
            edges_by_source,
            maybe_invalid_deletion,
            invalid_deletions: self.invalid_deletions,
            vocab_size: max_word as u64,
        }
    }
}

/// Word ids used by [`mock_graph`].
pub mod mock {
    use crate::word::Word;

    pub const LEMUR: Word = Word::new(100);
    pub const ANIMAL: Word = Word::new(101);
    pub const POTTO: Word = Word::new(102);
    pub const CAT: Word = Word::new(103);
    pub const HAVE: Word = Word::new(104);
    pub const TAIL: Word = Word::new(105);
}

/// A small fixed graph for tests and benchmarks: potto ⇒ lemur ⇒ animal ⇒
/// cat (hypernym / hyponym pairs), with "have" flagged as an invalid
/// deletion.
pub fn mock_graph() -> InMemoryGraph {
    InMemoryGraph::builder()
        .gloss(mock::LEMUR, "lemur")
        .gloss(mock::ANIMAL, "animal")
        .gloss(mock::POTTO, "potto")
        .gloss(mock::CAT, "cat")
        .gloss(mock::HAVE, "have")
        .gloss(mock::TAIL, "tail")
        .edge(mock::POTTO, mock::LEMUR, HYPERNYM, 0.01)
        .edge(mock::LEMUR, mock::ANIMAL, HYPERNYM, 0.42)
        .edge(mock::ANIMAL, mock::CAT, HYPONYM, 42.0)
        .invalid_deletion(mock::HAVE, 3)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Monotonicity;

    fn tagged(word: Word) -> TaggedWord {
        TaggedWord::new(word, 0, Monotonicity::Default)
    }

    #[test]
    fn edges_are_indexed_both_ways() {
        let graph = mock_graph();
        let incoming = graph.incoming_edges(mock::LEMUR);
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source, mock::POTTO);

        let outgoing = graph.outgoing_edges(mock::LEMUR);
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].sink, mock::ANIMAL);
    }

    #[test]
    fn out_of_vocabulary_words_have_no_edges() {
        let graph = mock_graph();
        assert!(graph.incoming_edges(Word::new(999_999)).is_empty());
        assert!(graph.outgoing_edges(Word::new(999_999)).is_empty());
    }

    #[test]
    fn gloss_falls_back_to_unk() {
        let graph = mock_graph();
        assert_eq!(graph.gloss(tagged(mock::POTTO)), "potto");
        assert_eq!(graph.gloss(tagged(Word::new(999_999))), "<UNK>");
    }

    #[test]
    fn unflagged_words_delete_freely() {
        let graph = mock_graph();
        let edge = Edge {
            source: mock::TAIL,
            source_sense: 0,
            sink: Word::new(0),
            sink_sense: 0,
            edge_type: DELETION,
            cost: 1.0,
        };
        assert!(graph.contains_deletion(&edge));
    }

    #[test]
    fn flagged_sense_blocks_deletion_but_other_senses_pass() {
        let graph = mock_graph();
        let mut edge = Edge {
            source: mock::HAVE,
            source_sense: 3,
            sink: Word::new(0),
            sink_sense: 0,
            edge_type: DELETION,
            cost: 1.0,
        };
        assert!(!graph.contains_deletion(&edge));
        edge.source_sense = 0;
        assert!(graph.contains_deletion(&edge));
    }

    #[test]
    fn vocab_size_covers_largest_word() {
        let graph = mock_graph();
        assert_eq!(graph.vocab_size(), mock::TAIL.get() as u64 + 1);
    }
}
