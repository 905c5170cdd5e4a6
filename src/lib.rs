//! # natlog
//!
//! Natural-logic inference by search: given a query sentence as a packed
//! dependency tree, search the space of syntactically licensed edits
//! (single-word mutations, subtree deletions) that monotonically transform
//! the query into a premise stored in a fact database. A successful search
//! returns a path of edits — a natural-logic proof — whose cumulative cost
//! clears a threshold.
//!
//! ## Architecture
//!
//! - **Dependency tree** (`tree`): packed fixed-capacity tree with an
//!   incremental, order-independent XOR hash
//! - **Search core** (`search`): 32-byte nodes in a bucketed arena, BFS/UCS
//!   fringe, bloom seen-set, expander, and the tick-loop engine
//! - **Collaborators** (`graph`, `facts`, `weights`): read-only traits for
//!   the mutation KB, the premise trie, and the cost/projection model
//! - **Channel** (`channel`): lockless SPSC ring for streaming successors
//!   to an optional sibling consumer
//!
//! ## Library usage
//!
//! ```
//! use natlog::facts::TrieFactDb;
//! use natlog::graph::{InMemoryGraph, HYPERNYM};
//! use natlog::search::{syn_search, SearchOptions};
//! use natlog::tree::Tree;
//! use natlog::weights::WeightVector;
//! use natlog::word::{Monotonicity, TaggedWord, Word, TREE_ROOT};
//!
//! let potto = Word::new(1);
//! let animal = Word::new(2);
//! let graph = InMemoryGraph::builder()
//!     .edge(potto, animal, HYPERNYM, 0.1)
//!     .build();
//! let mut facts = TrieFactDb::new();
//! facts.add(&[animal]);
//!
//! let tree = Tree::new(
//!     &[TaggedWord::new(potto, 0, Monotonicity::Default)],
//!     &[TREE_ROOT],
//!     &[0],
//! )?;
//! let weights = WeightVector::uniform();
//! let response = syn_search(&graph, &facts, &weights, &tree, &SearchOptions::default())?;
//! assert!(response.found());
//! # Ok::<(), natlog::error::NatlogError>(())
//! ```

pub mod channel;
pub mod error;
pub mod facts;
pub mod graph;
pub mod search;
pub mod tree;
pub mod weights;
pub mod word;
