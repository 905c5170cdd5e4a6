//! The search engine: the tick loop over the fringe.
//!
//! One tick is one pop plus one expansion. The engine owns the pool, the
//! fringe, and the seen set for exactly one query; the mutation graph, fact
//! database, and weight model are read-only collaborators shared across
//! queries.

use crate::channel::Producer;
use crate::error::{SearchError, SearchResult};
use crate::facts::FactDb;
use crate::graph::MutationGraph;
use crate::tree::Tree;
use crate::weights::WeightModel;
use crate::word::{Word, MAX_QUERY_LENGTH};

use super::expand::Expander;
use super::fringe::{Fringe, SearchStrategy};
use super::node::SearchNode;
use super::pool::NodePool;
use super::seen::{BloomSeenSet, NoSeenSet, SeenSet};
use super::{SearchOptions, SearchResponse, Termination};

/// Which seen-set strategy an engine allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SeenStrategy {
    /// No duplicate suppression.
    None,
    /// A bloom filter of the given geometry.
    Bloom { bits: usize, hashes: u32 },
}

/// Resource configuration for one engine.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Fringe discipline.
    pub strategy: SearchStrategy,
    /// Ceiling on pool allocations.
    pub max_pool_nodes: u32,
    /// Ceiling on queued fringe entries.
    pub fringe_capacity: usize,
    /// Seen-set strategy.
    pub seen: SeenStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            strategy: SearchStrategy::UniformCost,
            max_pool_nodes: 1 << 22,
            fringe_capacity: 1 << 20,
            seen: SeenStrategy::Bloom {
                bits: 1 << 23,
                hashes: 3,
            },
        }
    }
}

/// A single-query search engine.
pub struct Engine<'a> {
    tree: &'a Tree,
    graph: &'a dyn MutationGraph,
    facts: &'a dyn FactDb,
    weights: &'a dyn WeightModel,
    config: EngineConfig,
    mirror: Option<Producer>,
}

impl<'a> Engine<'a> {
    /// Create an engine over a query tree and its collaborators.
    pub fn new(
        graph: &'a dyn MutationGraph,
        facts: &'a dyn FactDb,
        weights: &'a dyn WeightModel,
        tree: &'a Tree,
        config: EngineConfig,
    ) -> SearchResult<Self> {
        if config.max_pool_nodes == 0 {
            return Err(SearchError::InvalidConfig {
                message: "max_pool_nodes must be > 0".into(),
            });
        }
        if config.fringe_capacity == 0 {
            return Err(SearchError::InvalidConfig {
                message: "fringe_capacity must be > 0".into(),
            });
        }
        tracing::debug!(
            strategy = ?config.strategy,
            pool = config.max_pool_nodes,
            fringe = config.fringe_capacity,
            query_length = tree.len(),
            "initializing search engine"
        );
        Ok(Engine {
            tree,
            graph,
            facts,
            weights,
            config,
            mirror: None,
        })
    }

    /// Mirror expanded successors into an SPSC channel for a sibling
    /// consumer (scoring, deduplication, persistence). The mirror never
    /// blocks the search; children are dropped when the ring is full.
    pub fn with_mirror(mut self, producer: Producer) -> Self {
        self.mirror = Some(producer);
        self
    }

    /// Run the search to termination.
    pub fn run(&mut self, options: &SearchOptions) -> SearchResponse {
        let mut pool = NodePool::new(self.config.max_pool_nodes);
        let mut fringe = Fringe::new(self.config.strategy, self.config.fringe_capacity);
        let mut seen: Box<dyn SeenSet> = match self.config.seen {
            SeenStrategy::None => Box::new(NoSeenSet),
            SeenStrategy::Bloom { bits, hashes } => Box::new(BloomSeenSet::new(bits, hashes)),
        };
        let expander = Expander::new(self.tree, self.graph, self.weights);

        let root = SearchNode::root(self.tree);
        seen.record(root.fact_hash());
        let mut paths = Vec::new();
        let mut ticks = 0u64;

        let termination = match pool.alloc(root) {
            None => Termination::OutOfMemory,
            Some(root_id) if !fringe.push(root_id, root.priority_key()) => {
                Termination::OutOfMemory
            }
            Some(_) => loop {
                if fringe.is_empty() {
                    break Termination::Exhausted;
                }
                if ticks >= options.max_ticks as u64 {
                    break Termination::Timeout;
                }
                let Some((id, key)) = fringe.pop() else {
                    break Termination::Exhausted;
                };
                ticks += 1;
                // UCS pops in key order, so everything left is at least
                // this expensive.
                if key > options.cost_threshold {
                    break Termination::Exhausted;
                }

                let node = *pool.get(id);
                let tokens = current_tokens(self.tree, &pool, id);
                if self.facts.contains(node.fact_hash(), &tokens) {
                    if !options.silent {
                        tracing::debug!(tick = ticks, cost = key, "premise matched");
                    }
                    paths.push(pool.reconstruct_path(id));
                    if options.stop_when_result_found {
                        break Termination::Found;
                    }
                }

                match expander.expand(
                    id,
                    &mut pool,
                    &mut fringe,
                    seen.as_mut(),
                    self.mirror.as_mut(),
                ) {
                    Ok(_) => {}
                    Err(error) => {
                        tracing::warn!(error = %error, tick = ticks, "search out of memory");
                        break Termination::OutOfMemory;
                    }
                }

                if !options.silent && ticks % 10_000 == 0 {
                    tracing::debug!(
                        tick = ticks,
                        fringe = fringe.len(),
                        pool = pool.len(),
                        results = paths.len(),
                        "search tick"
                    );
                }
            },
        };

        if !options.silent {
            tracing::debug!(
                ticks,
                results = paths.len(),
                termination = %termination,
                "search finished"
            );
        }
        SearchResponse {
            paths,
            total_ticks: ticks,
            termination,
        }
    }
}

/// The token sequence of the implicit current tree at `id`: the nearest
/// assignment along the backpointer chain wins per index, the node's
/// deletion mask filters, and the survivors come out in index order.
fn current_tokens(tree: &Tree, pool: &NodePool, id: u32) -> Vec<Word> {
    let mask = pool.get(id).delete_mask();
    let mut assigned: [Option<Word>; MAX_QUERY_LENGTH] = [None; MAX_QUERY_LENGTH];
    let mut at = id;
    loop {
        let node = pool.get(at);
        let slot = &mut assigned[node.index() as usize];
        if slot.is_none() {
            *slot = Some(node.current_token().word());
        }
        if at == 0 {
            break;
        }
        at = node.backpointer();
    }
    (0..tree.len())
        .filter(|&i| mask & (1 << i) == 0)
        .map(|i| assigned[i as usize].unwrap_or_else(|| tree.word(i).word()))
        .collect()
}
