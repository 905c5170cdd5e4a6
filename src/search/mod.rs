//! The search core: nodes, pool, fringe, seen set, expander, and engine.
//!
//! The entry point is [`syn_search`], which runs a default-configured
//! [`Engine`] over a query tree; callers needing a BFS fringe, custom
//! resource ceilings, or the producer/consumer mirror construct the engine
//! directly.

pub mod engine;
pub mod expand;
pub mod fringe;
pub mod node;
pub mod pool;
pub mod seen;

use serde::{Deserialize, Serialize};

use crate::error::NatlogResult;
use crate::facts::FactDb;
use crate::graph::MutationGraph;
use crate::tree::Tree;
use crate::weights::WeightModel;

pub use engine::{Engine, EngineConfig, SeenStrategy};
pub use expand::Expander;
pub use fringe::{Fringe, SearchStrategy};
pub use node::SearchNode;
pub use pool::{NodePool, POOL_BUCKET_SHIFT};
pub use seen::{BloomSeenSet, NoSeenSet, SeenSet};

/// Parameterization of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of ticks (nodes popped) before timing out.
    pub max_ticks: u32,
    /// Nodes costlier than this are never visited.
    pub cost_threshold: f32,
    /// Stop at the first premise matched instead of searching on.
    pub stop_when_result_found: bool,
    /// Suppress per-tick logging.
    pub silent: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_ticks: 10_000,
            cost_threshold: f32::INFINITY,
            stop_when_result_found: true,
            silent: false,
        }
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// A premise was matched and the options asked to stop.
    Found,
    /// The fringe emptied, or every remaining node exceeded the cost
    /// threshold.
    Exhausted,
    /// The tick budget ran out.
    Timeout,
    /// The pool or fringe hit its capacity ceiling.
    OutOfMemory,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Found => write!(f, "found"),
            Termination::Exhausted => write!(f, "exhausted"),
            Termination::Timeout => write!(f, "timeout"),
            Termination::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

/// The outcome of a search. Partial results survive every termination kind.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// Each matched premise as a root→leaf path of search nodes.
    pub paths: Vec<Vec<SearchNode>>,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Why the search stopped.
    pub termination: Termination,
}

impl SearchResponse {
    /// Whether any premise was matched.
    pub fn found(&self) -> bool {
        !self.paths.is_empty()
    }
}

/// Run a default-configured search over `tree`.
pub fn syn_search(
    graph: &dyn MutationGraph,
    facts: &dyn FactDb,
    weights: &dyn WeightModel,
    tree: &Tree,
    options: &SearchOptions,
) -> NatlogResult<SearchResponse> {
    let mut engine = Engine::new(graph, facts, weights, tree, EngineConfig::default())?;
    Ok(engine.run(options))
}
