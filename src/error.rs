//! Rich diagnostic error types for the natlog engine.
//!
//! Each fallible boundary defines its own error type with miette
//! `#[diagnostic]` derives, providing error codes and help text: tree
//! construction ([`TreeError`]) and search configuration and capacity
//! ([`SearchError`]). The other subsystems are infallible by contract —
//! the graph, fact database, fringe, and channel report membership and
//! capacity through `bool`/`Option` returns. Recoverable search conditions
//! (seen-set hits, skipped edges, projection invalidations) are handled
//! locally and never appear here; unrecoverable conditions surface as a
//! termination code on the search response, not as in-flight errors.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the natlog engine.
#[derive(Debug, Error, Diagnostic)]
pub enum NatlogError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Search(#[from] SearchError),
}

// ---------------------------------------------------------------------------
// Tree errors
// ---------------------------------------------------------------------------

/// Errors raised while constructing a dependency tree.
///
/// All of these are fatal for the query: a malformed tree never reaches the
/// search engine.
#[derive(Debug, Error, Diagnostic)]
pub enum TreeError {
    #[error("query too long: {length} tokens exceeds the maximum of {max}")]
    #[diagnostic(
        code(natlog::tree::too_long),
        help(
            "The packed search node carries a fixed-width deletion bitmask, \
             so queries are capped at {max} tokens. Shorten the query or \
             split it into clauses."
        )
    )]
    TooLong { length: usize, max: usize },

    #[error("expected exactly one root, found {count}")]
    #[diagnostic(
        code(natlog::tree::root_count),
        help(
            "Exactly one node must have the root sentinel (63) as its \
             governor. Check the governor column of the input."
        )
    )]
    RootCount { count: usize },

    #[error("governor {governor} of token {index} is out of range for length {length}")]
    #[diagnostic(
        code(natlog::tree::governor_out_of_range),
        help("Governors are zero-indexed and must be < length, or 63 for the root.")
    )]
    GovernorOutOfRange {
        index: usize,
        governor: u8,
        length: usize,
    },

    #[error("cycle detected in the governor relation at token {index}")]
    #[diagnostic(
        code(natlog::tree::cycle),
        help(
            "Following governors from every token must reach the root. \
             A token that is its own (transitive) governor makes the tree \
             unusable for top-down search."
        )
    )]
    Cycle { index: usize },

    #[error("malformed CoNLL line {line}: {message}")]
    #[diagnostic(
        code(natlog::tree::conll),
        help(
            "Each line must be `word<TAB>governor<TAB>relation`, with the \
             governor 1-indexed and 0 denoting the root."
        )
    )]
    Conll { line: usize, message: String },
}

// ---------------------------------------------------------------------------
// Search errors
// ---------------------------------------------------------------------------

/// Errors raised while configuring or running a search.
///
/// Capacity exhaustion is reported to the caller as the `OutOfMemory`
/// termination on the response; these variants carry the detail.
#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    #[error("invalid search configuration: {message}")]
    #[diagnostic(
        code(natlog::search::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("node pool exhausted at {ceiling} nodes")]
    #[diagnostic(
        code(natlog::search::pool_exhausted),
        help(
            "The search allocated every node the pool ceiling allows. \
             Raise `max_pool_nodes` in EngineConfig, lower `max_ticks`, or \
             tighten `cost_threshold`."
        )
    )]
    PoolExhausted { ceiling: u32 },

    #[error("fringe full at {capacity} entries")]
    #[diagnostic(
        code(natlog::search::fringe_full),
        help(
            "The work queue reached its configured capacity. Raise \
             `fringe_capacity` in EngineConfig or enable the bloom seen-set \
             to suppress duplicate states."
        )
    )]
    FringeFull { capacity: usize },
}

/// Convenience alias for functions returning natlog results.
pub type NatlogResult<T> = std::result::Result<T, NatlogError>;

/// Result type for tree construction.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// Result type for search configuration and capacity operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;
