//! Bump-allocator arena for search nodes.
//!
//! Nodes are allocated append-only into fixed-size buckets and addressed by
//! a 32-bit id that splits into `(bucket, offset)`. Buckets never move or
//! reallocate once created, so node addresses are stable for the engine's
//! lifetime; nothing is freed until the pool is dropped wholesale.

use super::node::SearchNode;

/// log2 of the bucket size.
pub const POOL_BUCKET_SHIFT: u32 = 20;

const BUCKET_SIZE: u32 = 1 << POOL_BUCKET_SHIFT;
const OFFSET_MASK: u32 = BUCKET_SIZE - 1;

/// A two-level bucketed arena of [`SearchNode`]s.
#[derive(Debug)]
pub struct NodePool {
    buckets: Vec<Vec<SearchNode>>,
    len: u32,
    ceiling: u32,
}

impl NodePool {
    /// Create a pool that will allocate at most `ceiling` nodes.
    pub fn new(ceiling: u32) -> Self {
        NodePool {
            buckets: Vec::new(),
            len: 0,
            ceiling,
        }
    }

    /// Place a node and return its stable id, or `None` when the ceiling is
    /// reached. Id 0 is the root of the search (the first allocation).
    pub fn alloc(&mut self, node: SearchNode) -> Option<u32> {
        let id = self.len;
        if id >= self.ceiling {
            return None;
        }
        let bucket = (id >> POOL_BUCKET_SHIFT) as usize;
        if bucket == self.buckets.len() {
            // Reserve the full bucket up front so entries never move.
            let remaining = self.ceiling - id;
            self.buckets
                .push(Vec::with_capacity(remaining.min(BUCKET_SIZE) as usize));
        }
        self.buckets[bucket].push(node);
        self.len += 1;
        Some(id)
    }

    /// Read a previously allocated node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never returned by [`NodePool::alloc`].
    pub fn get(&self, id: u32) -> &SearchNode {
        &self.buckets[(id >> POOL_BUCKET_SHIFT) as usize][(id & OFFSET_MASK) as usize]
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The configured allocation ceiling.
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Follow backpointers from `id` to the root and return the path in
    /// root→leaf order.
    pub fn reconstruct_path(&self, id: u32) -> Vec<SearchNode> {
        let mut path = Vec::new();
        let mut at = id;
        loop {
            let node = *self.get(at);
            let parent = node.backpointer();
            path.push(node);
            if at == 0 {
                break;
            }
            at = parent;
        }
        path.reverse();
        path
    }
}
