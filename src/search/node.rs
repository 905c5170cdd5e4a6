//! The packed search-node record.
//!
//! A [`SearchNode`] is a fixed 32-byte snapshot of one state in the search:
//! the hash of the implicit current tree, the cursor position, the deletion
//! bitmask, the live token and governor words at the cursor, a backpointer
//! into the node pool, and the two running costs. Nodes are immutable once
//! allocated; paths are reconstructed by chasing backpointers through the
//! pool.

use crate::graph::{EdgeType, NO_EDGE};
use crate::tree::Tree;
use crate::word::{TaggedWord, Word, TREE_ROOT_WORD};

// meta: index (bits 0..5) | validity (5) | delete mask (6..32).
const INDEX_MASK: u32 = 0x1F;
const VALIDITY_BIT: u32 = 1 << 5;
const MASK_SHIFT: u32 = 6;
// token: bit 31 marks a node produced by an edit at its own cursor index.
const EDITED_HERE_BIT: u32 = 1 << 31;
// governor: word (bits 0..24) | producing edge type (24..32).
const GOVERNOR_WORD_MASK: u32 = 0x00FF_FFFF;

/// One state in the search space. 32 bytes, immutable after allocation.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct SearchNode {
    fact_hash: u64,
    meta: u32,
    token: u32,
    governor: u32,
    backpointer: u32,
    cost_if_true: f32,
    cost_if_false: f32,
}

const _: () = assert!(std::mem::size_of::<SearchNode>() == 32);

impl SearchNode {
    /// The initial node of a search over `tree`: cursor at the root, nothing
    /// deleted, both costs zero, valid.
    pub fn root(tree: &Tree) -> Self {
        let index = tree.root();
        SearchNode {
            fact_hash: tree.hash(),
            meta: (index as u32 & INDEX_MASK) | VALIDITY_BIT,
            token: tree.word(index).bits(),
            governor: TREE_ROOT_WORD.get() | ((NO_EDGE as u32) << 24),
            backpointer: 0,
            cost_if_true: 0.0,
            cost_if_false: 0.0,
        }
    }

    /// A mutation child: same cursor, new token and hash, costs and validity
    /// from the projection.
    #[allow(clippy::too_many_arguments)]
    pub fn mutation(
        parent: &SearchNode,
        new_hash: u64,
        new_token: TaggedWord,
        validity: bool,
        cost_if_true: f32,
        cost_if_false: f32,
        backpointer: u32,
        edge_type: EdgeType,
    ) -> Self {
        SearchNode {
            fact_hash: new_hash,
            meta: set_validity(parent.meta, validity),
            token: new_token.bits() | EDITED_HERE_BIT,
            governor: (parent.governor & GOVERNOR_WORD_MASK) | ((edge_type as u32) << 24),
            backpointer,
            cost_if_true,
            cost_if_false,
        }
    }

    /// A deletion child: same cursor and token, widened deletion mask, new
    /// hash.
    #[allow(clippy::too_many_arguments)]
    pub fn deletion(
        parent: &SearchNode,
        new_hash: u64,
        added_mask: u32,
        validity: bool,
        cost_if_true: f32,
        cost_if_false: f32,
        backpointer: u32,
        edge_type: EdgeType,
    ) -> Self {
        let meta = set_validity(parent.meta, validity) | (added_mask << MASK_SHIFT);
        SearchNode {
            fact_hash: new_hash,
            meta,
            token: parent.token | EDITED_HERE_BIT,
            governor: (parent.governor & GOVERNOR_WORD_MASK) | ((edge_type as u32) << 24),
            backpointer,
            cost_if_true,
            cost_if_false,
        }
    }

    /// A cursor move: same hash, mask, and costs; the token comes from the
    /// tree at the new index and `governor` is the live word of the new
    /// index's governor.
    pub fn move_cursor(
        parent: &SearchNode,
        tree: &Tree,
        new_index: u8,
        governor: Word,
        backpointer: u32,
    ) -> Self {
        SearchNode {
            fact_hash: parent.fact_hash,
            meta: (parent.meta & !INDEX_MASK) | (new_index as u32 & INDEX_MASK),
            token: tree.word(new_index).bits(),
            governor: governor.get() | (parent.governor & !GOVERNOR_WORD_MASK),
            backpointer,
            cost_if_true: parent.cost_if_true,
            cost_if_false: parent.cost_if_false,
        }
    }

    /// Hash of the implicit current tree.
    pub fn fact_hash(&self) -> u64 {
        self.fact_hash
    }

    /// The cursor index.
    pub fn index(&self) -> u8 {
        (self.meta & INDEX_MASK) as u8
    }

    /// The logical polarity of the inference so far.
    pub fn validity(&self) -> bool {
        self.meta & VALIDITY_BIT != 0
    }

    /// Bitmap of deleted token indices.
    pub fn delete_mask(&self) -> u32 {
        self.meta >> MASK_SHIFT
    }

    /// Whether token `index` is deleted in this state.
    pub fn is_deleted(&self, index: u8) -> bool {
        self.delete_mask() & (1 << index) != 0
    }

    /// The word currently occupying the cursor index.
    pub fn current_token(&self) -> TaggedWord {
        TaggedWord::from_bits(self.token)
    }

    /// The live word of the cursor's governor.
    pub fn governor_word(&self) -> Word {
        Word::new(self.governor & GOVERNOR_WORD_MASK)
    }

    /// The type of the edge that produced this node ([`NO_EDGE`] for the
    /// root).
    pub fn source_edge_type(&self) -> EdgeType {
        (self.governor >> 24) as EdgeType
    }

    /// Whether this node was produced by an edit at its own cursor index
    /// (the previous edit touched the same word).
    pub fn edited_here(&self) -> bool {
        self.token & EDITED_HERE_BIT != 0
    }

    /// Pool id of the parent node; 0 is the root sentinel.
    pub fn backpointer(&self) -> u32 {
        self.backpointer
    }

    /// Cost of this path under the hypothesis that the inference holds.
    pub fn cost_if_true(&self) -> f32 {
        self.cost_if_true
    }

    /// Cost of this path under the hypothesis that the inference is negated.
    pub fn cost_if_false(&self) -> f32 {
        self.cost_if_false
    }

    /// The fringe ordering key: the cheaper of the two hypotheses.
    pub fn priority_key(&self) -> f32 {
        if self.cost_if_false < self.cost_if_true {
            self.cost_if_false
        } else {
            self.cost_if_true
        }
    }
}

fn set_validity(meta: u32, validity: bool) -> u32 {
    if validity {
        meta | VALIDITY_BIT
    } else {
        meta & !VALIDITY_BIT
    }
}

/// Two nodes are the same logical search state when they agree on the tree
/// hash, the cursor, and the deletion mask; costs and backpointers are
/// path metadata.
impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.fact_hash == other.fact_hash
            && self.index() == other.index()
            && self.delete_mask() == other.delete_mask()
    }
}

impl Eq for SearchNode {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DELETION, HYPERNYM};
    use crate::word::{Monotonicity, MAX_QUERY_LENGTH, TREE_ROOT};

    fn tagged(word: u32) -> TaggedWord {
        TaggedWord::new(Word::new(word), 0, Monotonicity::Default)
    }

    fn single_word_tree(word: u32) -> Tree {
        Tree::new(&[tagged(word)], &[TREE_ROOT], &[0]).unwrap()
    }

    #[test]
    fn record_is_32_bytes() {
        assert_eq!(std::mem::size_of::<SearchNode>(), 32);
    }

    #[test]
    fn root_node_snapshot() {
        let tree = single_word_tree(42);
        let root = SearchNode::root(&tree);
        assert_eq!(root.fact_hash(), tree.hash());
        assert_eq!(root.index(), 0);
        assert!(root.validity());
        assert_eq!(root.delete_mask(), 0);
        assert_eq!(root.current_token().word().get(), 42);
        assert_eq!(root.governor_word(), TREE_ROOT_WORD);
        assert_eq!(root.source_edge_type(), NO_EDGE);
        assert!(!root.edited_here());
        assert_eq!(root.backpointer(), 0);
        assert_eq!(root.priority_key(), 0.0);
    }

    #[test]
    fn mutation_child_tracks_edit() {
        let tree = single_word_tree(42);
        let root = SearchNode::root(&tree);
        let child = SearchNode::mutation(
            &root,
            0x1234,
            tagged(43),
            true,
            0.5,
            0.9,
            7,
            HYPERNYM,
        );
        assert_eq!(child.fact_hash(), 0x1234);
        assert_eq!(child.index(), 0);
        assert_eq!(child.current_token().word().get(), 43);
        assert_eq!(child.source_edge_type(), HYPERNYM);
        assert!(child.edited_here());
        assert_eq!(child.backpointer(), 7);
        assert_eq!(child.priority_key(), 0.5);
    }

    #[test]
    fn deletion_child_merges_mask() {
        let tree = Tree::new(
            &[tagged(1), tagged(2), tagged(3)],
            &[TREE_ROOT, 0, 1],
            &[0, 1, 2],
        )
        .unwrap();
        let root = SearchNode::root(&tree);
        let child = SearchNode::deletion(&root, 0x99, 0b110, true, 1.0, 1.0, 3, DELETION);
        assert_eq!(child.delete_mask(), 0b110);
        assert!(child.is_deleted(1));
        assert!(child.is_deleted(2));
        assert!(!child.is_deleted(0));
        assert!(child.edited_here());
        assert_eq!(child.source_edge_type(), DELETION);
    }

    #[test]
    fn move_cursor_keeps_hash_and_costs() {
        let tree = Tree::new(
            &[tagged(1), tagged(2)],
            &[TREE_ROOT, 0],
            &[0, 1],
        )
        .unwrap();
        let root = SearchNode::root(&tree);
        let moved = SearchNode::move_cursor(&root, &tree, 1, Word::new(1), 5);
        assert_eq!(moved.fact_hash(), root.fact_hash());
        assert_eq!(moved.index(), 1);
        assert_eq!(moved.current_token().word().get(), 2);
        assert_eq!(moved.governor_word().get(), 1);
        assert!(!moved.edited_here());
        assert_eq!(moved.source_edge_type(), NO_EDGE);
        assert_eq!(moved.priority_key(), 0.0);
    }

    #[test]
    fn equality_ignores_costs_and_backpointers() {
        let tree = single_word_tree(42);
        let root = SearchNode::root(&tree);
        let a = SearchNode::mutation(&root, 5, tagged(1), true, 1.0, 2.0, 1, HYPERNYM);
        let b = SearchNode::mutation(&root, 5, tagged(1), false, 9.0, 9.0, 2, HYPERNYM);
        assert_eq!(a, b);
        let c = SearchNode::mutation(&root, 6, tagged(1), true, 1.0, 2.0, 1, HYPERNYM);
        assert_ne!(a, c);
    }

    #[test]
    fn max_length_state_fits_the_fields() {
        let last = (MAX_QUERY_LENGTH - 1) as u8;
        let words: Vec<TaggedWord> = (0..MAX_QUERY_LENGTH as u32).map(tagged).collect();
        let mut governors = vec![0u8; MAX_QUERY_LENGTH];
        governors[0] = TREE_ROOT;
        let relations = vec![0u8; MAX_QUERY_LENGTH];
        let tree = Tree::new(&words, &governors, &relations).unwrap();

        let root = SearchNode::root(&tree);
        let moved = SearchNode::move_cursor(&root, &tree, last, Word::new(0), 1);
        assert_eq!(moved.index(), last);

        let full_mask = (1u32 << MAX_QUERY_LENGTH) - 1;
        let deleted =
            SearchNode::deletion(&moved, 0, full_mask, true, 0.0, 0.0, 2, DELETION);
        assert_eq!(deleted.delete_mask(), full_mask);
        assert_eq!(deleted.index(), last);
        assert!(deleted.validity());
    }
}
