//! The successor generator.
//!
//! Expansion of a popped node proposes three kinds of children: mutations of
//! the cursor word along the mutation graph's rewrite edges, deletion of the
//! subtree at the cursor, and cursor moves that continue the top-down sweep
//! (into the cursor's dependents, or across to later siblings). The sweep
//! only ever moves toward the leaves, which is what keeps the incremental
//! hash updates sound.

use crate::channel::Producer;
use crate::error::{SearchError, SearchResult};
use crate::graph::{Edge, EdgeType, MutationGraph, DELETION, NEAREST_NEIGHBOR};
use crate::tree::Tree;
use crate::weights::{Projection, WeightModel};
use crate::word::{Monotonicity, TaggedWord, MAX_QUERY_LENGTH, TREE_ROOT, TREE_ROOT_WORD};

use super::fringe::Fringe;
use super::node::SearchNode;
use super::pool::NodePool;
use super::seen::SeenSet;

/// Generates successors for popped nodes. Holds only the read-only
/// collaborators; the mutable search state is threaded through
/// [`Expander::expand`].
pub struct Expander<'a> {
    tree: &'a Tree,
    graph: &'a dyn MutationGraph,
    weights: &'a dyn WeightModel,
}

impl<'a> Expander<'a> {
    /// Create an expander over the query tree and its collaborators.
    pub fn new(
        tree: &'a Tree,
        graph: &'a dyn MutationGraph,
        weights: &'a dyn WeightModel,
    ) -> Self {
        Expander {
            tree,
            graph,
            weights,
        }
    }

    /// Expand the node at `parent_id`, pushing every admitted child into the
    /// fringe (and mirroring it to `mirror`, when present). Returns the
    /// number of children created, or the capacity error that stopped
    /// expansion.
    pub fn expand(
        &self,
        parent_id: u32,
        pool: &mut NodePool,
        fringe: &mut Fringe,
        seen: &mut dyn SeenSet,
        mut mirror: Option<&mut Producer>,
    ) -> SearchResult<u32> {
        let parent = *pool.get(parent_id);
        let index = parent.index();
        let current = parent.current_token();
        let monotonicity = self.tree.word(index).monotonicity();
        let alive = !parent.is_deleted(index);
        let mut children = 0;

        if alive {
            // Mutations of the cursor word.
            for edge in self.graph.outgoing_edges(current.word()) {
                if edge.edge_type == NEAREST_NEIGHBOR {
                    continue;
                }
                debug_assert_eq!(
                    edge.source,
                    current.word(),
                    "mutation graph returned an edge not rooted at the queried word"
                );
                if edge.source != current.word() {
                    continue;
                }
                let new_hash = self.tree.update_hash_from_mutation(
                    parent.fact_hash(),
                    index,
                    current.word(),
                    parent.governor_word(),
                    edge.sink,
                );
                if seen.was_seen(new_hash) {
                    tracing::trace!(hash = new_hash, "skipping seen mutation");
                    continue;
                }
                seen.record(new_hash);
                let delta = self.weights.cost(
                    parent.source_edge_type(),
                    edge,
                    parent.edited_here(),
                    monotonicity,
                );
                let (validity, cost_if_true, cost_if_false) =
                    self.project_costs(&parent, edge.edge_type, monotonicity, delta);
                let token = TaggedWord::new(edge.sink, edge.sink_sense, monotonicity);
                let child = SearchNode::mutation(
                    &parent,
                    new_hash,
                    token,
                    validity,
                    cost_if_true,
                    cost_if_false,
                    parent_id,
                    edge.edge_type,
                );
                children += self.emit(child, pool, fringe, &mut mirror)?;
            }

            // Deletion of the subtree at the cursor. Never at the root: the
            // empty query is not a state.
            if index != self.tree.root() {
                let deletion_edge = Edge {
                    source: current.word(),
                    source_sense: current.sense(),
                    sink: TREE_ROOT_WORD,
                    sink_sense: 0,
                    edge_type: DELETION,
                    cost: 1.0,
                };
                if self.graph.contains_deletion(&deletion_edge) {
                    let added = self.tree.create_delete_mask(index) & !parent.delete_mask();
                    if added != 0 {
                        let new_hash = self.tree.update_hash_from_deletions(
                            parent.fact_hash(),
                            index,
                            current.word(),
                            parent.governor_word(),
                            added,
                        );
                        if !seen.was_seen(new_hash) {
                            seen.record(new_hash);
                            let delta = self.weights.cost(
                                parent.source_edge_type(),
                                &deletion_edge,
                                parent.edited_here(),
                                monotonicity,
                            );
                            let (validity, cost_if_true, cost_if_false) =
                                self.project_costs(&parent, DELETION, monotonicity, delta);
                            let child = SearchNode::deletion(
                                &parent,
                                new_hash,
                                added,
                                validity,
                                cost_if_true,
                                cost_if_false,
                                parent_id,
                                DELETION,
                            );
                            children += self.emit(child, pool, fringe, &mut mirror)?;
                        }
                    }
                }
            }

            // Cursor moves into the dependents.
            for (child_index, _) in self.tree.dependents(index, MAX_QUERY_LENGTH) {
                if parent.is_deleted(child_index) {
                    continue;
                }
                let child = SearchNode::move_cursor(
                    &parent,
                    self.tree,
                    child_index,
                    current.word(),
                    parent_id,
                );
                children += self.emit(child, pool, fringe, &mut mirror)?;
            }
        }

        // Cursor moves across to later siblings; this is also how the sweep
        // continues past a deleted subtree.
        let governor_index = self.tree.governor(index);
        if governor_index != TREE_ROOT {
            for (sibling, _) in self.tree.dependents(governor_index, MAX_QUERY_LENGTH) {
                if sibling <= index || parent.is_deleted(sibling) {
                    continue;
                }
                let child = SearchNode::move_cursor(
                    &parent,
                    self.tree,
                    sibling,
                    parent.governor_word(),
                    parent_id,
                );
                children += self.emit(child, pool, fringe, &mut mirror)?;
            }
        }

        Ok(children)
    }

    /// Per-edge cost and validity bookkeeping. A preserved edit accrues on
    /// both hypotheses; a flip swaps them; a destroyed polarity poisons the
    /// true-path so it can never win the priority key again.
    fn project_costs(
        &self,
        parent: &SearchNode,
        edge_type: EdgeType,
        monotonicity: Monotonicity,
        delta: f32,
    ) -> (bool, f32, f32) {
        match self.weights.project(edge_type, monotonicity) {
            Projection::Preserve => (
                parent.validity(),
                parent.cost_if_true() + delta,
                parent.cost_if_false() + delta,
            ),
            Projection::Flip => (
                !parent.validity(),
                parent.cost_if_false() + delta,
                parent.cost_if_true() + delta,
            ),
            Projection::Destroy => (
                false,
                f32::INFINITY,
                parent.cost_if_false() + delta,
            ),
        }
    }

    fn emit(
        &self,
        child: SearchNode,
        pool: &mut NodePool,
        fringe: &mut Fringe,
        mirror: &mut Option<&mut Producer>,
    ) -> SearchResult<u32> {
        let key = child.priority_key();
        let id = pool.alloc(child).ok_or(SearchError::PoolExhausted {
            ceiling: pool.ceiling(),
        })?;
        if !fringe.push(id, key) {
            return Err(SearchError::FringeFull {
                capacity: fringe.len(),
            });
        }
        if let Some(producer) = mirror.as_deref_mut() {
            // The mirror is advisory; a full ring never stalls the search.
            let _ = producer.push(child);
        }
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{mock, mock_graph, GraphBuilder, InMemoryGraph, HYPERNYM};
    use crate::search::fringe::SearchStrategy;
    use crate::search::seen::{BloomSeenSet, NoSeenSet};
    use crate::weights::WeightVector;
    use crate::word::Word;

    fn tagged(word: Word) -> TaggedWord {
        TaggedWord::new(word, 0, Monotonicity::Default)
    }

    fn potto_tree() -> Tree {
        Tree::new(&[tagged(mock::POTTO)], &[TREE_ROOT], &[0]).unwrap()
    }

    fn setup(tree: &Tree) -> (NodePool, Fringe, u32) {
        let mut pool = NodePool::new(1024);
        let mut fringe = Fringe::new(SearchStrategy::BreadthFirst, 1024);
        let root = pool.alloc(SearchNode::root(tree)).unwrap();
        fringe.push(root, 0.0);
        (pool, fringe, root)
    }

    #[test]
    fn mutation_children_follow_rewrite_edges() {
        let tree = potto_tree();
        let graph = mock_graph();
        let weights = WeightVector::uniform();
        let expander = Expander::new(&tree, &graph, &weights);
        let (mut pool, mut fringe, root) = setup(&tree);
        fringe.pop();

        let created = expander
            .expand(root, &mut pool, &mut fringe, &mut NoSeenSet, None)
            .unwrap();
        assert_eq!(created, 1);
        let (child_id, key) = fringe.pop().unwrap();
        let child = pool.get(child_id);
        assert_eq!(child.current_token().word(), mock::LEMUR);
        assert_eq!(child.source_edge_type(), HYPERNYM);
        assert!(child.edited_here());
        assert!((key - 0.01).abs() < 1e-6);
    }

    #[test]
    fn nearest_neighbor_edges_are_skipped() {
        let word_a = Word::new(1);
        let word_b = Word::new(2);
        let graph: InMemoryGraph = GraphBuilder::default()
            .edge(word_a, word_b, NEAREST_NEIGHBOR, 0.01)
            .build();
        let tree = Tree::new(&[tagged(word_a)], &[TREE_ROOT], &[0]).unwrap();
        let weights = WeightVector::uniform();
        let expander = Expander::new(&tree, &graph, &weights);
        let (mut pool, mut fringe, root) = setup(&tree);
        fringe.pop();

        let created = expander
            .expand(root, &mut pool, &mut fringe, &mut NoSeenSet, None)
            .unwrap();
        assert_eq!(created, 0);
    }

    #[test]
    fn seen_states_are_suppressed() {
        let tree = potto_tree();
        let graph = mock_graph();
        let weights = WeightVector::uniform();
        let expander = Expander::new(&tree, &graph, &weights);
        let (mut pool, mut fringe, root) = setup(&tree);
        fringe.pop();

        let mut seen = BloomSeenSet::new(1 << 12, 3);
        assert_eq!(
            expander
                .expand(root, &mut pool, &mut fringe, &mut seen, None)
                .unwrap(),
            1
        );
        // Expanding the same node again proposes the same lemur state.
        assert_eq!(
            expander
                .expand(root, &mut pool, &mut fringe, &mut seen, None)
                .unwrap(),
            0
        );
    }

    #[test]
    fn deletion_requires_permission_and_non_root() {
        // have(root) -> tail; "tail" deletes freely, the root never does.
        let tree = Tree::new(
            &[tagged(mock::HAVE), tagged(mock::TAIL)],
            &[TREE_ROOT, 0],
            &[0, 1],
        )
        .unwrap();
        let graph = mock_graph();
        let weights = WeightVector::uniform();
        let expander = Expander::new(&tree, &graph, &weights);
        let (mut pool, mut fringe, root) = setup(&tree);
        fringe.pop();

        // Root expansion: no mutation edges for "have", no deletion at the
        // root; one cursor move to "tail".
        let created = expander
            .expand(root, &mut pool, &mut fringe, &mut NoSeenSet, None)
            .unwrap();
        assert_eq!(created, 1);
        let (moved_id, _) = fringe.pop().unwrap();
        assert_eq!(pool.get(moved_id).index(), 1);

        // At "tail": deletion is permitted and produces the masked child.
        let created = expander
            .expand(moved_id, &mut pool, &mut fringe, &mut NoSeenSet, None)
            .unwrap();
        assert_eq!(created, 1);
        let (deleted_id, _) = fringe.pop().unwrap();
        let deleted = pool.get(deleted_id);
        assert!(deleted.is_deleted(1));
        assert!(!deleted.is_deleted(0));
        assert_eq!(deleted.fact_hash(), {
            let remaining = Tree::new(&[tagged(mock::HAVE)], &[TREE_ROOT], &[0]).unwrap();
            remaining.hash()
        });
    }

    #[test]
    fn cursor_sweeps_into_children_and_later_siblings() {
        // 0(root) with children 1 and 2; 2 has child 3.
        let tree = Tree::new(
            &[tagged(mock::ANIMAL), tagged(mock::CAT), tagged(mock::HAVE), tagged(mock::TAIL)],
            &[TREE_ROOT, 0, 0, 2],
            &[0, 1, 2, 3],
        )
        .unwrap();
        let graph = mock_graph();
        let weights = WeightVector::uniform();
        let expander = Expander::new(&tree, &graph, &weights);
        let (mut pool, mut fringe, root) = setup(&tree);
        fringe.pop();

        expander
            .expand(root, &mut pool, &mut fringe, &mut NoSeenSet, None)
            .unwrap();
        let mut indices = Vec::new();
        while let Some((id, _)) = fringe.pop() {
            let node = pool.get(id);
            if !node.edited_here() {
                indices.push(node.index());
            }
        }
        // Root moves into both children but has no siblings.
        assert_eq!(indices, vec![1, 2]);

        // From node 1: no dependents, but sibling 2 lies ahead.
        let from_one = SearchNode::move_cursor(
            pool.get(root),
            &tree,
            1,
            mock::ANIMAL,
            root,
        );
        let one_id = pool.alloc(from_one).unwrap();
        expander
            .expand(one_id, &mut pool, &mut fringe, &mut NoSeenSet, None)
            .unwrap();
        let mut targets = Vec::new();
        while let Some((id, _)) = fringe.pop() {
            let node = pool.get(id);
            if !node.edited_here() {
                targets.push(node.index());
            }
        }
        assert_eq!(targets, vec![2]);
    }

    #[test]
    fn pool_exhaustion_surfaces_as_an_error() {
        let tree = potto_tree();
        let graph = mock_graph();
        let weights = WeightVector::uniform();
        let expander = Expander::new(&tree, &graph, &weights);
        let mut pool = NodePool::new(1);
        let mut fringe = Fringe::new(SearchStrategy::BreadthFirst, 8);
        let root = pool.alloc(SearchNode::root(&tree)).unwrap();
        fringe.push(root, 0.0);
        fringe.pop();

        let result = expander.expand(root, &mut pool, &mut fringe, &mut NoSeenSet, None);
        assert!(matches!(result, Err(SearchError::PoolExhausted { .. })));
    }

    #[test]
    fn mirrored_children_reach_the_consumer() {
        let tree = potto_tree();
        let graph = mock_graph();
        let weights = WeightVector::uniform();
        let expander = Expander::new(&tree, &graph, &weights);
        let (mut pool, mut fringe, root) = setup(&tree);
        fringe.pop();

        let (mut tx, mut rx) = crate::channel::channel();
        expander
            .expand(root, &mut pool, &mut fringe, &mut NoSeenSet, Some(&mut tx))
            .unwrap();
        let mirrored = rx.poll().unwrap();
        assert_eq!(mirrored.current_token().word(), mock::LEMUR);
        assert!(rx.poll().is_none());
    }
}
