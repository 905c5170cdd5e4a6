//! Edge scoring and natural-logic validity projection.
//!
//! The search core consumes weights through the [`WeightModel`] trait.
//! [`WeightVector`] is the standard implementation: per-monotonicity unigram
//! and bigram tables over edge types, mirroring the shape of the weights the
//! client trains offline. Projection — how an edit moves the validity bit
//! given the monotonicity at the edited position — is a fixed table.

use crate::graph::{
    Edge, EdgeType, ADJ_ANTONYM, ADJ_PERTAINYM, ADV_ANTONYM, ADV_PERTAINYM, DELETION, HYPERNYM,
    HYPONYM, INSERTION, NOUN_ANTONYM, NOUN_SYNONYM, NO_EDGE, NUM_EDGE_TYPES, VERB_ANTONYM,
};
use crate::word::Monotonicity;

/// How an edit projects the validity bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The edit preserves the inference polarity.
    Preserve,
    /// The edit negates the inference polarity.
    Flip,
    /// The edit breaks the inference; validity cannot be recovered.
    Destroy,
}

/// Scoring interface consumed by the expander.
pub trait WeightModel {
    /// The incremental cost of taking `edge`, given the type of the previous
    /// edit, whether the previous edit touched the same token, and the
    /// monotonicity at the edited position.
    fn cost(
        &self,
        last_edge_type: EdgeType,
        edge: &Edge,
        changing_same_word: bool,
        monotonicity: Monotonicity,
    ) -> f32;

    /// The projection class of an edit. Total over every
    /// (edge type, monotonicity) pair.
    fn project(&self, edge_type: EdgeType, monotonicity: Monotonicity) -> Projection;

    /// The validity bit after an edit.
    fn project_validity(
        &self,
        prior: bool,
        edge_type: EdgeType,
        monotonicity: Monotonicity,
    ) -> bool {
        match self.project(edge_type, monotonicity) {
            Projection::Preserve => prior,
            Projection::Flip => !prior,
            Projection::Destroy => false,
        }
    }
}

/// The natural-logic projection table.
///
/// Generalising is sound in upward-monotone positions, specialising in
/// downward ones; antonymy negates under either polarity; synonymy and
/// pertainymy always preserve. Non-monotone (`Flat`) positions admit only
/// meaning-preserving edits. Unmarked positions are treated as upward.
pub fn natural_logic_projection(
    edge_type: EdgeType,
    monotonicity: Monotonicity,
) -> Projection {
    use Monotonicity::{Default, Down, Flat, Up};
    match edge_type {
        NOUN_SYNONYM | ADJ_PERTAINYM | ADV_PERTAINYM => Projection::Preserve,
        NOUN_ANTONYM | VERB_ANTONYM | ADJ_ANTONYM | ADV_ANTONYM => match monotonicity {
            Flat => Projection::Destroy,
            Up | Down | Default => Projection::Flip,
        },
        HYPERNYM | DELETION => match monotonicity {
            Up | Default => Projection::Preserve,
            Down | Flat => Projection::Destroy,
        },
        HYPONYM | INSERTION => match monotonicity {
            Down => Projection::Preserve,
            Up | Default | Flat => Projection::Destroy,
        },
        _ => Projection::Destroy,
    }
}

/// Per-monotonicity unigram and bigram weight tables over edge types.
#[derive(Debug, Clone)]
pub struct WeightVector {
    unigram_up: [f32; NUM_EDGE_TYPES],
    unigram_down: [f32; NUM_EDGE_TYPES],
    unigram_flat: [f32; NUM_EDGE_TYPES],
    unigram_any: [f32; NUM_EDGE_TYPES],
    bigram_up: Box<[f32]>,
    bigram_down: Box<[f32]>,
    bigram_flat: Box<[f32]>,
    bigram_any: Box<[f32]>,
    /// Multiplier applied when the previous edit touched the same token.
    /// Model-defined; 1.0 means no penalty.
    same_word_multiplier: f32,
}

impl WeightVector {
    /// A uniform model: every edge costs its graph cost, no bigram context,
    /// no same-word penalty. The standard model for tests.
    pub fn uniform() -> Self {
        WeightVector {
            unigram_up: [1.0; NUM_EDGE_TYPES],
            unigram_down: [1.0; NUM_EDGE_TYPES],
            unigram_flat: [1.0; NUM_EDGE_TYPES],
            unigram_any: [1.0; NUM_EDGE_TYPES],
            bigram_up: vec![0.0; NUM_EDGE_TYPES * NUM_EDGE_TYPES].into_boxed_slice(),
            bigram_down: vec![0.0; NUM_EDGE_TYPES * NUM_EDGE_TYPES].into_boxed_slice(),
            bigram_flat: vec![0.0; NUM_EDGE_TYPES * NUM_EDGE_TYPES].into_boxed_slice(),
            bigram_any: vec![0.0; NUM_EDGE_TYPES * NUM_EDGE_TYPES].into_boxed_slice(),
            same_word_multiplier: 1.0,
        }
    }

    /// Override the unigram weight for one edge type under one monotonicity.
    pub fn with_unigram(
        mut self,
        monotonicity: Monotonicity,
        edge_type: EdgeType,
        weight: f32,
    ) -> Self {
        self.unigrams_mut(monotonicity)[edge_type as usize] = weight;
        self
    }

    /// Override the bigram weight for an edge-type pair under one
    /// monotonicity.
    pub fn with_bigram(
        mut self,
        monotonicity: Monotonicity,
        last: EdgeType,
        next: EdgeType,
        weight: f32,
    ) -> Self {
        self.bigrams_mut(monotonicity)[last as usize * NUM_EDGE_TYPES + next as usize] = weight;
        self
    }

    /// Set the same-word repeat multiplier.
    pub fn with_same_word_multiplier(mut self, multiplier: f32) -> Self {
        self.same_word_multiplier = multiplier;
        self
    }

    fn unigrams(&self, monotonicity: Monotonicity) -> &[f32; NUM_EDGE_TYPES] {
        match monotonicity {
            Monotonicity::Up => &self.unigram_up,
            Monotonicity::Down => &self.unigram_down,
            Monotonicity::Flat => &self.unigram_flat,
            Monotonicity::Default => &self.unigram_any,
        }
    }

    fn unigrams_mut(&mut self, monotonicity: Monotonicity) -> &mut [f32; NUM_EDGE_TYPES] {
        match monotonicity {
            Monotonicity::Up => &mut self.unigram_up,
            Monotonicity::Down => &mut self.unigram_down,
            Monotonicity::Flat => &mut self.unigram_flat,
            Monotonicity::Default => &mut self.unigram_any,
        }
    }

    fn bigrams(&self, monotonicity: Monotonicity) -> &[f32] {
        match monotonicity {
            Monotonicity::Up => &self.bigram_up,
            Monotonicity::Down => &self.bigram_down,
            Monotonicity::Flat => &self.bigram_flat,
            Monotonicity::Default => &self.bigram_any,
        }
    }

    fn bigrams_mut(&mut self, monotonicity: Monotonicity) -> &mut [f32] {
        match monotonicity {
            Monotonicity::Up => &mut self.bigram_up,
            Monotonicity::Down => &mut self.bigram_down,
            Monotonicity::Flat => &mut self.bigram_flat,
            Monotonicity::Default => &mut self.bigram_any,
        }
    }
}

impl WeightModel for WeightVector {
    fn cost(
        &self,
        last_edge_type: EdgeType,
        edge: &Edge,
        changing_same_word: bool,
        monotonicity: Monotonicity,
    ) -> f32 {
        let edge_index = (edge.edge_type as usize).min(NUM_EDGE_TYPES - 1);
        let mut cost = edge.cost * self.unigrams(monotonicity)[edge_index];
        if last_edge_type != NO_EDGE {
            let last_index = (last_edge_type as usize).min(NUM_EDGE_TYPES - 1);
            cost += self.bigrams(monotonicity)[last_index * NUM_EDGE_TYPES + edge_index];
        }
        if changing_same_word {
            cost *= self.same_word_multiplier;
        }
        cost
    }

    fn project(&self, edge_type: EdgeType, monotonicity: Monotonicity) -> Projection {
        natural_logic_projection(edge_type, monotonicity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NEAREST_NEIGHBOR;
    use crate::word::Word;

    fn edge(edge_type: EdgeType, cost: f32) -> Edge {
        Edge {
            source: Word::new(1),
            source_sense: 0,
            sink: Word::new(2),
            sink_sense: 0,
            edge_type,
            cost,
        }
    }

    #[test]
    fn uniform_cost_is_the_edge_cost() {
        let weights = WeightVector::uniform();
        let e = edge(HYPERNYM, 0.25);
        assert_eq!(weights.cost(NO_EDGE, &e, false, Monotonicity::Up), 0.25);
    }

    #[test]
    fn bigram_context_only_applies_after_a_previous_edge() {
        let weights =
            WeightVector::uniform().with_bigram(Monotonicity::Up, HYPERNYM, HYPERNYM, 0.5);
        let e = edge(HYPERNYM, 1.0);
        assert_eq!(weights.cost(NO_EDGE, &e, false, Monotonicity::Up), 1.0);
        assert_eq!(weights.cost(HYPERNYM, &e, false, Monotonicity::Up), 1.5);
    }

    #[test]
    fn same_word_multiplier_scales_cost() {
        let weights = WeightVector::uniform().with_same_word_multiplier(2.0);
        let e = edge(HYPERNYM, 1.0);
        assert_eq!(weights.cost(NO_EDGE, &e, true, Monotonicity::Up), 2.0);
        assert_eq!(weights.cost(NO_EDGE, &e, false, Monotonicity::Up), 1.0);
    }

    #[test]
    fn monotonicity_selects_the_table() {
        let weights = WeightVector::uniform().with_unigram(Monotonicity::Down, HYPONYM, 3.0);
        let e = edge(HYPONYM, 1.0);
        assert_eq!(weights.cost(NO_EDGE, &e, false, Monotonicity::Down), 3.0);
        assert_eq!(weights.cost(NO_EDGE, &e, false, Monotonicity::Up), 1.0);
    }

    #[test]
    fn projection_is_total() {
        for edge_type in 0..=u8::MAX {
            for monotonicity in [
                Monotonicity::Up,
                Monotonicity::Down,
                Monotonicity::Flat,
                Monotonicity::Default,
            ] {
                // Must not panic for any pair.
                let _ = natural_logic_projection(edge_type, monotonicity);
            }
        }
    }

    #[test]
    fn hypernym_preserves_up_and_destroys_down() {
        assert_eq!(
            natural_logic_projection(HYPERNYM, Monotonicity::Up),
            Projection::Preserve
        );
        assert_eq!(
            natural_logic_projection(HYPERNYM, Monotonicity::Down),
            Projection::Destroy
        );
    }

    #[test]
    fn antonym_flips_and_double_antonym_restores() {
        let weights = WeightVector::uniform();
        let valid = weights.project_validity(true, NOUN_ANTONYM, Monotonicity::Up);
        assert!(!valid);
        let restored = weights.project_validity(valid, NOUN_ANTONYM, Monotonicity::Up);
        assert!(restored);
    }

    #[test]
    fn nearest_neighbor_never_projects_validity() {
        assert_eq!(
            natural_logic_projection(NEAREST_NEIGHBOR, Monotonicity::Up),
            Projection::Destroy
        );
    }
}
