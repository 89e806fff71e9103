//! Sequence generation by walking token links.
//!
//! Starting from a seed token, the walk repeatedly scores the token
//! neighbors of the sequence's current end — co-occurrence times target
//! activation, divided by a quadratic repetition penalty — and lets the
//! temperature selector pick the next hop. The forward pass extends the
//! tail through outgoing links; the backward pass mirrors it through
//! incoming links and grows the head. Walks are explicit loops over a
//! sequence buffer; the repetition cap guarantees termination even on
//! dense or self-looping graphs.

use rand::Rng;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::constants::REPETITION_PENALTY_CAP;
use crate::error::{CoreError, CoreResult};
use crate::network::ConceptNetwork;
use crate::node::{NodeId, NodeKind};
use crate::state::State;
use crate::temperature::Temperature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl ConceptNetwork {
    /// Pick a generation seed among the tokens activated above `threshold`
    /// in `state`, using the selector. Fails with the no-candidates
    /// condition when nothing is hot enough.
    pub fn choose_activated_token(
        &self,
        state: &State,
        threshold: f64,
        temperature: &Temperature,
        rng: &mut impl Rng,
    ) -> CoreResult<NodeId> {
        let candidates = self.activated_nodes(state, &[NodeKind::Token], threshold);
        let chosen = temperature.choose(&candidates, rng)?;
        Ok(*chosen)
    }

    /// Extend forward from `seed` until no eligible outgoing token links
    /// remain. The returned sequence starts at the seed.
    pub fn generate_forwards(
        &self,
        state: &State,
        seed: NodeId,
        temperature: &Temperature,
        rng: &mut impl Rng,
    ) -> CoreResult<Vec<NodeId>> {
        let (mut sequence, mut occurrences) = self.seed_walk(seed)?;
        self.extend_walk(
            state,
            &mut sequence,
            &mut occurrences,
            Direction::Forward,
            temperature,
            rng,
        )?;
        Ok(sequence.into_iter().collect())
    }

    /// Extend backward from `seed` through incoming token links. The
    /// returned sequence ends at the seed.
    pub fn generate_backwards(
        &self,
        state: &State,
        seed: NodeId,
        temperature: &Temperature,
        rng: &mut impl Rng,
    ) -> CoreResult<Vec<NodeId>> {
        let (mut sequence, mut occurrences) = self.seed_walk(seed)?;
        self.extend_walk(
            state,
            &mut sequence,
            &mut occurrences,
            Direction::Backward,
            temperature,
            rng,
        )?;
        Ok(sequence.into_iter().collect())
    }

    /// Assemble one full sequence from a single seed: the backward pass
    /// grows the head, then the forward pass grows the tail, sharing the
    /// repetition bookkeeping.
    pub fn generate_sequence(
        &self,
        state: &State,
        seed: NodeId,
        temperature: &Temperature,
        rng: &mut impl Rng,
    ) -> CoreResult<Vec<NodeId>> {
        let (mut sequence, mut occurrences) = self.seed_walk(seed)?;
        self.extend_walk(
            state,
            &mut sequence,
            &mut occurrences,
            Direction::Backward,
            temperature,
            rng,
        )?;
        self.extend_walk(
            state,
            &mut sequence,
            &mut occurrences,
            Direction::Forward,
            temperature,
            rng,
        )?;
        debug!(length = sequence.len(), "generated sequence");
        Ok(sequence.into_iter().collect())
    }

    fn seed_walk(&self, seed: NodeId) -> CoreResult<(VecDeque<NodeId>, HashMap<NodeId, u64>)> {
        let node = self.node(seed)?;
        if node.kind() != NodeKind::Token {
            return Err(CoreError::KindMismatch {
                expected: NodeKind::Token,
                actual: node.kind(),
            });
        }
        let mut occurrences = HashMap::new();
        occurrences.insert(seed, 1);
        Ok((VecDeque::from([seed]), occurrences))
    }

    fn extend_walk(
        &self,
        state: &State,
        sequence: &mut VecDeque<NodeId>,
        occurrences: &mut HashMap<NodeId, u64>,
        direction: Direction,
        temperature: &Temperature,
        rng: &mut impl Rng,
    ) -> CoreResult<()> {
        loop {
            let anchor = match direction {
                Direction::Forward => sequence.back().copied(),
                Direction::Backward => sequence.front().copied(),
            };
            let Some(anchor) = anchor else {
                return Ok(());
            };
            let anchor_node = &self.nodes[anchor];
            let link_ids = match direction {
                Direction::Forward => anchor_node.outgoing_links(),
                Direction::Backward => anchor_node.incoming_links(),
            };

            let mut candidates: Vec<(NodeId, f64)> = Vec::new();
            for &link_id in link_ids {
                let link = &self.links[link_id];
                let next = match direction {
                    Direction::Forward => link.to_id(),
                    Direction::Backward => link.from_id(),
                };
                let next_node = &self.nodes[next];
                if next_node.kind() != NodeKind::Token {
                    continue;
                }

                let times = occurrences.get(&next).copied().unwrap_or(0);
                let penalty =
                    1.0 + (times as f64).powi(2) * next_node.symbol().chars().count() as f64;
                if penalty > REPETITION_PENALTY_CAP {
                    continue;
                }

                let mut activation = state.activation(&next_node.key());
                if activation == 0.0 {
                    // A dormant token must not annihilate a valid edge.
                    activation = 1.0;
                }
                let weight = link.co_occurrence() as f64 * activation / penalty;
                candidates.push((next, weight));
            }

            if candidates.is_empty() {
                return Ok(());
            }
            let chosen = *temperature.choose(&candidates, rng)?;
            *occurrences.entry(chosen).or_insert(0) += 1;
            match direction {
                Direction::Forward => sequence.push_back(chosen),
                Direction::Backward => sequence.push_front(chosen),
            }
        }
    }
}
