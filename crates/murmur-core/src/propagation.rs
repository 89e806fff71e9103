//! Spreading-activation propagation.
//!
//! Two algorithms advance a state by one discrete time step: the
//! node-centric full pass and the link-centric fast pass. Both follow the
//! same procedure — age every entry, accumulate influence through links,
//! normalize it logarithmically against a "normal" in-degree, subtract decay
//! and a logistic aging penalty, clamp into [0, 100] — and differ only in
//! how they find the influenced nodes:
//!
//! - `propagate_activations` visits each candidate node and scans its
//!   incoming adjacency index, counting the node's full in-degree in the
//!   normalizer.
//! - `fast_propagate_activations` walks the outgoing links of the state's
//!   nodes once, accumulating influence per target; the normalizer counts
//!   only the links that actually contributed this step, and targets with
//!   no contribution just age and decay.
//!
//! Only nodes reachable from the state (its own entries plus targets of
//! their outgoing links) are visited, so a state never silently fills up
//! with entries for the whole graph.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::constants::{
    ACTIVATION_MAX, DEFAULT_MEMORY_PERF_FAST, DEFAULT_MEMORY_PERF_FULL,
    DEFAULT_NORMAL_INCOMING_LINKS,
};
use crate::error::{CoreError, CoreResult};
use crate::network::ConceptNetwork;
use crate::node::{NodeId, NodeKey};

/// Tuning knobs of one propagation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagationParams {
    /// Baseline in-degree of the logarithmic influence normalizer. Must be
    /// strictly greater than 1 so the log's argument stays above 1 for any
    /// nonnegative incoming count.
    pub normal_incoming_links: f64,
    /// Memory performance: the higher, the slower the aging penalty rises.
    pub memory_perf: f64,
}

impl PropagationParams {
    /// Defaults of the node-centric full pass.
    pub fn full() -> Self {
        Self {
            normal_incoming_links: DEFAULT_NORMAL_INCOMING_LINKS,
            memory_perf: DEFAULT_MEMORY_PERF_FULL,
        }
    }

    /// Defaults of the link-centric fast pass.
    pub fn fast() -> Self {
        Self {
            normal_incoming_links: DEFAULT_NORMAL_INCOMING_LINKS,
            memory_perf: DEFAULT_MEMORY_PERF_FAST,
        }
    }

    pub fn with_normal_incoming_links(mut self, normal: f64) -> Self {
        self.normal_incoming_links = normal;
        self
    }

    pub fn with_memory_perf(mut self, memory_perf: f64) -> Self {
        self.memory_perf = memory_perf;
        self
    }

    fn validate(&self) -> CoreResult<()> {
        if self.normal_incoming_links <= 1.0 {
            return Err(CoreError::BadNormalIncomingLinks(
                self.normal_incoming_links,
            ));
        }
        Ok(())
    }
}

/// Logistic aging penalty: 0 at age 0, rising toward 100 as age grows.
fn aging_penalty(age: u64, memory_perf: f64) -> f64 {
    200.0 / (1.0 + (-(age as f64) / memory_perf).exp()) - 100.0
}

/// Dampen influence arriving over `incoming` links against the `normal`
/// baseline in-degree.
fn normalize_influence(influence: f64, incoming: usize, normal: f64) -> f64 {
    influence / ((normal + incoming as f64).ln() / normal.ln())
}

fn next_activation(old: f64, decay_rate: f64, influence: f64, penalty: f64) -> f64 {
    let new = old - decay_rate * old / ACTIVATION_MAX + influence - penalty;
    new.clamp(0.0, ACTIVATION_MAX)
}

impl ConceptNetwork {
    /// One full propagation step over the named state.
    ///
    /// Node-centric: every candidate node's incoming links are scanned and
    /// its whole in-degree feeds the normalizer, whether or not the sources
    /// are active.
    pub fn propagate_activations(
        &mut self,
        state_id: &str,
        params: PropagationParams,
    ) -> CoreResult<()> {
        params.validate()?;
        let mut state = self.take_state(state_id)?;
        state.age_all();

        // Nodes in the state plus everything one outgoing hop away.
        let mut candidates: HashSet<NodeId> = HashSet::new();
        for (key, _) in state.entries() {
            let Some(id) = self.node_id_of_key(key) else {
                continue;
            };
            candidates.insert(id);
            for &link_id in self.nodes[id].outgoing_links() {
                candidates.insert(self.links[link_id].to_id());
            }
        }

        let mut updates: Vec<(NodeKey, f64)> = Vec::with_capacity(candidates.len());
        for id in candidates {
            let node = &self.nodes[id];
            let key = node.key();

            let mut influence = 0.0;
            for &link_id in node.incoming_links() {
                let link = &self.links[link_id];
                let source_key = self.nodes[link.from_id()].key();
                let source_old = state.old_activation(&source_key);
                influence += source_old * self.link_weight(link, Some(&state));
            }
            let incoming = node.incoming_links().len();
            if incoming > 0 {
                influence = normalize_influence(influence, incoming, params.normal_incoming_links);
            }

            let penalty = aging_penalty(state.age(&key), params.memory_perf);
            let new = next_activation(
                state.old_activation(&key),
                node.decay_rate(),
                influence,
                penalty,
            );
            updates.push((key, new));
        }

        debug!(state = state_id, updated = updates.len(), "propagated activations");
        for (key, value) in updates {
            state.node_state(&key).set_clamped(value);
        }
        self.put_state(state);
        Ok(())
    }

    /// One fast propagation step over the named state.
    ///
    /// Link-centric: outgoing links of the state's nodes are walked once to
    /// accumulate per-target influence, then every state entry and every
    /// influenced target is updated. Entries whose node has no influence
    /// this step age and decay without the normalization.
    pub fn fast_propagate_activations(
        &mut self,
        state_id: &str,
        params: PropagationParams,
    ) -> CoreResult<()> {
        params.validate()?;
        let mut state = self.take_state(state_id)?;
        state.age_all();

        let mut influences: HashMap<NodeKey, (f64, usize)> = HashMap::new();
        for (key, entry) in state.entries() {
            let Some(id) = self.node_id_of_key(key) else {
                // The graph no longer knows this node; it still decays below.
                continue;
            };
            let source_old = entry.old_activation_value();
            for &link_id in self.nodes[id].outgoing_links() {
                let link = &self.links[link_id];
                let weight = self.link_weight(link, Some(&state));
                let target_key = self.nodes[link.to_id()].key();
                let slot = influences.entry(target_key).or_insert((0.0, 0));
                slot.0 += source_old * weight;
                slot.1 += 1;
            }
        }

        let mut touched: HashSet<NodeKey> =
            state.entries().map(|(key, _)| key.clone()).collect();
        touched.extend(influences.keys().cloned());

        let mut updates: Vec<(NodeKey, f64)> = Vec::with_capacity(touched.len());
        for key in touched {
            let influence = match influences.get(&key) {
                Some(&(sum, incoming)) => {
                    normalize_influence(sum, incoming, params.normal_incoming_links)
                }
                None => 0.0,
            };
            let penalty = aging_penalty(state.age(&key), params.memory_perf);
            let new = next_activation(
                state.old_activation(&key),
                key.kind.decay_rate(),
                influence,
                penalty,
            );
            updates.push((key, new));
        }

        debug!(state = state_id, updated = updates.len(), "fast-propagated activations");
        for (key, value) in updates {
            state.node_state(&key).set_clamped(value);
        }
        self.put_state(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeKind};
    use crate::state::State;

    fn key(symbol: &str) -> NodeKey {
        NodeKey::new(symbol, NodeKind::Basic)
    }

    fn linked_pair() -> ConceptNetwork {
        let mut cn = ConceptNetwork::new();
        let from = cn.add_node(Node::basic("From")).unwrap();
        let to = cn.add_node(Node::basic("To1")).unwrap();
        cn.add_link(from, to, None).unwrap();
        cn.add_state(State::new("s")).unwrap();
        cn.state_mut("s")
            .unwrap()
            .set_activation(&key("From"), 100.0)
            .unwrap();
        cn
    }

    #[test]
    fn test_full_propagation_carries_activation_over_a_link() {
        let mut cn = linked_pair();
        cn.propagate_activations("s", PropagationParams::full())
            .unwrap();
        assert!(cn.state("s").unwrap().activation(&key("To1")) > 50.0);
    }

    #[test]
    fn test_fast_propagation_carries_activation_over_a_link() {
        let mut cn = linked_pair();
        cn.fast_propagate_activations("s", PropagationParams::fast())
            .unwrap();
        assert!(cn.state("s").unwrap().activation(&key("To1")) > 50.0);
    }

    #[test]
    fn test_two_fast_steps_keep_target_between_50_and_100() {
        let mut cn = linked_pair();
        cn.fast_propagate_activations("s", PropagationParams::fast())
            .unwrap();
        cn.fast_propagate_activations("s", PropagationParams::fast())
            .unwrap();
        let av = cn.state("s").unwrap().activation(&key("To1"));
        assert!(av > 50.0, "got {av}");
        assert!(av < 100.0, "got {av}");
    }

    #[test]
    fn test_normal_incoming_links_must_exceed_one() {
        let mut cn = linked_pair();
        let params = PropagationParams::full().with_normal_incoming_links(1.0);
        assert!(matches!(
            cn.propagate_activations("s", params),
            Err(CoreError::BadNormalIncomingLinks(_))
        ));
    }

    #[test]
    fn test_unknown_state_fails() {
        let mut cn = ConceptNetwork::new();
        assert!(matches!(
            cn.fast_propagate_activations("ghost", PropagationParams::fast()),
            Err(CoreError::UnknownState(_))
        ));
    }

    #[test]
    fn test_activations_stay_in_range_indefinitely() {
        // A dense little graph, repeatedly re-excited.
        let mut cn = ConceptNetwork::new();
        let ids: Vec<_> = (0..5)
            .map(|i| cn.add_node(Node::basic(format!("n{i}"))).unwrap())
            .collect();
        for &a in &ids {
            for &b in &ids {
                if a != b {
                    cn.add_link(a, b, None).unwrap();
                }
            }
        }
        cn.add_state(State::new("s")).unwrap();
        cn.state_mut("s").unwrap().fully_activate(&key("n0"));

        for step in 0..100 {
            if step % 10 == 0 {
                cn.state_mut("s").unwrap().fully_activate(&key("n1"));
            }
            if step % 2 == 0 {
                cn.fast_propagate_activations("s", PropagationParams::fast())
                    .unwrap();
            } else {
                cn.propagate_activations("s", PropagationParams::full())
                    .unwrap();
            }
            for (_, entry) in cn.state("s").unwrap().entries() {
                let av = entry.activation_value();
                assert!((0.0..=100.0).contains(&av), "activation {av} out of range");
            }
        }
    }

    #[test]
    fn test_stale_state_entry_decays_without_error() {
        // An entry for a node the graph never learned.
        let mut cn = ConceptNetwork::new();
        cn.add_state(State::new("s")).unwrap();
        cn.state_mut("s")
            .unwrap()
            .set_activation(&key("phantom"), 80.0)
            .unwrap();
        cn.fast_propagate_activations("s", PropagationParams::fast())
            .unwrap();
        let av = cn.state("s").unwrap().activation(&key("phantom"));
        assert!(av < 80.0);
    }

    #[test]
    fn test_influence_kept_node_evicts_after_long_life() {
        // B is fed by A long enough to age past the eviction threshold
        // without ever reaching zero; an explicit zeroing must then evict
        // it outright.
        let mut cn = ConceptNetwork::new();
        let a = cn.add_node(Node::basic("A")).unwrap();
        let b = cn.add_node(Node::basic("B")).unwrap();
        cn.add_link(a, b, None).unwrap();
        cn.add_state(State::new("s")).unwrap();

        for _ in 0..52 {
            cn.state_mut("s").unwrap().fully_activate(&key("A"));
            cn.fast_propagate_activations("s", PropagationParams::fast())
                .unwrap();
            assert!(cn.state("s").unwrap().activation(&key("B")) > 0.0);
        }
        assert!(cn.state("s").unwrap().age(&key("B")) > 50);

        cn.state_mut("s")
            .unwrap()
            .set_activation(&key("B"), 0.0)
            .unwrap();
        assert!(!cn.state("s").unwrap().contains(&key("B")));
    }
}
