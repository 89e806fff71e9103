//! The graph store.
//!
//! [`ConceptNetwork`] owns the canonical node and link tables plus the named
//! activation states. Nodes and links live in contiguous arenas and refer to
//! each other by index only, so the node→link→node back-references never
//! form an ownership cycle. Uniqueness is enforced through two hash indexes:
//! `(symbol, kind) → NodeId` and `(from, to, label) → LinkId`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeKey, NodeKind};
use crate::state::State;

/// A graph of typed nodes and weighted links, overlaid with zero or more
/// per-identity activation states.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConceptNetwork {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    node_index: HashMap<NodeKey, NodeId>,
    link_index: HashMap<(NodeId, NodeId, Option<NodeId>), LinkId>,
    /// Transient: never serialized, a restored network starts with none.
    #[serde(skip)]
    states: HashMap<String, State>,
}

impl ConceptNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Add a node, merging counters into the stored node when the same
    /// `(symbol, kind)` identity already exists. Returns the canonical id.
    pub fn add_node(&mut self, node: Node) -> CoreResult<NodeId> {
        let key = node.key();
        match self.node_index.get(&key) {
            Some(&id) => {
                self.nodes[id].merge_from(&node)?;
                debug!(node = %key, occurrence = self.nodes[id].occurrence(), "merged node");
                Ok(id)
            }
            None => {
                let id = self.nodes.len();
                self.nodes.push(node);
                self.node_index.insert(key, id);
                Ok(id)
            }
        }
    }

    /// The node behind an id handed out by this network.
    pub fn node(&self, id: NodeId) -> CoreResult<&Node> {
        self.nodes.get(id).ok_or(CoreError::UnknownNodeId(id))
    }

    /// Exact `(symbol, kind)` lookup.
    pub fn get_node(&self, symbol: &str, kind: NodeKind) -> CoreResult<&Node> {
        let id = self.node_id(symbol, kind)?;
        Ok(&self.nodes[id])
    }

    pub fn node_id(&self, symbol: &str, kind: NodeKind) -> CoreResult<NodeId> {
        self.node_index
            .get(&NodeKey::new(symbol, kind))
            .copied()
            .ok_or_else(|| CoreError::UnknownNode {
                symbol: symbol.to_string(),
                kind,
            })
    }

    pub fn contains_node(&self, symbol: &str, kind: NodeKind) -> bool {
        self.node_index.contains_key(&NodeKey::new(symbol, kind))
    }

    pub(crate) fn node_id_of_key(&self, key: &NodeKey) -> Option<NodeId> {
        self.node_index.get(key).copied()
    }

    /// Add a directed link, or bump the co-occurrence of the existing one.
    ///
    /// A new link is registered in the from-node's outgoing index, the
    /// to-node's incoming index, and the label node's labeling index.
    pub fn add_link(
        &mut self,
        from: NodeId,
        to: NodeId,
        label: Option<NodeId>,
    ) -> CoreResult<LinkId> {
        self.check_node_id(from)?;
        self.check_node_id(to)?;
        if let Some(label) = label {
            self.check_node_id(label)?;
        }

        let triple = (from, to, label);
        match self.link_index.get(&triple) {
            Some(&id) => {
                self.links[id].increment_co_occurrence();
                debug!(
                    from = self.nodes[from].symbol(),
                    to = self.nodes[to].symbol(),
                    co_occurrence = self.links[id].co_occurrence(),
                    "reinforced link"
                );
                Ok(id)
            }
            None => {
                let id = self.links.len();
                self.links.push(Link::new(from, to, label));
                self.link_index.insert(triple, id);
                self.nodes[from].outgoing.push(id);
                self.nodes[to].incoming.push(id);
                if let Some(label) = label {
                    self.nodes[label].labeling.push(id);
                }
                Ok(id)
            }
        }
    }

    /// `add_link` in both directions, sharing the label.
    pub fn add_bidirectional_link(
        &mut self,
        a: NodeId,
        b: NodeId,
        label: Option<NodeId>,
    ) -> CoreResult<()> {
        self.add_link(a, b, label)?;
        self.add_link(b, a, label)?;
        Ok(())
    }

    /// Exact link lookup by its `(from, to, label)` triple.
    pub fn get_link(
        &self,
        from: NodeId,
        to: NodeId,
        label: Option<NodeId>,
    ) -> CoreResult<&Link> {
        self.check_node_id(from)?;
        self.check_node_id(to)?;
        self.link_index
            .get(&(from, to, label))
            .map(|&id| &self.links[id])
            .ok_or_else(|| CoreError::UnknownLink {
                from: self.nodes[from].symbol().to_string(),
                to: self.nodes[to].symbol().to_string(),
            })
    }

    pub fn link(&self, id: LinkId) -> CoreResult<&Link> {
        self.links.get(id).ok_or(CoreError::UnknownLinkId(id))
    }

    /// Links leaving the node, from its cached adjacency index.
    pub fn links_from(&self, id: NodeId) -> CoreResult<Vec<&Link>> {
        Ok(self.collect_links(self.node(id)?.outgoing_links()))
    }

    /// Links arriving at the node.
    pub fn links_to(&self, id: NodeId) -> CoreResult<Vec<&Link>> {
        Ok(self.collect_links(self.node(id)?.incoming_links()))
    }

    /// Links labeled by the node.
    pub fn links_labeled(&self, id: NodeId) -> CoreResult<Vec<&Link>> {
        Ok(self.collect_links(self.node(id)?.labeling_links()))
    }

    /// Links labeled by the node, followed by links arriving at it.
    pub fn links_labeled_or_to(&self, id: NodeId) -> CoreResult<Vec<&Link>> {
        let node = self.node(id)?;
        let mut links = self.collect_links(node.labeling_links());
        links.extend(self.collect_links(node.incoming_links()));
        Ok(links)
    }

    fn collect_links(&self, ids: &[LinkId]) -> Vec<&Link> {
        ids.iter().map(|&id| &self.links[id]).collect()
    }

    fn check_node_id(&self, id: NodeId) -> CoreResult<()> {
        if id < self.nodes.len() {
            Ok(())
        } else {
            Err(CoreError::UnknownNodeId(id))
        }
    }

    /// Weight of a link in the given state (see [`Link::weight`]); the
    /// label's activation only contributes when a state is supplied.
    pub fn link_weight(&self, link: &Link, state: Option<&State>) -> f64 {
        let from_occurrence = self.nodes[link.from_id()].occurrence();
        let label_activation = match (link.label_id(), state) {
            (Some(label), Some(state)) => Some(state.activation(&self.nodes[label].key())),
            _ => None,
        };
        link.weight(from_occurrence, label_activation)
    }

    /// One display line for a link, in the `@showlinks` rendering.
    pub fn link_summary(&self, link: &Link, state: Option<&State>) -> String {
        let from = self.nodes[link.from_id()].symbol();
        let to = self.nodes[link.to_id()].symbol();
        let weight_pct = (self.link_weight(link, state) * 100.0) as i64;
        match link.label_id() {
            Some(label) => format!(
                "{:>10} -({:>10} {})-> {:>10}",
                from,
                self.nodes[label].symbol(),
                weight_pct,
                to
            ),
            None => format!(
                "{:>10} ------({}, {})-------> {:>10}",
                from,
                weight_pct,
                link.co_occurrence(),
                to
            ),
        }
    }

    // ----- state lifecycle -------------------------------------------------

    /// Register a state; its id must not already be taken.
    pub fn add_state(&mut self, state: State) -> CoreResult<()> {
        if self.states.contains_key(state.id()) {
            return Err(CoreError::DuplicateState(state.id().to_string()));
        }
        self.states.insert(state.id().to_string(), state);
        Ok(())
    }

    pub fn state(&self, id: &str) -> CoreResult<&State> {
        self.states
            .get(id)
            .ok_or_else(|| CoreError::UnknownState(id.to_string()))
    }

    pub fn state_mut(&mut self, id: &str) -> CoreResult<&mut State> {
        self.states
            .get_mut(id)
            .ok_or_else(|| CoreError::UnknownState(id.to_string()))
    }

    pub fn has_state(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn state_ids(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn remove_all_states(&mut self) {
        self.states.clear();
    }

    /// Drop every state except the one named; that one must exist.
    pub fn remove_states_except(&mut self, id: &str) -> CoreResult<()> {
        if !self.states.contains_key(id) {
            return Err(CoreError::UnknownState(id.to_string()));
        }
        self.states.retain(|state_id, _| state_id == id);
        Ok(())
    }

    /// Detach a state for a propagation pass. Infallible to re-insert.
    pub(crate) fn take_state(&mut self, id: &str) -> CoreResult<State> {
        self.states
            .remove(id)
            .ok_or_else(|| CoreError::UnknownState(id.to_string()))
    }

    pub(crate) fn put_state(&mut self, state: State) {
        self.states.insert(state.id().to_string(), state);
    }

    /// Nodes of the given kinds whose activation in `state` is strictly
    /// above `threshold`, with their activations. Candidates for reply-seed
    /// selection.
    pub fn activated_nodes(
        &self,
        state: &State,
        kinds: &[NodeKind],
        threshold: f64,
    ) -> Vec<(NodeId, f64)> {
        state
            .entries()
            .filter(|(key, _)| kinds.contains(&key.kind))
            .filter(|(_, entry)| entry.activation_value() > threshold)
            .filter_map(|(key, entry)| {
                self.node_id_of_key(key)
                    .map(|id| (id, entry.activation_value()))
            })
            .collect()
    }

    // ----- snapshot --------------------------------------------------------

    /// Serialize the node and link tables to bytes.
    ///
    /// States are not part of the snapshot; the live object keeps its states
    /// untouched.
    pub fn dump(&self) -> CoreResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Rebuild a network from [`ConceptNetwork::dump`] bytes. The restored
    /// network has zero states.
    pub fn restore(bytes: &[u8]) -> CoreResult<Self> {
        let network: ConceptNetwork = bincode::deserialize(bytes)?;
        info!(
            nodes = network.node_count(),
            links = network.link_count(),
            "restored concept network"
        );
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TokenPosition;

    #[test]
    fn test_add_node_twice_merges_occurrence() {
        let mut cn = ConceptNetwork::new();
        let first = cn.add_node(Node::basic("hello")).unwrap();
        let second = cn.add_node(Node::basic("hello")).unwrap();
        assert_eq!(first, second);
        assert_eq!(cn.node_count(), 1);
        assert_eq!(cn.node(first).unwrap().occurrence(), 2);
    }

    #[test]
    fn test_same_symbol_different_kind_is_a_different_node() {
        let mut cn = ConceptNetwork::new();
        let basic = cn.add_node(Node::basic("do")).unwrap();
        let token = cn
            .add_node(Node::token("do", TokenPosition::Beginning))
            .unwrap();
        assert_ne!(basic, token);
        assert_eq!(cn.node_count(), 2);
    }

    #[test]
    fn test_get_unknown_node_fails() {
        let cn = ConceptNetwork::new();
        assert!(matches!(
            cn.get_node("ghost", NodeKind::Basic),
            Err(CoreError::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_add_link_twice_increments_co_occurrence() {
        let mut cn = ConceptNetwork::new();
        let from = cn.add_node(Node::basic("from")).unwrap();
        let to = cn.add_node(Node::basic("to")).unwrap();
        cn.add_link(from, to, None).unwrap();
        let link = cn.add_link(from, to, None).unwrap();
        assert_eq!(cn.link(link).unwrap().co_occurrence(), 2);
        assert_eq!(cn.link_count(), 1);
    }

    #[test]
    fn test_link_to_missing_node_fails() {
        let mut cn = ConceptNetwork::new();
        let from = cn.add_node(Node::basic("from")).unwrap();
        assert!(matches!(
            cn.add_link(from, 99, None),
            Err(CoreError::UnknownNodeId(99))
        ));
    }

    #[test]
    fn test_adjacency_indexes() {
        let mut cn = ConceptNetwork::new();
        let from = cn.add_node(Node::basic("from")).unwrap();
        let to1 = cn.add_node(Node::basic("to1")).unwrap();
        let to2 = cn.add_node(Node::basic("to2")).unwrap();
        let label = cn.add_node(Node::basic("label")).unwrap();

        cn.add_link(from, to1, None).unwrap();
        cn.add_link(from, to2, None).unwrap();
        cn.add_link(from, to2, Some(label)).unwrap();

        assert_eq!(cn.links_from(from).unwrap().len(), 3);
        assert_eq!(cn.links_to(to2).unwrap().len(), 2);
        assert_eq!(cn.links_labeled(label).unwrap().len(), 1);
        assert_eq!(cn.links_labeled_or_to(label).unwrap().len(), 1);
        assert_eq!(cn.links_labeled_or_to(to2).unwrap().len(), 2);
    }

    #[test]
    fn test_bidirectional_link() {
        let mut cn = ConceptNetwork::new();
        let a = cn.add_node(Node::basic("a")).unwrap();
        let b = cn.add_node(Node::basic("b")).unwrap();
        cn.add_bidirectional_link(a, b, None).unwrap();
        assert!(cn.get_link(a, b, None).is_ok());
        assert!(cn.get_link(b, a, None).is_ok());
    }

    #[test]
    fn test_get_link_unknown_triple_fails() {
        let mut cn = ConceptNetwork::new();
        let a = cn.add_node(Node::basic("a")).unwrap();
        let b = cn.add_node(Node::basic("b")).unwrap();
        assert!(matches!(
            cn.get_link(a, b, None),
            Err(CoreError::UnknownLink { .. })
        ));
    }

    #[test]
    fn test_labeled_and_unlabeled_links_are_distinct() {
        let mut cn = ConceptNetwork::new();
        let a = cn.add_node(Node::basic("a")).unwrap();
        let b = cn.add_node(Node::basic("b")).unwrap();
        let label = cn.add_node(Node::basic("l")).unwrap();
        cn.add_link(a, b, None).unwrap();
        cn.add_link(a, b, Some(label)).unwrap();
        assert_eq!(cn.link_count(), 2);
        assert_eq!(cn.get_link(a, b, None).unwrap().co_occurrence(), 1);
        assert_eq!(cn.get_link(a, b, Some(label)).unwrap().co_occurrence(), 1);
    }

    #[test]
    fn test_duplicate_state_is_rejected() {
        let mut cn = ConceptNetwork::new();
        cn.add_state(State::new("alice")).unwrap();
        assert!(matches!(
            cn.add_state(State::new("alice")),
            Err(CoreError::DuplicateState(_))
        ));
    }

    #[test]
    fn test_remove_states_except() {
        let mut cn = ConceptNetwork::new();
        cn.add_state(State::new("alice")).unwrap();
        cn.add_state(State::new("bob")).unwrap();
        cn.remove_states_except("bob").unwrap();
        assert!(cn.state("bob").is_ok());
        assert!(matches!(
            cn.state("alice"),
            Err(CoreError::UnknownState(_))
        ));
    }

    #[test]
    fn test_link_weight_with_label_state() {
        let mut cn = ConceptNetwork::new();
        let from = cn.add_node(Node::basic("from")).unwrap();
        let from_again = Node::basic("from");
        cn.add_node(from_again).unwrap(); // occurrence 2
        let to = cn.add_node(Node::basic("to")).unwrap();
        let label = cn.add_node(Node::basic("label")).unwrap();
        let link = cn.add_link(from, to, Some(label)).unwrap();

        let mut state = State::new("s");
        state
            .set_activation(&NodeKey::new("label", NodeKind::Basic), 100.0)
            .unwrap();

        let link = cn.link(link).unwrap();
        // co_occ/occ = 1/2 without the label's help
        assert_eq!(cn.link_weight(link, None), 0.5);
        // a fully activated label saturates the weight
        assert_eq!(cn.link_weight(link, Some(&state)), 1.0);
    }
}
