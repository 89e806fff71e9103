//! Per-identity activation overlays.
//!
//! A [`State`] tracks, for one conversational partner, which nodes are
//! currently "hot": each `(symbol, kind)` maps to a [`NodeState`] holding
//! the activation value, the previous step's value, and an age counter.
//! States are independent of the graph's own weights and are never part of
//! a graph snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::{ACTIVATION_MAX, EVICTION_AGE};
use crate::error::{CoreError, CoreResult};
use crate::node::{NodeKey, NodeKind};

/// Activation bookkeeping for one node inside one state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    activation_value: f64,
    old_activation_value: f64,
    age: u64,
}

impl NodeState {
    pub fn activation_value(&self) -> f64 {
        self.activation_value
    }

    /// The activation captured by the latest aging pass.
    pub fn old_activation_value(&self) -> f64 {
        self.old_activation_value
    }

    /// Propagation steps since the node was last fully activated.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Set the activation, rejecting values outside [0, 100].
    pub fn set_activation_value(&mut self, value: f64) -> CoreResult<()> {
        if !(0.0..=ACTIVATION_MAX).contains(&value) {
            return Err(CoreError::BadActivationValue(value));
        }
        self.set_clamped(value);
        Ok(())
    }

    /// Caller guarantees `value` is already in [0, 100].
    pub(crate) fn set_clamped(&mut self, value: f64) {
        self.old_activation_value = self.activation_value;
        self.activation_value = value;
        // A node dropped to zero becomes fresh again.
        if value == 0.0 {
            self.age = 0;
        }
    }

    /// One aging tick: snapshot the activation and grow older.
    pub(crate) fn age_step(&mut self) {
        self.age += 1;
        self.old_activation_value = self.activation_value;
    }

    pub(crate) fn reset_age(&mut self) {
        self.age = 0;
    }
}

/// A named activation overlay, usually one per username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    id: String,
    entries: HashMap<NodeKey, NodeState>,
}

impl State {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&NodeKey, &NodeState)> {
        self.entries.iter()
    }

    /// Whether the node currently has an entry in this state.
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// The node's state entry, created with defaults on first access.
    pub fn node_state(&mut self, key: &NodeKey) -> &mut NodeState {
        self.entries.entry(key.clone()).or_default()
    }

    /// Set a node's activation.
    ///
    /// Setting zero is special-cased: if the entry has aged past the
    /// eviction threshold it is removed from the state entirely; otherwise
    /// the entry stays, zeroed and fresh (age 0).
    pub fn set_activation(&mut self, key: &NodeKey, value: f64) -> CoreResult<()> {
        if !(0.0..=ACTIVATION_MAX).contains(&value) {
            return Err(CoreError::BadActivationValue(value));
        }
        if value == 0.0 {
            let aged_out = self
                .entries
                .get(key)
                .is_some_and(|entry| entry.age() > EVICTION_AGE);
            if aged_out {
                self.entries.remove(key);
                return Ok(());
            }
        }
        self.node_state(key).set_clamped(value);
        Ok(())
    }

    /// Set activation to the maximum and reset the age counter.
    pub fn fully_activate(&mut self, key: &NodeKey) {
        let entry = self.node_state(key);
        entry.set_clamped(ACTIVATION_MAX);
        entry.reset_age();
    }

    /// The node's activation, zero when the node has no entry.
    pub fn activation(&self, key: &NodeKey) -> f64 {
        self.entries
            .get(key)
            .map(NodeState::activation_value)
            .unwrap_or(0.0)
    }

    /// The node's age, zero when the node has no entry.
    pub fn age(&self, key: &NodeKey) -> u64 {
        self.entries.get(key).map(NodeState::age).unwrap_or(0)
    }

    /// The node's previous-step activation, zero when the node has no entry.
    pub fn old_activation(&self, key: &NodeKey) -> f64 {
        self.entries
            .get(key)
            .map(NodeState::old_activation_value)
            .unwrap_or(0.0)
    }

    /// Mean activation over all entries, zero for an empty state.
    pub fn average_activation(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: f64 = self.entries.values().map(NodeState::activation_value).sum();
        total / self.entries.len() as f64
    }

    /// Highest activation among entries of the given kinds, zero when none
    /// match.
    pub fn maximum_activation(&self, kinds: &[NodeKind]) -> f64 {
        self.entries
            .iter()
            .filter(|(key, _)| kinds.contains(&key.kind))
            .map(|(_, entry)| entry.activation_value())
            .fold(0.0, f64::max)
    }

    /// Drop every entry whose activation has decayed below 1.
    ///
    /// Activations are floats, so "below 1" stands in for "reached zero".
    /// This is bulk housekeeping, distinct from the age-gated eviction in
    /// [`State::set_activation`].
    pub fn clean(&mut self) {
        self.entries
            .retain(|_, entry| entry.activation_value() >= 1.0);
    }

    pub(crate) fn age_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.age_step();
        }
    }
}

impl fmt::Display for State {
    /// The `@showstate` table: `old av / av / age / node` per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "oldav\tav\tage\tnode")?;
        for (key, entry) in &self.entries {
            writeln!(
                f,
                "{:.0}\t{:.0}\t{}\t{}",
                entry.old_activation_value(),
                entry.activation_value(),
                entry.age(),
                key
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(symbol: &str) -> NodeKey {
        NodeKey::new(symbol, NodeKind::Basic)
    }

    #[test]
    fn test_set_and_get_activation() {
        let mut state = State::new("alice");
        state.set_activation(&key("hello"), 100.0).unwrap();
        assert_eq!(state.activation(&key("hello")), 100.0);
    }

    #[test]
    fn test_absent_entry_reads_as_zero() {
        let state = State::new("alice");
        assert_eq!(state.activation(&key("never-seen")), 0.0);
        assert_eq!(state.old_activation(&key("never-seen")), 0.0);
    }

    #[test]
    fn test_out_of_range_activation_is_rejected() {
        let mut state = State::new("alice");
        assert!(matches!(
            state.set_activation(&key("x"), 101.0),
            Err(CoreError::BadActivationValue(_))
        ));
        assert!(matches!(
            state.set_activation(&key("x"), -1.0),
            Err(CoreError::BadActivationValue(_))
        ));
    }

    #[test]
    fn test_setting_zero_resets_age() {
        let mut state = State::new("alice");
        state.fully_activate(&key("x"));
        for _ in 0..10 {
            state.age_all();
        }
        assert_eq!(state.node_state(&key("x")).age(), 10);
        state.set_activation(&key("x"), 0.0).unwrap();
        assert!(state.contains(&key("x")));
        assert_eq!(state.node_state(&key("x")).age(), 0);
    }

    #[test]
    fn test_eviction_after_aging_past_threshold() {
        let mut state = State::new("alice");
        state.fully_activate(&key("x"));
        for _ in 0..51 {
            state.age_all();
        }
        state.set_activation(&key("x"), 0.0).unwrap();
        // Gone entirely, and reads as if it were never set.
        assert!(!state.contains(&key("x")));
        assert_eq!(state.activation(&key("x")), 0.0);
    }

    #[test]
    fn test_no_eviction_at_threshold() {
        let mut state = State::new("alice");
        state.fully_activate(&key("x"));
        for _ in 0..50 {
            state.age_all();
        }
        state.set_activation(&key("x"), 0.0).unwrap();
        assert!(state.contains(&key("x")));
    }

    #[test]
    fn test_fully_activate_resets_age() {
        let mut state = State::new("alice");
        state.fully_activate(&key("x"));
        for _ in 0..5 {
            state.age_all();
        }
        state.fully_activate(&key("x"));
        assert_eq!(state.node_state(&key("x")).age(), 0);
        assert_eq!(state.activation(&key("x")), 100.0);
    }

    #[test]
    fn test_clean_drops_faded_entries() {
        let mut state = State::new("alice");
        state.set_activation(&key("hot"), 80.0).unwrap();
        state.set_activation(&key("faint"), 0.5).unwrap();
        state.clean();
        assert!(state.contains(&key("hot")));
        assert!(!state.contains(&key("faint")));
    }

    #[test]
    fn test_average_and_maximum() {
        let mut state = State::new("alice");
        assert_eq!(state.average_activation(), 0.0);
        state.set_activation(&key("a"), 40.0).unwrap();
        state.set_activation(&key("b"), 60.0).unwrap();
        state
            .set_activation(&NodeKey::new("tok", NodeKind::Token), 90.0)
            .unwrap();
        assert!((state.average_activation() - 190.0 / 3.0).abs() < 1e-9);
        assert_eq!(state.maximum_activation(&[NodeKind::Token]), 90.0);
        assert_eq!(state.maximum_activation(&[NodeKind::Basic]), 60.0);
        assert_eq!(state.maximum_activation(&[NodeKind::Sentence]), 0.0);
    }
}
