//! Directed, co-occurrence-counted links.
//!
//! A link is identified by its `(from, to, label)` node triple; adding the
//! same triple again increments the stored link's co-occurrence instead of
//! creating a second edge. Links hold node indices, never node references.

use serde::{Deserialize, Serialize};

use crate::constants::ACTIVATION_MAX;
use crate::node::NodeId;

/// Index into the network's link table.
pub type LinkId = usize;

/// A directed edge of the concept network, optionally labeled by a third
/// node whose activation biases the edge's weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    from: NodeId,
    to: NodeId,
    label: Option<NodeId>,
    co_occurrence: u64,
}

impl Link {
    pub(crate) fn new(from: NodeId, to: NodeId, label: Option<NodeId>) -> Self {
        Self {
            from,
            to,
            label,
            co_occurrence: 1,
        }
    }

    pub fn from_id(&self) -> NodeId {
        self.from
    }

    pub fn to_id(&self) -> NodeId {
        self.to
    }

    pub fn label_id(&self) -> Option<NodeId> {
        self.label
    }

    pub fn co_occurrence(&self) -> u64 {
        self.co_occurrence
    }

    pub(crate) fn increment_co_occurrence(&mut self) {
        self.co_occurrence += 1;
    }

    /// Weight of the link: co-occurrence over the source node's occurrence,
    /// optionally pulled toward 1 by the label's activation.
    ///
    /// `label_activation` is the label node's activation in the state the
    /// weight is computed for; pass `None` for unlabeled links (or when no
    /// state applies).
    pub fn weight(&self, from_occurrence: u64, label_activation: Option<f64>) -> f64 {
        let mut weight = self.co_occurrence as f64 / from_occurrence as f64;
        if let Some(label_av) = label_activation {
            weight += (1.0 - weight) * label_av / ACTIVATION_MAX;
        }
        weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_is_co_occurrence_over_occurrence() {
        let link = Link::new(0, 1, None);
        assert_eq!(link.weight(1, None), 1.0);
        assert_eq!(link.weight(4, None), 0.25);
    }

    #[test]
    fn test_label_activation_pulls_weight_toward_one() {
        let mut link = Link::new(0, 1, Some(2));
        link.increment_co_occurrence();
        // weight = 2/4 = 0.5, then 0.5 + 0.5 * 50/100 = 0.75
        assert_eq!(link.weight(4, Some(50.0)), 0.75);
        // a fully activated label saturates the weight
        assert_eq!(link.weight(4, Some(100.0)), 1.0);
        // an inactive label leaves the weight untouched
        assert_eq!(link.weight(4, Some(0.0)), 0.5);
    }
}
