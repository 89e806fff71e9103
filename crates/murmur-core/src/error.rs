//! Error types for murmur-core.

use thiserror::Error;

use crate::node::NodeKind;

/// Top-level error type for concept network operations.
///
/// All failures are local and synchronous: they are raised at the point of
/// violation and never retried internally. Activation clamping during
/// propagation and urgency clamping during selection are part of the numeric
/// contract, not error recovery, and do not surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Lookup of a (symbol, kind) pair that is not in the network.
    #[error("unknown node: \"{symbol}\" ({kind})")]
    UnknownNode { symbol: String, kind: NodeKind },

    /// A node id that does not point into the node table.
    #[error("node id {0} is not in the network")]
    UnknownNodeId(usize),

    /// Lookup of a (from, to, label) triple with no registered link.
    #[error("no link from \"{from}\" to \"{to}\"")]
    UnknownLink { from: String, to: String },

    /// A link id that does not point into the link table.
    #[error("link id {0} is not in the network")]
    UnknownLinkId(usize),

    /// Lookup of a state id that was never added.
    #[error("unknown state: \"{0}\"")]
    UnknownState(String),

    /// A link needs both of its endpoints.
    #[error("a link lacks at least one endpoint node")]
    IncompleteLink,

    /// Merging two nodes whose variants disagree.
    #[error("cannot merge a {actual} node into a {expected} node")]
    KindMismatch { expected: NodeKind, actual: NodeKind },

    /// `normal_incoming_links` must stay > 1 to keep the logarithmic
    /// normalizer defined for every nonnegative incoming count.
    #[error("normal number of incoming links must be > 1, got {0}")]
    BadNormalIncomingLinks(f64),

    /// An activation value outside [0, 100] was handed to a setter.
    #[error("activation value {0} is not allowed, must be in [0,100]")]
    BadActivationValue(f64),

    /// A temperature outside [0, 100].
    #[error("bad temperature {0}, must be in [0,100]")]
    BadTemperature(f64),

    /// The selector was invoked with no candidates.
    #[error("no items to choose from")]
    NoCandidates,

    /// Adding a state whose id is already registered.
    #[error("the state \"{0}\" already exists")]
    DuplicateState(String),

    /// Snapshot encoding or decoding failed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl From<bincode::Error> for CoreError {
    fn from(err: bincode::Error) -> Self {
        CoreError::Snapshot(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::UnknownNode {
            symbol: "hello".to_string(),
            kind: NodeKind::Token,
        };
        assert!(err.to_string().contains("hello"));
        assert!(err.to_string().contains("token"));

        let err = CoreError::BadTemperature(140.0);
        assert!(err.to_string().contains("140"));
    }

    #[test]
    fn test_duplicate_state_names_the_id() {
        let err = CoreError::DuplicateState("alice".to_string());
        assert!(err.to_string().contains("alice"));
    }
}
