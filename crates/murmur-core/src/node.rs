//! Typed nodes of the concept network.
//!
//! A node is identified by its `(symbol, kind)` pair. Re-adding a node with
//! the same identity merges counters into the stored node instead of
//! creating a duplicate; what "merge" means depends on the variant (see
//! [`NodeVariant::merge_from`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::link::LinkId;

/// Index into the network's node table.
pub type NodeId = usize;

/// The type tag of a node. Determines its decay rate and which auxiliary
/// counters its payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Basic,
    Token,
    Sentence,
    Expression,
    Sentiment,
    Utterer,
}

impl NodeKind {
    /// Stable textual name of the kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Basic => "basic",
            NodeKind::Token => "token",
            NodeKind::Sentence => "sentence",
            NodeKind::Expression => "expression",
            NodeKind::Sentiment => "sentiment",
            NodeKind::Utterer => "utterer",
        }
    }

    /// Per-step activation loss, in percent of the current activation.
    /// Lower means remembered longer.
    pub fn decay_rate(&self) -> f64 {
        match self {
            NodeKind::Basic => 40.0,
            NodeKind::Token => 40.0,
            NodeKind::Sentence => 50.0,
            NodeKind::Expression => 40.0,
            NodeKind::Sentiment => 10.0,
            NodeKind::Utterer => 70.0,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Identity of a node: its symbol plus its kind. Also the key under which
/// activation states track the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub symbol: String,
    pub kind: NodeKind,
}

impl NodeKey {
    pub fn new(symbol: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.kind)
    }
}

/// Position of a token inside the sentence it was seen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPosition {
    Beginning,
    Middle,
    End,
}

/// Variant payload of a node: the auxiliary counters specific to its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeVariant {
    Basic,
    /// How often the token began, continued, and ended a sentence.
    Token { beginning: u64, middle: u64, end: u64 },
    /// How often the sentence opened a dialogue.
    Sentence { dialogue_openings: u64 },
    Expression,
    Sentiment,
    /// When the utterer was last heard from.
    Utterer { last_active: DateTime<Utc> },
}

impl NodeVariant {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeVariant::Basic => NodeKind::Basic,
            NodeVariant::Token { .. } => NodeKind::Token,
            NodeVariant::Sentence { .. } => NodeKind::Sentence,
            NodeVariant::Expression => NodeKind::Expression,
            NodeVariant::Sentiment => NodeKind::Sentiment,
            NodeVariant::Utterer { .. } => NodeKind::Utterer,
        }
    }

    /// Fold another payload of the same kind into this one.
    ///
    /// Counters are summed; the utterer's `last_active` is replaced by the
    /// most recent of the two timestamps rather than summed.
    pub fn merge_from(&mut self, other: &NodeVariant) -> CoreResult<()> {
        match (self, other) {
            (NodeVariant::Basic, NodeVariant::Basic)
            | (NodeVariant::Expression, NodeVariant::Expression)
            | (NodeVariant::Sentiment, NodeVariant::Sentiment) => Ok(()),
            (
                NodeVariant::Token {
                    beginning,
                    middle,
                    end,
                },
                NodeVariant::Token {
                    beginning: b,
                    middle: m,
                    end: e,
                },
            ) => {
                *beginning += b;
                *middle += m;
                *end += e;
                Ok(())
            }
            (
                NodeVariant::Sentence { dialogue_openings },
                NodeVariant::Sentence {
                    dialogue_openings: d,
                },
            ) => {
                *dialogue_openings += d;
                Ok(())
            }
            (NodeVariant::Utterer { last_active }, NodeVariant::Utterer { last_active: l }) => {
                if *l > *last_active {
                    *last_active = *l;
                }
                Ok(())
            }
            (me, other) => Err(CoreError::KindMismatch {
                expected: me.kind(),
                actual: other.kind(),
            }),
        }
    }
}

/// A vertex of the concept network.
///
/// The three adjacency vectors are indexes into the network's link table,
/// maintained by the network whenever a link is added. They are
/// back-references, not ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    symbol: String,
    occurrence: u64,
    variant: NodeVariant,
    pub(crate) outgoing: Vec<LinkId>,
    pub(crate) incoming: Vec<LinkId>,
    pub(crate) labeling: Vec<LinkId>,
}

impl Node {
    /// Create a node with occurrence 1.
    pub fn new(symbol: impl Into<String>, variant: NodeVariant) -> Self {
        Self {
            symbol: symbol.into(),
            occurrence: 1,
            variant,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            labeling: Vec::new(),
        }
    }

    pub fn basic(symbol: impl Into<String>) -> Self {
        Self::new(symbol, NodeVariant::Basic)
    }

    /// A token node with the position counter for one sighting.
    pub fn token(symbol: impl Into<String>, position: TokenPosition) -> Self {
        let (beginning, middle, end) = match position {
            TokenPosition::Beginning => (1, 0, 0),
            TokenPosition::Middle => (0, 1, 0),
            TokenPosition::End => (0, 0, 1),
        };
        Self::new(
            symbol,
            NodeVariant::Token {
                beginning,
                middle,
                end,
            },
        )
    }

    pub fn sentence(symbol: impl Into<String>, opens_dialogue: bool) -> Self {
        Self::new(
            symbol,
            NodeVariant::Sentence {
                dialogue_openings: opens_dialogue as u64,
            },
        )
    }

    pub fn expression(symbol: impl Into<String>) -> Self {
        Self::new(symbol, NodeVariant::Expression)
    }

    pub fn sentiment(symbol: impl Into<String>) -> Self {
        Self::new(symbol, NodeVariant::Sentiment)
    }

    /// An utterer node stamped with the current time.
    pub fn utterer(symbol: impl Into<String>) -> Self {
        Self::new(
            symbol,
            NodeVariant::Utterer {
                last_active: Utc::now(),
            },
        )
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn occurrence(&self) -> u64 {
        self.occurrence
    }

    pub fn kind(&self) -> NodeKind {
        self.variant.kind()
    }

    pub fn variant(&self) -> &NodeVariant {
        &self.variant
    }

    pub fn decay_rate(&self) -> f64 {
        self.kind().decay_rate()
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.symbol.clone(), self.kind())
    }

    /// Merge another sighting of the same node into this one: occurrences
    /// are summed, then the variant payloads are merged.
    pub fn merge_from(&mut self, other: &Node) -> CoreResult<()> {
        self.variant.merge_from(&other.variant)?;
        self.occurrence += other.occurrence;
        Ok(())
    }

    pub fn outgoing_links(&self) -> &[LinkId] {
        &self.outgoing
    }

    pub fn incoming_links(&self) -> &[LinkId] {
        &self.incoming
    }

    pub fn labeling_links(&self) -> &[LinkId] {
        &self.labeling
    }
}

impl fmt::Display for Node {
    /// `symbol (type): occurrence`, the rendering used by `@shownodes`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.symbol, self.kind(), self.occurrence)
    }
}
