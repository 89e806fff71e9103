//! Murmur core: an associative-memory concept network.
//!
//! A concept network is a graph of typed, occurrence-counted nodes joined
//! by co-occurrence-counted directed links, overlaid with per-identity
//! activation states that model short-term attention spreading through the
//! graph over discrete time steps.
//!
//! # Architecture
//!
//! - [`node`] / [`link`] — the data model: `(symbol, kind)`-identified
//!   nodes with variant-specific counters, and `(from, to, label)`-keyed
//!   links whose weight derives from co-occurrence.
//! - [`network`] — the [`ConceptNetwork`] store: arena-backed node and link
//!   tables, adjacency indexes, state lifecycle, and snapshot/restore.
//! - [`state`] — [`State`] activation overlays with aging and eviction.
//! - [`propagation`] — the full and fast spreading-activation passes.
//! - [`temperature`] — the temperature-controlled weighted selector.
//! - [`generation`] — forward/backward token walks assembling sequences.
//!
//! # Example
//!
//! ```
//! use murmur_core::{ConceptNetwork, Node, NodeKey, NodeKind, PropagationParams, State};
//!
//! let mut cn = ConceptNetwork::new();
//! let hello = cn.add_node(Node::basic("hello"))?;
//! let world = cn.add_node(Node::basic("world"))?;
//! cn.add_link(hello, world, None)?;
//!
//! cn.add_state(State::new("alice"))?;
//! cn.state_mut("alice")?
//!     .fully_activate(&NodeKey::new("hello", NodeKind::Basic));
//! cn.fast_propagate_activations("alice", PropagationParams::fast())?;
//!
//! let world_activation = cn
//!     .state("alice")?
//!     .activation(&NodeKey::new("world", NodeKind::Basic));
//! assert!(world_activation > 50.0);
//! # Ok::<(), murmur_core::CoreError>(())
//! ```

pub mod constants;
pub mod error;
pub mod generation;
pub mod link;
pub mod network;
pub mod node;
pub mod propagation;
pub mod state;
pub mod temperature;

// Re-exports for convenience
pub use error::{CoreError, CoreResult};
pub use link::{Link, LinkId};
pub use network::ConceptNetwork;
pub use node::{Node, NodeId, NodeKey, NodeKind, NodeVariant, TokenPosition};
pub use propagation::PropagationParams;
pub use state::{NodeState, State};
pub use temperature::Temperature;
