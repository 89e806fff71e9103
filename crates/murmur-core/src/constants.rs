//! Engine constants.
//!
//! Every tuning value that shapes propagation, eviction, selection, or
//! generation lives here rather than inline at its use site.

/// Upper bound of the activation scale. Activations live in [0, MAX].
pub const ACTIVATION_MAX: f64 = 100.0;

/// A state entry set to zero is evicted outright once its age is strictly
/// above this many propagation steps.
pub const EVICTION_AGE: u64 = 50;

/// Default "normal" number of incoming links: the baseline of the
/// logarithmic influence normalizer.
pub const DEFAULT_NORMAL_INCOMING_LINKS: f64 = 2.0;

/// Default memory performance for the node-centric (full) propagation.
pub const DEFAULT_MEMORY_PERF_FULL: f64 = 80.0;

/// Default memory performance for the link-centric (fast) propagation.
pub const DEFAULT_MEMORY_PERF_FAST: f64 = 100.0;

/// Default activation threshold when collecting reply-seed candidates.
pub const ACTIVATED_NODE_THRESHOLD: f64 = 90.0;

/// Weight-vs-average amplification factor of the temperature selector.
pub const TEMPERATURE_INFLUENCE_FACTOR: f64 = 2.0;

/// Candidates whose repetition penalty exceeds this are dropped from a
/// generation walk entirely.
pub const REPETITION_PENALTY_CAP: f64 = 100.0;
