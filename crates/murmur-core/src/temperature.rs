//! Temperature-controlled weighted random selection.
//!
//! The temperature knob trades determinism for exploration: at 0 the best
//! weight is amplified until it always wins, at 50 weights are used as-is,
//! at 100 the distribution is flattened toward uniform. The generator is
//! threaded in explicitly so callers (and tests) control seeding.

use rand::Rng;

use crate::constants::TEMPERATURE_INFLUENCE_FACTOR;
use crate::error::{CoreError, CoreResult};

/// A selection policy over weighted candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    value: f64,
    influence_factor: f64,
}

impl Temperature {
    /// Create a selector; `value` must be in [0, 100] (0 = cold and greedy,
    /// 100 = hot and exploratory).
    pub fn new(value: f64) -> CoreResult<Self> {
        if !(0.0..=100.0).contains(&value) {
            return Err(CoreError::BadTemperature(value));
        }
        Ok(Self {
            value,
            influence_factor: TEMPERATURE_INFLUENCE_FACTOR,
        })
    }

    pub fn with_influence_factor(mut self, influence_factor: f64) -> Self {
        self.influence_factor = influence_factor;
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) -> CoreResult<()> {
        if !(0.0..=100.0).contains(&value) {
            return Err(CoreError::BadTemperature(value));
        }
        self.value = value;
        Ok(())
    }

    /// Choose one item among `(item, weight)` candidates.
    ///
    /// Each weight is warped into an urgency
    /// `weight + T * influence_factor * (avg - weight)` with
    /// `T = (value - 50) / 50`, clamped to ≥ 0, and a uniform draw over the
    /// cumulative urgency table picks the winner. A total urgency below 1 is
    /// clamped up to 1 so the random range never degenerates.
    pub fn choose<'a, T>(&self, items: &'a [(T, f64)], rng: &mut impl Rng) -> CoreResult<&'a T> {
        if items.is_empty() {
            return Err(CoreError::NoCandidates);
        }
        let t = (self.value - 50.0) / 50.0;
        let total: f64 = items.iter().map(|(_, weight)| weight).sum();
        let avg = total / items.len() as f64;

        let mut cumulative = Vec::with_capacity(items.len());
        let mut urgency_sum = 0.0;
        for (_, weight) in items {
            let urgency = (weight + t * self.influence_factor * (avg - weight)).max(0.0);
            urgency_sum += urgency;
            cumulative.push(urgency_sum);
        }

        let range_end = urgency_sum.max(1.0).floor() as u64;
        let draw = rng.gen_range(0..=range_end) as f64;

        for (index, bound) in cumulative.iter().enumerate() {
            if draw <= *bound {
                return Ok(&items[index].0);
            }
        }
        // The draw overshot every bound (possible when the sum was clamped
        // up to 1); any candidate is as good as another.
        Ok(&items[0].0)
    }
}
