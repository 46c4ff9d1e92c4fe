//! Frequency table of pipeline results.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use dicedist_core::DiceTuple;

use crate::operation::Evaluator;
use crate::outcome::Outcome;
use crate::types::EvalError;

/// Accumulated weight per result tuple, ordered by tuple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    counts: BTreeMap<DiceTuple, Decimal>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the pipeline to every outcome and sum weights per result.
    pub fn tally<I>(evaluator: &mut Evaluator<'_>, outcomes: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = Outcome>,
    {
        let mut distribution = Distribution::new();
        let mut seen = 0u64;
        for (dice, weight) in outcomes {
            let key = evaluator.apply(&dice)?;
            distribution.add(key, weight);
            seen += 1;
        }
        let memo = evaluator.memo_stats();
        tracing::debug!(
            outcomes = seen,
            results = distribution.len(),
            memo_hits = memo.hits,
            memo_misses = memo.misses,
            "tallied distribution"
        );
        Ok(distribution)
    }

    pub fn add(&mut self, key: DiceTuple, weight: Decimal) {
        let slot = self.counts.entry(key).or_insert(Decimal::ZERO);
        *slot = slot.checked_add(weight).unwrap_or(Decimal::MAX);
    }

    pub fn get(&self, key: &[i64]) -> Option<Decimal> {
        self.counts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.counts.values().fold(Decimal::ZERO, |acc, v| {
            acc.checked_add(*v).unwrap_or(Decimal::MAX)
        })
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&DiceTuple, &Decimal)> {
        self.counts.iter()
    }

    /// Entries ordered by weight, ties broken by key.
    pub fn by_value(&self) -> Vec<(&DiceTuple, &Decimal)> {
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// True when every weight is a whole number.
    pub fn is_integral(&self) -> bool {
        self.counts.values().all(|v| v.fract().is_zero())
    }
}

impl FromIterator<(DiceTuple, Decimal)> for Distribution {
    fn from_iter<T: IntoIterator<Item = (DiceTuple, Decimal)>>(iter: T) -> Self {
        let mut distribution = Distribution::new();
        for (key, weight) in iter {
            distribution.add(key, weight);
        }
        distribution
    }
}
