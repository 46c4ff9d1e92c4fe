//! Outcome sources: `(tuple, weight)` pairs fed to the aggregation loop.
//!
//! All sources are lazy iterators. Weights are products of face weights (or
//! of loaded counts) and saturate at `Decimal::MAX` rather than overflow.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;

use dicedist_core::DiceTuple;

use crate::dice::{DicePool, Die};
use crate::distribution::Distribution;

pub type Outcome = (DiceTuple, Decimal);

fn weight_product(weights: impl IntoIterator<Item = Decimal>) -> Decimal {
    weights.into_iter().fold(Decimal::ONE, |acc, w| {
        acc.checked_mul(w).unwrap_or(Decimal::MAX)
    })
}

// ──────────────────────────────────────────────
// Full enumeration
// ──────────────────────────────────────────────

/// Every combination of faces, last die varying fastest.
pub struct Enumerate<'p> {
    dice: &'p [Die],
    positions: Vec<usize>,
    done: bool,
}

impl<'p> Enumerate<'p> {
    pub fn new(pool: &'p DicePool) -> Self {
        let dice = pool.dice();
        Enumerate {
            dice,
            positions: vec![0; dice.len()],
            done: dice.iter().any(|d| d.sides() == 0),
        }
    }
}

impl Iterator for Enumerate<'_> {
    type Item = Outcome;

    fn next(&mut self) -> Option<Outcome> {
        if self.done {
            return None;
        }
        let faces: Vec<_> = self
            .dice
            .iter()
            .zip(&self.positions)
            .filter_map(|(die, &p)| die.faces().get(p))
            .collect();
        let tuple = faces.iter().map(|f| f.value).collect();
        let weight = weight_product(faces.iter().map(|f| f.weight));

        self.done = true;
        for (position, die) in self.positions.iter_mut().zip(self.dice).rev() {
            *position += 1;
            if *position < die.sides() {
                self.done = false;
                break;
            }
            *position = 0;
        }
        Some((tuple, weight))
    }
}

// ──────────────────────────────────────────────
// Monte-Carlo sampling
// ──────────────────────────────────────────────

/// `remaining` independent rolls, each face picked uniformly.
pub struct Simulate<'p, R> {
    dice: &'p [Die],
    rng: R,
    remaining: u64,
}

impl<'p, R: Rng> Simulate<'p, R> {
    pub fn new(pool: &'p DicePool, rng: R, samples: u64) -> Self {
        Simulate {
            dice: pool.dice(),
            rng,
            remaining: samples,
        }
    }
}

impl<R: Rng> Iterator for Simulate<'_, R> {
    type Item = Outcome;

    fn next(&mut self) -> Option<Outcome> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let mut tuple = Vec::with_capacity(self.dice.len());
        let mut weights = Vec::with_capacity(self.dice.len());
        for die in self.dice {
            let face = die.faces().choose(&mut self.rng)?;
            tuple.push(face.value);
            weights.push(face.weight);
        }
        Some((tuple, weight_product(weights)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

// ──────────────────────────────────────────────
// Product of loaded distributions
// ──────────────────────────────────────────────

/// The Cartesian product of distributions: keys concatenated, counts multiplied.
pub struct Combine {
    entries: Vec<Vec<Outcome>>,
    positions: Vec<usize>,
    done: bool,
}

impl Combine {
    pub fn new(distributions: &[Distribution]) -> Self {
        let entries: Vec<Vec<Outcome>> = distributions
            .iter()
            .map(|d| d.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .collect();
        let done = entries.is_empty() || entries.iter().any(Vec::is_empty);
        Combine {
            positions: vec![0; entries.len()],
            entries,
            done,
        }
    }
}

impl Iterator for Combine {
    type Item = Outcome;

    fn next(&mut self) -> Option<Outcome> {
        if self.done {
            return None;
        }
        let picked: Vec<&Outcome> = self
            .entries
            .iter()
            .zip(&self.positions)
            .filter_map(|(entries, &p)| entries.get(p))
            .collect();
        let tuple = picked.iter().flat_map(|(key, _)| key.iter().copied()).collect();
        let weight = weight_product(picked.iter().map(|(_, count)| *count));

        self.done = true;
        for (position, entries) in self.positions.iter_mut().zip(&self.entries).rev() {
            *position += 1;
            if *position < entries.len() {
                self.done = false;
                break;
            }
            *position = 0;
        }
        Some((tuple, weight))
    }
}
