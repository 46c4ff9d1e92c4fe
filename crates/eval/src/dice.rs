//! Dice and dice pools.

use rust_decimal::Decimal;

use crate::types::DiceError;

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub value: i64,
    pub weight: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Die {
    faces: Vec<Face>,
}

impl Die {
    /// `sides` faces counting from `start` in increments of `step`.
    pub fn arithmetic(start: i64, step: i64, sides: usize) -> Result<Self, DiceError> {
        if sides == 0 {
            return Err(DiceError::NoSides);
        }
        if step == 0 {
            return Err(DiceError::ZeroStep);
        }
        let mut values = Vec::with_capacity(sides);
        let mut value = start;
        for side in 0..sides {
            if side > 0 {
                value = value.checked_add(step).ok_or(DiceError::Overflow)?;
            }
            values.push(value);
        }
        Self::from_values(values)
    }

    pub fn from_values(values: Vec<i64>) -> Result<Self, DiceError> {
        if values.is_empty() {
            return Err(DiceError::NoSides);
        }
        let faces = values
            .into_iter()
            .map(|value| Face {
                value,
                weight: Decimal::ONE,
            })
            .collect();
        Ok(Die { faces })
    }

    /// Replace the face weights, one per face.
    pub fn with_weights(mut self, weights: &[Decimal]) -> Result<Self, DiceError> {
        if weights.len() != self.faces.len() {
            return Err(DiceError::WeightCount {
                faces: self.faces.len(),
                weights: weights.len(),
            });
        }
        if let Some(bad) = weights.iter().find(|w| **w <= Decimal::ZERO) {
            return Err(DiceError::NonPositiveWeight(*bad));
        }
        for (face, weight) in self.faces.iter_mut().zip(weights) {
            face.weight = *weight;
        }
        Ok(self)
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn sides(&self) -> usize {
        self.faces.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DicePool {
    dice: Vec<Die>,
}

impl DicePool {
    pub fn new(dice: Vec<Die>) -> Result<Self, DiceError> {
        if dice.is_empty() {
            return Err(DiceError::EmptyPool);
        }
        Ok(DicePool { dice })
    }

    /// `count` copies of the same die.
    pub fn uniform(die: Die, count: usize) -> Result<Self, DiceError> {
        Self::new(vec![die; count])
    }

    /// Dice of differing sizes from parallel `start` / `step` lists.
    ///
    /// Missing lists default to start 1 and step 1. `weights`, when given,
    /// holds one weight per face across all dice in order.
    pub fn arithmetic(
        sides: &[usize],
        starts: Option<&[i64]>,
        steps: Option<&[i64]>,
        weights: Option<&[Decimal]>,
    ) -> Result<Self, DiceError> {
        let parallel = |name: &str, len: usize| {
            if len == sides.len() {
                Ok(())
            } else {
                Err(DiceError::Layout(format!(
                    "{} {} values given for {} dice",
                    len,
                    name,
                    sides.len()
                )))
            }
        };
        if let Some(starts) = starts {
            parallel("start", starts.len())?;
        }
        if let Some(steps) = steps {
            parallel("step", steps.len())?;
        }

        let dice = sides
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let start = starts.and_then(|s| s.get(i)).copied().unwrap_or(1);
                let step = steps.and_then(|s| s.get(i)).copied().unwrap_or(1);
                Die::arithmetic(start, step, n)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::apply_weights(dice, weights)
    }

    /// Dice of differing sizes from one flat value list, grouped by `sides`.
    ///
    /// Every value must be used and no die may be left short.
    pub fn grouped(
        sides: &[usize],
        values: &[i64],
        weights: Option<&[Decimal]>,
    ) -> Result<Self, DiceError> {
        let needed: usize = sides.iter().sum();
        if values.len() < needed {
            return Err(DiceError::Layout(format!(
                "not enough die values: {} given, {} needed",
                values.len(),
                needed
            )));
        }
        if values.len() > needed {
            return Err(DiceError::Layout(format!(
                "not all die values were used: {} given, {} needed",
                values.len(),
                needed
            )));
        }

        let mut rest = values;
        let mut dice = Vec::with_capacity(sides.len());
        for &n in sides {
            let (taken, tail) = rest.split_at(n);
            dice.push(Die::from_values(taken.to_vec())?);
            rest = tail;
        }
        Self::apply_weights(dice, weights)
    }

    fn apply_weights(dice: Vec<Die>, weights: Option<&[Decimal]>) -> Result<Self, DiceError> {
        let Some(weights) = weights else {
            return Self::new(dice);
        };
        let faces: usize = dice.iter().map(Die::sides).sum();
        if weights.len() != faces {
            return Err(DiceError::WeightCount {
                faces,
                weights: weights.len(),
            });
        }
        let mut rest = weights;
        let mut weighted = Vec::with_capacity(dice.len());
        for die in dice {
            let (taken, tail) = rest.split_at(die.sides());
            weighted.push(die.with_weights(taken)?);
            rest = tail;
        }
        Self::new(weighted)
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Number of outcomes a full enumeration produces, if it fits in `u128`.
    pub fn outcome_count(&self) -> Option<u128> {
        self.dice
            .iter()
            .try_fold(1u128, |acc, die| acc.checked_mul(die.sides() as u128))
    }
}
