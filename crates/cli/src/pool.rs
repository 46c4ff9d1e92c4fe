//! Dice construction from command line flags.
//!
//! Single-type dice (`--die-*`) and multi-type dice (`--multi-die-*`) are
//! mutually exclusive; exactly one scheme must be given unless outcomes are
//! loaded from files.

use clap::Args;
use rust_decimal::Decimal;

use dicedist_eval::{DicePool, Die};

use crate::error::CliError;

pub(crate) fn positive(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn weight(text: &str) -> Result<Decimal, String> {
    let value: Decimal = text.parse().map_err(|e: rust_decimal::Error| e.to_string())?;
    if value <= Decimal::ZERO {
        return Err("weights must be greater than zero".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct DiceArgs {
    /// Number of identical dice
    #[arg(short = 'n', long, value_parser = positive, conflicts_with = "multi_die_sides")]
    pub num_dice: Option<usize>,

    /// Sides per die, counting from --die-start by --die-step
    #[arg(short = 'd', long, value_parser = positive, conflicts_with = "die_values")]
    pub die_sides: Option<usize>,

    /// First face value
    #[arg(long, requires = "die_sides")]
    pub die_start: Option<i64>,

    /// Difference between consecutive face values
    #[arg(long, requires = "die_sides")]
    pub die_step: Option<i64>,

    /// Explicit face values
    #[arg(long, num_args = 1..)]
    pub die_values: Vec<i64>,

    /// One weight per face
    #[arg(long, num_args = 1.., value_parser = weight)]
    pub die_weights: Vec<Decimal>,

    /// Sides of each die in a mixed pool
    #[arg(long, num_args = 1.., value_parser = positive)]
    pub multi_die_sides: Vec<usize>,

    /// First face value of each die
    #[arg(long, num_args = 1.., conflicts_with = "multi_die_values")]
    pub multi_die_start: Vec<i64>,

    /// Face step of each die
    #[arg(long, num_args = 1.., conflicts_with = "multi_die_values")]
    pub multi_die_step: Vec<i64>,

    /// Face values of all dice in order, grouped by --multi-die-sides
    #[arg(long, num_args = 1..)]
    pub multi_die_values: Vec<i64>,

    /// One weight per face across all dice in order
    #[arg(long, num_args = 1.., value_parser = weight)]
    pub multi_die_weights: Vec<Decimal>,
}

fn non_empty<T>(values: &[T]) -> Option<&[T]> {
    (!values.is_empty()).then_some(values)
}

impl DiceArgs {
    fn is_single(&self) -> bool {
        self.die_sides.is_some() || !self.die_values.is_empty()
    }

    fn is_multi(&self) -> bool {
        !self.multi_die_sides.is_empty()
    }

    /// True when any die flag was given at all.
    pub(crate) fn is_set(&self) -> bool {
        self.is_single()
            || self.is_multi()
            || self.num_dice.is_some()
            || !self.die_weights.is_empty()
            || !self.multi_die_values.is_empty()
            || !self.multi_die_weights.is_empty()
    }

    pub(crate) fn pool(&self) -> Result<DicePool, CliError> {
        match (self.is_single(), self.is_multi()) {
            (true, true) => Err(CliError::Usage(
                "single-type (--die-*) and multi-type (--multi-die-*) dice cannot be combined"
                    .to_string(),
            )),
            (false, false) => Err(CliError::Usage(
                "no dice given: use --die-sides, --die-values or --multi-die-sides".to_string(),
            )),
            (true, false) => self.single(),
            (false, true) => self.multi(),
        }
    }

    fn single(&self) -> Result<DicePool, CliError> {
        if !self.multi_die_weights.is_empty() || !self.multi_die_values.is_empty() {
            return Err(CliError::Usage(
                "--multi-die-values and --multi-die-weights need --multi-die-sides".to_string(),
            ));
        }
        let die = match self.die_sides {
            Some(sides) => Die::arithmetic(
                self.die_start.unwrap_or(1),
                self.die_step.unwrap_or(1),
                sides,
            )?,
            None => Die::from_values(self.die_values.clone())?,
        };
        let die = match non_empty(&self.die_weights) {
            Some(weights) => die.with_weights(weights)?,
            None => die,
        };
        Ok(DicePool::uniform(die, self.num_dice.unwrap_or(1))?)
    }

    fn multi(&self) -> Result<DicePool, CliError> {
        if !self.die_weights.is_empty() {
            return Err(CliError::Usage(
                "--die-weights applies to single-type dice; use --multi-die-weights".to_string(),
            ));
        }
        let weights = non_empty(&self.multi_die_weights);
        let pool = match non_empty(&self.multi_die_values) {
            Some(values) => DicePool::grouped(&self.multi_die_sides, values, weights)?,
            None => DicePool::arithmetic(
                &self.multi_die_sides,
                non_empty(&self.multi_die_start),
                non_empty(&self.multi_die_step),
                weights,
            )?,
        };
        Ok(pool)
    }
}
