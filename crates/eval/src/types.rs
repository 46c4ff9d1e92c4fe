//! Error types for evaluation and dice construction.

use dicedist_core::{CustomError, DiceTuple};
use rust_decimal::Decimal;

/// Errors raised while applying an operation to a dice tuple.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Positional parameters must be one shared value or one per die.
    #[error("'{op}' got {params} parameters for {dice} dice (expected 1 or {dice})")]
    ParameterCount {
        op: &'static str,
        params: usize,
        dice: usize,
    },

    /// A fold without an identity element was given no dice.
    #[error("'{op}' needs at least one die")]
    EmptyTuple { op: &'static str },

    /// Checked integer or decimal arithmetic overflowed.
    #[error("numeric overflow in '{op}'")]
    Overflow { op: &'static str },

    /// A `select` index outside the sorted tuple.
    #[error("'{op}' index {index} is out of range for {len} dice")]
    IndexOutOfRange {
        op: &'static str,
        index: i64,
        len: usize,
    },

    /// A per-position condition operand is missing for this die.
    #[error("'{op}' has no operand for die {index} ({available} given)")]
    MissingOperand {
        op: &'static str,
        index: usize,
        available: usize,
    },

    /// Both sides of an if/else merge must keep the input length.
    #[error("if/else branches returned {then} and {otherwise} values for {input} dice")]
    BranchLength {
        input: usize,
        then: usize,
        otherwise: usize,
    },

    #[error("'{op}': {message}")]
    Domain { op: &'static str, message: String },

    #[error("custom operation '{name}' failed: {source}")]
    Custom { name: String, source: CustomError },

    /// An error with the stage and tuple that produced it.
    #[error("{source}\n  in stage: {stage}\n  input: {input:?}")]
    Stage {
        stage: String,
        input: DiceTuple,
        source: Box<EvalError>,
    },
}

impl EvalError {
    /// The error without any stage context.
    pub fn root_cause(&self) -> &EvalError {
        match self {
            EvalError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors raised while building dice and dice pools.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiceError {
    #[error("a die needs at least one side")]
    NoSides,

    #[error("die step must not be zero")]
    ZeroStep,

    #[error("die has {faces} faces but {weights} weights were given")]
    WeightCount { faces: usize, weights: usize },

    #[error("face weights must be positive, got {0}")]
    NonPositiveWeight(Decimal),

    #[error("a dice pool needs at least one die")]
    EmptyPool,

    #[error("die face values overflow")]
    Overflow,

    #[error("{0}")]
    Layout(String),
}
