//! dicedist evaluator -- applies a parsed pipeline to dice outcomes and
//! aggregates the results into a distribution.
//!
//! The parsed [`Operation`](dicedist_core::Operation) tree is immutable; an
//! [`Evaluator`] borrows it and owns the per-stage memo caches. Outcomes come
//! from a [`DicePool`] (full enumeration or seeded sampling) or from the
//! product of previously saved distributions.

pub mod dice;
pub mod distribution;
pub mod memo;
pub mod numeric;
pub mod operation;
pub mod outcome;
pub mod predicate;
pub mod types;

pub use dice::{DicePool, Die, Face};
pub use distribution::Distribution;
pub use memo::{MemoCache, MemoStats};
pub use operation::Evaluator;
pub use outcome::{Combine, Enumerate, Outcome, Simulate};
pub use predicate::eval_condition;
pub use types::{DiceError, EvalError};

pub use dicedist_core::DiceTuple;
