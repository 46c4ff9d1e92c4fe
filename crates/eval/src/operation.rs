//! Pipeline interpreter.
//!
//! An [`Evaluator`] walks a parsed [`Operation`] tree for one dice tuple at a
//! time. The tree is borrowed read-only; the evaluator owns the memo caches,
//! so each worker thread should hold its own evaluator over a shared tree.
//!
//! Parameter broadcasting, branch lengths, select indices and overflow are
//! always checked. `Validated` nodes only add the failing stage and input
//! tuple to the error.

use rust_decimal::Decimal;

use dicedist_core::{CustomOutput, DiceTuple, Operation, Reduction};

use crate::memo::{MemoCache, MemoStats};
use crate::numeric;
use crate::predicate::eval_condition;
use crate::types::EvalError;

// ──────────────────────────────────────────────
// Evaluator
// ──────────────────────────────────────────────

pub struct Evaluator<'op> {
    root: &'op Operation,
    caches: Vec<MemoCache>,
}

impl<'op> Evaluator<'op> {
    pub fn new(root: &'op Operation) -> Self {
        Self::with_memo_capacity(root, None)
    }

    /// Evaluator whose memo caches each hold at most `capacity` entries.
    pub fn with_memo_capacity(root: &'op Operation, capacity: Option<usize>) -> Self {
        let caches = (0..root.memo_slots())
            .map(|_| MemoCache::new(capacity))
            .collect();
        Evaluator { root, caches }
    }

    /// Evaluator that continues with caches taken from an earlier one over
    /// the same tree. Missing slots get fresh unbounded caches.
    pub fn from_caches(root: &'op Operation, mut caches: Vec<MemoCache>) -> Self {
        let slots = root.memo_slots();
        if caches.len() < slots {
            caches.resize_with(slots, || MemoCache::new(None));
        }
        Evaluator { root, caches }
    }

    /// Release the memo caches so they outlive this evaluator.
    pub fn into_caches(self) -> Vec<MemoCache> {
        self.caches
    }

    /// Apply the whole pipeline to one tuple.
    pub fn apply(&mut self, dice: &[i64]) -> Result<DiceTuple, EvalError> {
        self.eval(self.root, dice)
    }

    pub fn memo_stats(&self) -> MemoStats {
        MemoStats::sum(&self.caches)
    }

    fn eval(&mut self, op: &'op Operation, dice: &[i64]) -> Result<DiceTuple, EvalError> {
        match op {
            Operation::Identity => Ok(dice.to_vec()),
            Operation::Reduce(reduction) => Ok(vec![reduce(*reduction, dice)?]),
            Operation::Sort => {
                let mut sorted = dice.to_vec();
                sorted.sort_unstable();
                Ok(sorted)
            }
            Operation::Add(values) => positional("add", values, dice, |x, p| {
                x.checked_add(*p).ok_or(EvalError::Overflow { op: "add" })
            }),
            Operation::SetTo(values) => positional("set-to", values, dice, |_, p| Ok(*p)),
            Operation::Scale { factors, rounding } => {
                positional("scale", factors, dice, |x, f| numeric::scale(x, *f, *rounding))
            }
            Operation::Exp {
                exponents,
                as_base,
                rounding,
            } => positional("exp", exponents, dice, |x, e| {
                if *as_base {
                    numeric::power(*e, Decimal::from(x), *rounding)
                } else {
                    numeric::power(Decimal::from(x), *e, *rounding)
                }
            }),
            Operation::Bound(pairs) => positional("bound", pairs, dice, |x, &(lower, upper)| {
                Ok(clamp(x, lower, upper))
            }),
            Operation::Reroll(condition) => {
                for (index, &value) in dice.iter().enumerate() {
                    // The last roll stands whatever it shows.
                    if index + 1 == dice.len() || !eval_condition(condition, value, index)? {
                        return Ok(vec![value]);
                    }
                }
                Err(EvalError::EmptyTuple { op: "reroll" })
            }
            Operation::Select(indices) => select(indices, dice),
            Operation::SliceApply { size, inner, outer } => {
                let mut joined = Vec::with_capacity(dice.len());
                // A trailing chunk shorter than `size` is dropped.
                for chunk in dice.chunks_exact(*size) {
                    joined.extend(self.eval(inner, chunk)?);
                }
                self.eval(outer, &joined)
            }
            Operation::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let taken = self.eval(then, dice)?;
                let fallback = self.eval(otherwise, dice)?;
                if taken.len() != dice.len() || fallback.len() != dice.len() {
                    return Err(EvalError::BranchLength {
                        input: dice.len(),
                        then: taken.len(),
                        otherwise: fallback.len(),
                    });
                }
                let mut merged = Vec::with_capacity(dice.len());
                for (index, &value) in dice.iter().enumerate() {
                    let pick = if eval_condition(condition, value, index)? {
                        taken[index]
                    } else {
                        fallback[index]
                    };
                    merged.push(pick);
                }
                Ok(merged)
            }
            Operation::Custom(custom) => custom
                .callable
                .call(dice, &custom.params)
                .map(CustomOutput::into_tuple)
                .map_err(|source| EvalError::Custom {
                    name: custom.name.clone(),
                    source,
                }),
            Operation::Then(first, next) => {
                let middle = self.eval(first, dice)?;
                self.eval(next, &middle)
            }
            Operation::Validated(inner) => self.eval(inner, dice).map_err(|err| match err {
                // Keep the innermost stage: it names the smallest failing pipeline.
                staged @ EvalError::Stage { .. } => staged,
                other => EvalError::Stage {
                    stage: inner.to_string(),
                    input: dice.to_vec(),
                    source: Box::new(other),
                },
            }),
            Operation::Memoized { slot, inner } => {
                if let Some(hit) = self.caches.get_mut(*slot).and_then(|c| c.get(dice)) {
                    return Ok(hit);
                }
                let output = self.eval(inner, dice)?;
                if let Some(cache) = self.caches.get_mut(*slot) {
                    cache.insert(dice.to_vec(), output.clone());
                }
                Ok(output)
            }
        }
    }
}

// ──────────────────────────────────────────────
// Operation helpers
// ──────────────────────────────────────────────

/// Map each die with its parameter: one shared parameter, or exactly one per die.
fn positional<P>(
    op: &'static str,
    params: &[P],
    dice: &[i64],
    f: impl Fn(i64, &P) -> Result<i64, EvalError>,
) -> Result<DiceTuple, EvalError> {
    match params {
        [shared] => dice.iter().map(|&x| f(x, shared)).collect(),
        _ if params.len() == dice.len() => {
            dice.iter().zip(params).map(|(&x, p)| f(x, p)).collect()
        }
        _ => Err(EvalError::ParameterCount {
            op,
            params: params.len(),
            dice: dice.len(),
        }),
    }
}

fn clamp(value: i64, lower: i64, upper: i64) -> i64 {
    if value <= lower {
        lower
    } else if value >= upper {
        upper
    } else {
        value
    }
}

fn reduce(reduction: Reduction, dice: &[i64]) -> Result<i64, EvalError> {
    let op = reduction.keyword();
    let overflow = EvalError::Overflow { op };
    match reduction {
        Reduction::Sum => dice
            .iter()
            .try_fold(0i64, |acc, &x| acc.checked_add(x))
            .ok_or(overflow),
        Reduction::Product => dice
            .iter()
            .try_fold(1i64, |acc, &x| acc.checked_mul(x))
            .ok_or(overflow),
        Reduction::BitOr => Ok(dice.iter().fold(0, |acc, &x| acc | x)),
        Reduction::Min => dice.iter().copied().min().ok_or(EvalError::EmptyTuple { op }),
        Reduction::Max => dice.iter().copied().max().ok_or(EvalError::EmptyTuple { op }),
        Reduction::BitXor => dice
            .iter()
            .copied()
            .reduce(|acc, x| acc ^ x)
            .ok_or(EvalError::EmptyTuple { op }),
        Reduction::BitAnd => dice
            .iter()
            .copied()
            .reduce(|acc, x| acc & x)
            .ok_or(EvalError::EmptyTuple { op }),
    }
}

/// Pick positions of the ascending sort; negative indices count from the end.
fn select(indices: &[i64], dice: &[i64]) -> Result<DiceTuple, EvalError> {
    let mut sorted = dice.to_vec();
    sorted.sort_unstable();
    let len = sorted.len();
    indices
        .iter()
        .map(|&index| {
            let position = if index < 0 {
                i64::try_from(len).ok().and_then(|n| n.checked_add(index))
            } else {
                Some(index)
            };
            position
                .and_then(|p| usize::try_from(p).ok())
                .and_then(|p| sorted.get(p).copied())
                .ok_or(EvalError::IndexOutOfRange {
                    op: "select",
                    index,
                    len,
                })
        })
        .collect()
}
