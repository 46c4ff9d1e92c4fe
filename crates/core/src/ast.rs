//! The parsed pipeline: an explicit tree of operation and condition nodes.
//!
//! Parsing produces one [`Operation`] that is never mutated afterwards. The
//! evaluator walks this tree once per dice tuple; memoization state lives in
//! the evaluator, keyed by the `slot` of each [`Operation::Memoized`] node,
//! so the tree itself can be shared read-only between threads.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::registry::CustomOperation;

/// One realized pool of die faces, in roll order.
pub type DiceTuple = Vec<i64>;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `id`
    Identity,
    /// `sum`, `min`, `max`, `prod`, `bit-or`, `bit-xor`, `bit-and`
    Reduce(Reduction),
    /// `sort`
    Sort,
    /// `add p...`: one shared value or one per position.
    Add(Vec<i64>),
    /// `set-to p...`
    SetTo(Vec<i64>),
    /// `scale [rounding] f...`
    Scale {
        factors: Vec<Decimal>,
        rounding: Rounding,
    },
    /// `exp [as-base] [rounding] e...`
    Exp {
        exponents: Vec<Decimal>,
        as_base: bool,
        rounding: Rounding,
    },
    /// `bound lo hi ...`: one shared pair or one pair per position.
    Bound(Vec<(i64, i64)>),
    /// `reroll if ...`: keep the first value failing the condition.
    Reroll(Condition),
    /// `select i...`: positions in the ascending sort, negative from the end.
    Select(Vec<i64>),
    /// `slice-apply k inner outer...`
    SliceApply {
        size: usize,
        inner: Box<Operation>,
        outer: Box<Operation>,
    },
    /// An if-able operation or bracket group guarded by a condition.
    Conditional {
        condition: Condition,
        then: Box<Operation>,
        otherwise: Box<Operation>,
    },
    Custom(CustomOp),
    /// `next(first(x))`
    Then(Box<Operation>, Box<Operation>),
    /// Evaluation errors inside carry the stage and the offending tuple.
    Validated(Box<Operation>),
    Memoized {
        slot: usize,
        inner: Box<Operation>,
    },
}

impl Operation {
    /// Number of memoization slots referenced anywhere in the tree.
    pub fn memo_slots(&self) -> usize {
        let own = match self {
            Operation::Memoized { slot, .. } => slot + 1,
            _ => 0,
        };
        self.children()
            .into_iter()
            .map(Operation::memo_slots)
            .fold(own, usize::max)
    }

    fn children(&self) -> Vec<&Operation> {
        match self {
            Operation::SliceApply { inner, outer, .. } => vec![inner, outer],
            Operation::Conditional {
                then, otherwise, ..
            } => vec![then, otherwise],
            Operation::Then(first, next) => vec![first, next],
            Operation::Validated(inner) | Operation::Memoized { inner, .. } => vec![inner],
            _ => Vec::new(),
        }
    }

    /// The operation with validation and memoization wrappers peeled off.
    pub fn unwrapped(&self) -> &Operation {
        match self {
            Operation::Validated(inner) | Operation::Memoized { inner, .. } => inner.unwrapped(),
            other => other,
        }
    }

    /// Whether the rendered form ends in a condition that would swallow
    /// whatever is written after it unless closed with `then`.
    fn open_ended(&self) -> bool {
        match self.unwrapped() {
            Operation::Conditional { .. } => true,
            Operation::Reroll(condition) => *condition != Condition::Always,
            Operation::Then(_, next) => next.open_ended(),
            Operation::SliceApply { outer, .. } => outer.open_ended(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Min,
    Max,
    Product,
    BitOr,
    BitXor,
    BitAnd,
}

impl Reduction {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "sum" => Reduction::Sum,
            "min" => Reduction::Min,
            "max" => Reduction::Max,
            "prod" => Reduction::Product,
            "bit-or" => Reduction::BitOr,
            "bit-xor" => Reduction::BitXor,
            "bit-and" => Reduction::BitAnd,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::Product => "prod",
            Reduction::BitOr => "bit-or",
            Reduction::BitXor => "bit-xor",
            Reduction::BitAnd => "bit-and",
        }
    }
}

/// Rounding applied to `scale` and `exp` results. Half modes round ties away
/// from / toward zero, as decimal `ROUND_HALF_UP` / `ROUND_HALF_DOWN` do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rounding {
    Ceil,
    Floor,
    #[default]
    Truncate,
    HalfUp,
    HalfDown,
}

impl Rounding {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "r-ceil" => Rounding::Ceil,
            "r-floor" => Rounding::Floor,
            "r-truncate" => Rounding::Truncate,
            "r-half-up" => Rounding::HalfUp,
            "r-half-down" => Rounding::HalfDown,
            _ => return None,
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            Rounding::Ceil => "r-ceil",
            Rounding::Floor => "r-floor",
            Rounding::Truncate => "r-truncate",
            Rounding::HalfUp => "r-half-up",
            Rounding::HalfDown => "r-half-down",
        }
    }
}

/// A predicate over `(value, position)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// An empty condition.
    Always,
    /// `eq 3` compares every position against 3; `eq 1 2 3` uses one operand per position.
    Compare {
        comparison: Comparison,
        operands: Vec<i64>,
    },
    /// `mod d... <leaf>`: test the floored remainder instead of the value.
    Modulo {
        divisors: Vec<i64>,
        inner: Box<Condition>,
    },
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "eq" => Comparison::Eq,
            "ne" => Comparison::Ne,
            "gt" => Comparison::Gt,
            "ge" => Comparison::Ge,
            "lt" => Comparison::Lt,
            "le" => Comparison::Le,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
            Comparison::Gt => "gt",
            Comparison::Ge => "ge",
            Comparison::Lt => "lt",
            Comparison::Le => "le",
        }
    }

    pub fn holds(self, left: i64, right: i64) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
        }
    }
}

/// A parameter handed to a custom operation, classified from its token.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Number(Decimal),
    Text(String),
}

impl Param {
    pub fn from_token(token: &str) -> Self {
        if let Ok(n) = token.parse::<i64>() {
            return Param::Int(n);
        }
        match parse_decimal(token) {
            Some(d) => Param::Number(d),
            None => Param::Text(token.to_owned()),
        }
    }
}

/// Parse a decimal literal, accepting scientific notation (`1e3`, `2.5E-1`).
pub fn parse_decimal(token: &str) -> Option<Decimal> {
    Decimal::from_str(token)
        .or_else(|_| Decimal::from_scientific(token))
        .ok()
}

/// A custom operation bound at parse time: the callable plus its call-site parameters.
#[derive(Clone)]
pub struct CustomOp {
    pub name: String,
    pub params: Vec<Param>,
    pub callable: Arc<dyn CustomOperation>,
}

impl fmt::Debug for CustomOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOp")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomOp {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params == other.params
            && Arc::ptr_eq(&self.callable, &other.callable)
    }
}

// ──────────────────────────────────────────────
// Rendering
// ──────────────────────────────────────────────

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Identity => write!(f, "id"),
            Operation::Reduce(r) => write!(f, "{}", r.keyword()),
            Operation::Sort => write!(f, "sort"),
            Operation::Add(values) => write!(f, "add {}", join(values)),
            Operation::SetTo(values) => write!(f, "set-to {}", join(values)),
            Operation::Scale { factors, rounding } => {
                write!(f, "scale {} {}", rounding.tag(), join(factors))
            }
            Operation::Exp {
                exponents,
                as_base,
                rounding,
            } => {
                write!(f, "exp ")?;
                if *as_base {
                    write!(f, "as-base ")?;
                }
                write!(f, "{} {}", rounding.tag(), join(exponents))
            }
            Operation::Bound(pairs) => {
                let flat: Vec<i64> = pairs.iter().flat_map(|&(lo, hi)| [lo, hi]).collect();
                write!(f, "bound {}", join(&flat))
            }
            Operation::Reroll(Condition::Always) => write!(f, "reroll"),
            Operation::Reroll(condition) => write!(f, "reroll if {}", condition),
            Operation::Select(indices) => write!(f, "select {}", join(indices)),
            Operation::SliceApply { size, inner, outer } => {
                write!(f, "slice-apply {} [ {} ]", size, inner)?;
                match outer.unwrapped() {
                    Operation::Identity => Ok(()),
                    _ => write!(f, " {}", outer),
                }
            }
            Operation::Conditional {
                condition,
                then,
                otherwise,
            } => {
                write!(f, "[ {} ] if {}", then, condition)?;
                match otherwise.unwrapped() {
                    Operation::Identity => Ok(()),
                    _ => write!(f, " else [ {} ]", otherwise),
                }
            }
            Operation::Custom(custom) => {
                write!(f, "{}", custom.name)?;
                for param in &custom.params {
                    write!(f, " {}", param)?;
                }
                Ok(())
            }
            Operation::Then(first, next) if first.open_ended() => {
                write!(f, "{} then {}", first, next)
            }
            Operation::Then(first, next) => write!(f, "{} {}", first, next),
            Operation::Validated(inner) | Operation::Memoized { inner, .. } => {
                write!(f, "{}", inner)
            }
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Int(n) => write!(f, "{}", n),
            Param::Number(d) => write!(f, "{}", d),
            Param::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Condition {
    fn is_compound(&self) -> bool {
        matches!(self, Condition::And(..) | Condition::Or(..))
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compound() {
            write!(f, "[ {} ]", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::Compare {
                comparison,
                operands,
            } => write!(f, "{} {}", comparison.keyword(), join(operands)),
            Condition::Modulo { divisors, inner } => {
                write!(f, "mod {} {}", join(divisors), inner)
            }
            Condition::Not(inner) => {
                write!(f, "not ")?;
                inner.fmt_operand(f)
            }
            Condition::And(left, right) => {
                left.fmt_operand(f)?;
                write!(f, " and ")?;
                right.fmt_operand(f)
            }
            Condition::Or(left, right) => {
                left.fmt_operand(f)?;
                write!(f, " or ")?;
                right.fmt_operand(f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_classification() {
        assert_eq!(Param::from_token("-3"), Param::Int(-3));
        assert_eq!(
            Param::from_token("1.5"),
            Param::Number(Decimal::new(15, 1))
        );
        assert_eq!(Param::from_token("1e2"), Param::Number(Decimal::from(100)));
        assert_eq!(Param::from_token("fire"), Param::Text("fire".to_string()));
    }

    #[test]
    fn conditional_followed_by_stage_is_closed_with_then() {
        let conditional = Operation::Conditional {
            condition: Condition::Compare {
                comparison: Comparison::Eq,
                operands: vec![1],
            },
            then: Box::new(Operation::Add(vec![1])),
            otherwise: Box::new(Operation::Reduce(Reduction::Sum)),
        };
        let op = Operation::Then(
            Box::new(conditional.clone()),
            Box::new(Operation::Reduce(Reduction::Sum)),
        );
        assert_eq!(op.to_string(), "[ add 1 ] if eq 1 else [ sum ] then sum");
        assert_eq!(conditional.to_string(), "[ add 1 ] if eq 1 else [ sum ]");
    }

    #[test]
    fn memo_slots_counts_deepest_slot() {
        let op = Operation::Then(
            Box::new(Operation::Sort),
            Box::new(Operation::Memoized {
                slot: 2,
                inner: Box::new(Operation::Memoized {
                    slot: 0,
                    inner: Box::new(Operation::Identity),
                }),
            }),
        );
        assert_eq!(op.memo_slots(), 3);
        assert_eq!(Operation::Identity.memo_slots(), 0);
    }

    #[test]
    fn condition_display_brackets_compound_operands() {
        let cond = Condition::Or(
            Box::new(Condition::Compare {
                comparison: Comparison::Eq,
                operands: vec![1],
            }),
            Box::new(Condition::Not(Box::new(Condition::And(
                Box::new(Condition::Compare {
                    comparison: Comparison::Ge,
                    operands: vec![2],
                }),
                Box::new(Condition::Compare {
                    comparison: Comparison::Le,
                    operands: vec![3],
                }),
            )))),
        );
        assert_eq!(cond.to_string(), "eq 1 or not [ ge 2 and le 3 ]");
    }

    #[test]
    fn operation_display() {
        let op = Operation::Then(
            Box::new(Operation::Scale {
                factors: vec![Decimal::new(15, 1)],
                rounding: Rounding::HalfUp,
            }),
            Box::new(Operation::Bound(vec![(1, 6)])),
        );
        assert_eq!(op.to_string(), "scale r-half-up 1.5 bound 1 6");
    }
}
