//! Condition evaluator.
//!
//! Conditions are pure functions of `(value, position)`. Both sides of `and`
//! and `or` are always evaluated, so an operand error surfaces even when the
//! other side already decides the result.

use dicedist_core::Condition;

use crate::types::EvalError;

/// Evaluate a condition for the die `value` at position `index`.
pub fn eval_condition(condition: &Condition, value: i64, index: usize) -> Result<bool, EvalError> {
    match condition {
        Condition::Always => Ok(true),
        Condition::Compare {
            comparison,
            operands,
        } => {
            let operand = operand_for(operands, index, comparison.keyword())?;
            Ok(comparison.holds(value, operand))
        }
        Condition::Modulo { divisors, inner } => {
            let divisor = operand_for(divisors, index, "mod")?;
            eval_condition(inner, floor_mod(value, divisor)?, index)
        }
        Condition::Not(inner) => Ok(!eval_condition(inner, value, index)?),
        Condition::And(left, right) => {
            let left = eval_condition(left, value, index)?;
            let right = eval_condition(right, value, index)?;
            Ok(left && right)
        }
        Condition::Or(left, right) => {
            let left = eval_condition(left, value, index)?;
            let right = eval_condition(right, value, index)?;
            Ok(left || right)
        }
    }
}

/// One operand is shared by every position; several are selected by position.
fn operand_for(operands: &[i64], index: usize, op: &'static str) -> Result<i64, EvalError> {
    match operands {
        [shared] => Ok(*shared),
        _ => operands
            .get(index)
            .copied()
            .ok_or(EvalError::MissingOperand {
                op,
                index,
                available: operands.len(),
            }),
    }
}

/// Remainder with the sign of the divisor, so `-1 mod 5` is 4.
pub fn floor_mod(value: i64, divisor: i64) -> Result<i64, EvalError> {
    let r = value
        .checked_rem(divisor)
        .ok_or(EvalError::Overflow { op: "mod" })?;
    if r != 0 && ((r < 0) != (divisor < 0)) {
        Ok(r + divisor)
    } else {
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicedist_core::parse_condition;

    fn condition(text: &str) -> Condition {
        let tokens = dicedist_core::normalize_tokens([text]);
        parse_condition(&tokens).unwrap()
    }

    #[test]
    fn floor_mod_follows_divisor_sign() {
        assert_eq!(floor_mod(7, 5).unwrap(), 2);
        assert_eq!(floor_mod(-1, 5).unwrap(), 4);
        assert_eq!(floor_mod(1, -5).unwrap(), -4);
        assert_eq!(floor_mod(-7, -5).unwrap(), -2);
        assert_eq!(floor_mod(-10, 5).unwrap(), 0);
        assert!(floor_mod(i64::MIN, -1).is_err());
    }

    #[test]
    fn always_holds() {
        assert!(eval_condition(&Condition::Always, -3, 9).unwrap());
    }

    #[test]
    fn per_position_operands() {
        let cond = condition("eq 1 2 3");
        assert!(eval_condition(&cond, 1, 0).unwrap());
        assert!(eval_condition(&cond, 3, 2).unwrap());
        assert!(!eval_condition(&cond, 1, 1).unwrap());
        assert_eq!(
            eval_condition(&cond, 1, 3),
            Err(EvalError::MissingOperand {
                op: "eq",
                index: 3,
                available: 3
            })
        );
    }

    #[test]
    fn per_position_divisors() {
        let cond = condition("mod 2 3 eq 0");
        assert!(eval_condition(&cond, 4, 0).unwrap());
        assert!(!eval_condition(&cond, 4, 1).unwrap());
        assert!(eval_condition(&cond, 9, 1).unwrap());
    }

    #[test]
    fn or_does_not_short_circuit() {
        let cond = condition("eq 5 or eq 1 2");
        assert!(eval_condition(&cond, 5, 2).is_err());
    }
}
