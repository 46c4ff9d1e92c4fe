//! Rounded decimal arithmetic for `scale` and `exp`.
//!
//! Products and integral powers are computed exactly with `rust_decimal`
//! before rounding to an integer. Fractional exponents go through `f64`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use dicedist_core::Rounding;

use crate::types::EvalError;

pub fn strategy(rounding: Rounding) -> RoundingStrategy {
    match rounding {
        Rounding::Ceil => RoundingStrategy::ToPositiveInfinity,
        Rounding::Floor => RoundingStrategy::ToNegativeInfinity,
        Rounding::Truncate => RoundingStrategy::ToZero,
        Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        Rounding::HalfDown => RoundingStrategy::MidpointTowardZero,
    }
}

/// Round to an integer and convert, failing if it does not fit in `i64`.
pub fn round_to_int(value: Decimal, rounding: Rounding, op: &'static str) -> Result<i64, EvalError> {
    value
        .round_dp_with_strategy(0, strategy(rounding))
        .to_i64()
        .ok_or(EvalError::Overflow { op })
}

/// `round(value * factor)`
pub fn scale(value: i64, factor: Decimal, rounding: Rounding) -> Result<i64, EvalError> {
    let product = Decimal::from(value)
        .checked_mul(factor)
        .ok_or(EvalError::Overflow { op: "scale" })?;
    round_to_int(product, rounding, "scale")
}

/// `round(base ** exponent)`
pub fn power(base: Decimal, exponent: Decimal, rounding: Rounding) -> Result<i64, EvalError> {
    let raised = if exponent.fract().is_zero() {
        let n = match exponent.to_i64() {
            Some(n) => n,
            None if base.fract().is_zero() && base.abs() <= Decimal::ONE => {
                reduced_exponent(exponent)
            }
            None => return Err(EvalError::Overflow { op: "exp" }),
        };
        integral_power(base, n)?
    } else {
        fractional_power(base, exponent)?
    };
    round_to_int(raised, rounding, "exp")
}

/// An `i64` exponent with the same sign and parity, which is all that
/// matters for bases of 0, 1 and -1.
fn reduced_exponent(exponent: Decimal) -> i64 {
    let magnitude = if (exponent % Decimal::TWO).is_zero() { 2 } else { 1 };
    if exponent.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

fn integral_power(base: Decimal, n: i64) -> Result<Decimal, EvalError> {
    let overflow = EvalError::Overflow { op: "exp" };
    if n < 0 && base.is_zero() {
        return Err(EvalError::Domain {
            op: "exp",
            message: "zero cannot be raised to a negative power".to_string(),
        });
    }

    let mut result = Decimal::ONE;
    let mut square = base;
    let mut remaining = n.unsigned_abs();
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.checked_mul(square).ok_or(overflow.clone())?;
        }
        remaining >>= 1;
        if remaining > 0 {
            square = square.checked_mul(square).ok_or(overflow.clone())?;
        }
    }

    if n < 0 {
        Decimal::ONE.checked_div(result).ok_or(overflow)
    } else {
        Ok(result)
    }
}

fn fractional_power(base: Decimal, exponent: Decimal) -> Result<Decimal, EvalError> {
    let domain = || EvalError::Domain {
        op: "exp",
        message: format!("{} ** {} is not a real number", base, exponent),
    };
    let b = base.to_f64().ok_or_else(domain)?;
    let e = exponent.to_f64().ok_or_else(domain)?;
    let raised = b.powf(e);
    if !raised.is_finite() {
        return Err(domain());
    }
    Decimal::from_f64(raised).ok_or(EvalError::Overflow { op: "exp" })
}
