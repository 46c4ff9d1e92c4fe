/// Parameter parsing for built-in operations.
use rust_decimal::Decimal;

use crate::ast::{parse_decimal, Operation, Reduction, Rounding};
use crate::error::ParseError;
use crate::lexer::AS_BASE;

/// Build a built-in operation from its name and parameter tokens.
///
/// `slice-apply`, `reroll` and custom operations are handled by the
/// dispatcher since they need more than their own parameters.
pub(super) fn build(name: &str, params: &[String]) -> Result<Operation, ParseError> {
    if let Some(basic) = basic(name) {
        return block_wise(name, basic, params);
    }
    match name {
        "add" => Ok(Operation::Add(non_empty(name, ints(name, params)?)?)),
        "set-to" => Ok(Operation::SetTo(non_empty(name, ints(name, params)?)?)),
        "select" => Ok(Operation::Select(non_empty(name, ints(name, params)?)?)),
        "scale" => scale(params),
        "exp" => exp(params),
        "bound" => bound(params),
        other => Err(ParseError::UnknownOperation(other.to_owned())),
    }
}

fn basic(name: &str) -> Option<Operation> {
    match name {
        "id" => Some(Operation::Identity),
        "sort" => Some(Operation::Sort),
        other => Reduction::from_keyword(other).map(Operation::Reduce),
    }
}

/// `sum 3` reads as `slice-apply 3 sum`: the operation runs once per block.
fn block_wise(name: &str, op: Operation, params: &[String]) -> Result<Operation, ParseError> {
    match params {
        [] => Ok(op),
        [size] => Ok(Operation::SliceApply {
            size: slice_size(name, size)?,
            inner: Box::new(op),
            outer: Box::new(Operation::Identity),
        }),
        _ => Err(ParseError::arity(name, "at most one block size", params.len())),
    }
}

pub(super) fn slice_size(op: &str, token: &str) -> Result<usize, ParseError> {
    let size: i64 = token
        .parse()
        .map_err(|_| ParseError::invalid(op, token, "integer"))?;
    if size <= 0 {
        return Err(ParseError::domain(op, format!("block size must be positive, got {}", size)));
    }
    usize::try_from(size).map_err(|_| ParseError::invalid(op, token, "block size"))
}

fn scale(params: &[String]) -> Result<Operation, ParseError> {
    let (rounding, rest) = match params.split_first() {
        Some((first, rest)) => match Rounding::from_tag(first) {
            Some(rounding) => (rounding, rest),
            None => (Rounding::default(), params),
        },
        None => (Rounding::default(), params),
    };
    Ok(Operation::Scale {
        factors: non_empty("scale", decimals("scale", rest)?)?,
        rounding,
    })
}

fn exp(params: &[String]) -> Result<Operation, ParseError> {
    let mut as_base = false;
    let mut rounding = Rounding::default();
    let mut rest = params;

    while let Some((first, tail)) = rest.split_first() {
        if first == AS_BASE {
            as_base = true;
        } else if let Some(tag) = Rounding::from_tag(first) {
            rounding = tag;
        } else {
            break;
        }
        rest = tail;
    }

    Ok(Operation::Exp {
        exponents: non_empty("exp", decimals("exp", rest)?)?,
        as_base,
        rounding,
    })
}

fn bound(params: &[String]) -> Result<Operation, ParseError> {
    let values = ints("bound", params)?;
    if values.is_empty() || values.len() % 2 != 0 {
        return Err(ParseError::arity(
            "bound",
            "a non-zero even number of",
            values.len(),
        ));
    }
    let pairs: Vec<(i64, i64)> = values.chunks_exact(2).map(|p| (p[0], p[1])).collect();
    if let Some((lower, upper)) = pairs.iter().find(|(lower, upper)| lower > upper) {
        return Err(ParseError::domain(
            "bound",
            format!("lower bound {} is greater than upper bound {}", lower, upper),
        ));
    }
    Ok(Operation::Bound(pairs))
}

fn ints(op: &str, params: &[String]) -> Result<Vec<i64>, ParseError> {
    params
        .iter()
        .map(|p| p.parse::<i64>().map_err(|_| ParseError::invalid(op, p, "integer")))
        .collect()
}

fn decimals(op: &str, params: &[String]) -> Result<Vec<Decimal>, ParseError> {
    params
        .iter()
        .map(|p| parse_decimal(p).ok_or_else(|| ParseError::invalid(op, p, "number")))
        .collect()
}

fn non_empty<T>(op: &str, values: Vec<T>) -> Result<Vec<T>, ParseError> {
    if values.is_empty() {
        return Err(ParseError::arity(op, "at least one", 0));
    }
    Ok(values)
}
