/// Condition parsing: leaf comparisons, `mod` wrappers, `[ ]` groups and
/// `not` / `and` / `or` at fixed precedence.
///
/// Tokens are first grouped into markers and leaves. Bracket groups are then
/// resolved recursively into single predicates, after which the boolean
/// operators are folded left to right one precedence level at a time.
use crate::ast::{Comparison, Condition};
use crate::error::ParseError;
use crate::lexer::{self, CLOSE_BRACKET, MOD, OPEN_BRACKET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolOp {
    Not,
    And,
    Or,
}

impl BoolOp {
    fn keyword(self) -> &'static str {
        match self {
            BoolOp::Not => "not",
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

#[derive(Debug)]
enum Node {
    Open,
    Close,
    Op(BoolOp),
    Pred(Condition),
}

/// Parse a condition from its tokens. An empty token list is always true.
pub fn parse_condition<S: AsRef<str>>(tokens: &[S]) -> Result<Condition, ParseError> {
    if tokens.is_empty() {
        return Ok(Condition::Always);
    }
    resolve(group(tokens)?)
}

fn group<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Node>, ParseError> {
    let mut nodes = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        let marker = match token {
            OPEN_BRACKET => Some(Node::Open),
            CLOSE_BRACKET => Some(Node::Close),
            "not" => Some(Node::Op(BoolOp::Not)),
            "and" => Some(Node::Op(BoolOp::And)),
            "or" => Some(Node::Op(BoolOp::Or)),
            _ => None,
        };
        match marker {
            Some(marker) => {
                flush(&mut pending, &mut nodes)?;
                nodes.push(marker);
            }
            None => pending.push(token),
        }
    }
    flush(&mut pending, &mut nodes)?;
    Ok(nodes)
}

fn flush(pending: &mut Vec<&str>, nodes: &mut Vec<Node>) -> Result<(), ParseError> {
    if !pending.is_empty() {
        nodes.push(Node::Pred(parse_leaf(pending)?));
        pending.clear();
    }
    Ok(())
}

fn resolve(nodes: Vec<Node>) -> Result<Condition, ParseError> {
    let nodes = resolve_brackets(nodes)?;
    let nodes = resolve_not(nodes)?;
    let nodes = resolve_binary(nodes, BoolOp::And)?;
    let mut nodes = resolve_binary(nodes, BoolOp::Or)?;

    match (nodes.pop(), nodes.is_empty()) {
        (Some(Node::Pred(condition)), true) => Ok(condition),
        (None, _) => Err(ParseError::condition("no comparison given")),
        _ => Err(ParseError::condition(
            "conditions must be joined by 'and' or 'or'",
        )),
    }
}

fn resolve_brackets(nodes: Vec<Node>) -> Result<Vec<Node>, ParseError> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter();

    while let Some(node) = iter.next() {
        match node {
            Node::Open => {
                let mut depth = 1usize;
                let mut inner = Vec::new();
                loop {
                    match iter.next() {
                        None => return Err(ParseError::BracketMismatch("condition")),
                        Some(Node::Open) => {
                            depth += 1;
                            inner.push(Node::Open);
                        }
                        Some(Node::Close) => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            inner.push(Node::Close);
                        }
                        Some(other) => inner.push(other),
                    }
                }
                if inner.is_empty() {
                    return Err(ParseError::EmptyBrackets);
                }
                out.push(Node::Pred(resolve(inner)?));
            }
            Node::Close => return Err(ParseError::BracketMismatch("condition")),
            other => out.push(other),
        }
    }
    Ok(out)
}

fn resolve_not(nodes: Vec<Node>) -> Result<Vec<Node>, ParseError> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter();

    while let Some(node) = iter.next() {
        match node {
            Node::Op(BoolOp::Not) => match iter.next() {
                Some(Node::Pred(inner)) => out.push(Node::Pred(Condition::Not(Box::new(inner)))),
                Some(Node::Op(BoolOp::Not)) => {
                    return Err(ParseError::condition("'not' cannot be followed by 'not'"))
                }
                _ => return Err(ParseError::condition("'not' must be followed by a comparison")),
            },
            other => out.push(other),
        }
    }
    Ok(out)
}

fn resolve_binary(nodes: Vec<Node>, op: BoolOp) -> Result<Vec<Node>, ParseError> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter();

    while let Some(node) = iter.next() {
        match node {
            Node::Op(found) if found == op => {
                let left = match out.pop() {
                    Some(Node::Pred(left)) => left,
                    _ => {
                        return Err(ParseError::condition(format!(
                            "'{}' needs a comparison on its left",
                            op.keyword()
                        )))
                    }
                };
                let right = match iter.next() {
                    Some(Node::Pred(right)) => right,
                    _ => {
                        return Err(ParseError::condition(format!(
                            "'{}' needs a comparison on its right",
                            op.keyword()
                        )))
                    }
                };
                let combined = match op {
                    BoolOp::And => Condition::And(Box::new(left), Box::new(right)),
                    _ => Condition::Or(Box::new(left), Box::new(right)),
                };
                out.push(Node::Pred(combined));
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn parse_leaf(tokens: &[&str]) -> Result<Condition, ParseError> {
    let Some((&kind, rest)) = tokens.split_first() else {
        return Err(ParseError::condition("no comparison given"));
    };

    if kind == MOD {
        let count = rest
            .iter()
            .take_while(|t| !lexer::is_compare_keyword(t))
            .count();
        if count == 0 {
            return Err(ParseError::condition("'mod' requires at least one divisor"));
        }
        let divisors = parse_ints(MOD, &rest[..count])?;
        if divisors.contains(&0) {
            return Err(ParseError::condition("'mod' divisor must not be zero"));
        }
        let inner = &rest[count..];
        if inner.is_empty() {
            return Err(ParseError::condition("'mod' must be followed by a comparison"));
        }
        return Ok(Condition::Modulo {
            divisors,
            inner: Box::new(parse_leaf(inner)?),
        });
    }

    let comparison =
        Comparison::from_keyword(kind).ok_or_else(|| ParseError::UnknownComparison(kind.to_owned()))?;
    if rest.is_empty() {
        return Err(ParseError::condition(format!(
            "'{}' requires at least one operand",
            kind
        )));
    }
    Ok(Condition::Compare {
        comparison,
        operands: parse_ints(kind, rest)?,
    })
}

fn parse_ints(op: &str, tokens: &[&str]) -> Result<Vec<i64>, ParseError> {
    tokens
        .iter()
        .map(|t| {
            t.parse::<i64>()
                .map_err(|_| ParseError::invalid(op, t, "integer"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Condition, ParseError> {
        let tokens = lexer::normalize_tokens([text]);
        parse_condition(&tokens)
    }

    fn cmp(comparison: Comparison, operands: &[i64]) -> Condition {
        Condition::Compare {
            comparison,
            operands: operands.to_vec(),
        }
    }

    #[test]
    fn empty_is_always() {
        let empty: [&str; 0] = [];
        assert_eq!(parse_condition(&empty).unwrap(), Condition::Always);
    }

    #[test]
    fn single_leaf_with_per_position_operands() {
        assert_eq!(parse("ge 1 2 3").unwrap(), cmp(Comparison::Ge, &[1, 2, 3]));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let got = parse("eq 1 or eq 2 and eq 3").unwrap();
        let want = Condition::Or(
            Box::new(cmp(Comparison::Eq, &[1])),
            Box::new(Condition::And(
                Box::new(cmp(Comparison::Eq, &[2])),
                Box::new(cmp(Comparison::Eq, &[3])),
            )),
        );
        assert_eq!(got, want);
    }

    #[test]
    fn not_binds_tightest() {
        let got = parse("not eq 1 and eq 2").unwrap();
        let want = Condition::And(
            Box::new(Condition::Not(Box::new(cmp(Comparison::Eq, &[1])))),
            Box::new(cmp(Comparison::Eq, &[2])),
        );
        assert_eq!(got, want);
    }

    #[test]
    fn brackets_override_precedence() {
        let got = parse("[eq 1 or eq 2] and eq 3").unwrap();
        let want = Condition::And(
            Box::new(Condition::Or(
                Box::new(cmp(Comparison::Eq, &[1])),
                Box::new(cmp(Comparison::Eq, &[2])),
            )),
            Box::new(cmp(Comparison::Eq, &[3])),
        );
        assert_eq!(got, want);
    }

    #[test]
    fn nested_mod() {
        let got = parse("mod 10 mod 3 eq 1").unwrap();
        let want = Condition::Modulo {
            divisors: vec![10],
            inner: Box::new(Condition::Modulo {
                divisors: vec![3],
                inner: Box::new(cmp(Comparison::Eq, &[1])),
            }),
        };
        assert_eq!(got, want);
    }

    #[test]
    fn malformed_conditions_rejected() {
        for text in [
            "eq",
            "mod",
            "mod 3",
            "mod eq 1",
            "mod 0 eq 1",
            "eq one",
            "between 1 2",
            "eq 1 and",
            "or eq 1",
            "not",
            "not not eq 1",
            "eq 1 [eq 2]",
            "[eq 1",
            "eq 1]",
            "[]",
            "eq 1 and []",
            "mod 2 not eq 1",
        ] {
            assert!(parse(text).is_err(), "'{text}' should not parse");
        }
    }

    #[test]
    fn unknown_comparison_is_named() {
        assert_eq!(
            parse("near 3"),
            Err(ParseError::UnknownComparison("near".to_string()))
        );
    }
}
