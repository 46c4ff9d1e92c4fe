/// Recursive-descent parser from pipeline tokens to an [`Operation`] tree.
///
/// Each stage is an operation name with its parameters (or a bracketed
/// sub-pipeline), an optional `if ... [else ...] [then]` block, and the rest
/// of the tokens parsed as the next stage. `slice-apply` is the exception:
/// it consumes the remaining tokens itself as its inner and outer operations.
use crate::ast::{Condition, CustomOp, Operation, Param};
use crate::error::ParseError;
use crate::lexer::{self, CLOSE_BRACKET, ELSE, ELSE_ABLE, IF, IF_ABLE, OPEN_BRACKET, THEN};
use crate::registry::Registry;

mod condition;
mod operations;

pub use condition::parse_condition;

/// Wrappers applied around every parsed pipeline level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Attach stage context to evaluation errors.
    pub validate: bool,
    /// Cache results of every level except the outermost, keyed by input tuple.
    pub memoize: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            validate: true,
            memoize: false,
        }
    }
}

/// Parse raw pipeline words into a single operation.
///
/// Words are normalized first, so brackets may be attached to other text.
pub fn parse_pipeline<S: AsRef<str>>(
    raw: &[S],
    registry: &Registry,
    options: ParseOptions,
) -> Result<Operation, ParseError> {
    let tokens = lexer::normalize_tokens(raw);
    let mut parser = Parser {
        registry,
        options,
        next_slot: 0,
    };
    let op = parser.pipeline(&tokens, true)?;
    tracing::debug!(pipeline = %op, memo_slots = parser.next_slot, "parsed pipeline");
    Ok(op)
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'r> {
    registry: &'r Registry,
    options: ParseOptions,
    next_slot: usize,
}

type Rest<'t> = &'t [String];

impl<'r> Parser<'r> {
    fn pipeline(&mut self, tokens: &[String], top: bool) -> Result<Operation, ParseError> {
        if tokens.is_empty() {
            return Err(ParseError::EmptyPipeline);
        }
        let (current, rest) = self.stage(tokens)?;
        let composed = if rest.is_empty() {
            current
        } else {
            let next = self.pipeline(rest, false)?;
            Operation::Then(Box::new(current), Box::new(next))
        };
        Ok(self.wrap(composed, top))
    }

    fn wrap(&mut self, op: Operation, top: bool) -> Operation {
        let mut op = op;
        if self.options.validate {
            op = Operation::Validated(Box::new(op));
        }
        if self.options.memoize && !top {
            let slot = self.next_slot;
            self.next_slot += 1;
            op = Operation::Memoized {
                slot,
                inner: Box::new(op),
            };
        }
        op
    }

    /// Parse one stage and return it with the tokens that follow it.
    fn stage<'t>(&mut self, tokens: &'t [String]) -> Result<(Operation, Rest<'t>), ParseError> {
        let Some((head, tail)) = tokens.split_first() else {
            return Err(ParseError::EmptyPipeline);
        };

        if head == OPEN_BRACKET {
            let close = matching_bracket(tokens)?;
            let inner = &tokens[1..close];
            if inner.is_empty() {
                return Err(ParseError::EmptyBrackets);
            }
            let group = self.pipeline(inner, false)?;
            let rest = &tokens[close + 1..];
            // Bracket groups accept any if/else block.
            return match rest.split_first() {
                Some((word, after)) if word == IF => {
                    let (condition, otherwise, rest) = self.cond_block(after)?;
                    Ok((conditional(group, condition, otherwise), rest))
                }
                _ => Ok((group, rest)),
            };
        }
        if head == CLOSE_BRACKET {
            return Err(ParseError::BracketMismatch("pipeline"));
        }
        if lexer::is_logic_keyword(head) {
            return Err(ParseError::UnknownOperation(head.clone()));
        }

        let name = head.as_str();
        let count = tail.iter().take_while(|t| !self.stops_params(t)).count();
        let (params, rest) = tail.split_at(count);
        let has_if = rest.first().is_some_and(|t| t == IF);
        tracing::trace!(op = name, ?params, "parsing stage");

        if name == "slice-apply" {
            if has_if {
                return Err(ParseError::NotIfAble(name.to_owned()));
            }
            return self.slice_apply(params, rest);
        }

        if let Some(callable) = self.registry.get(name) {
            if has_if {
                return Err(ParseError::NotIfAble(name.to_owned()));
            }
            let custom = CustomOp {
                name: name.to_owned(),
                params: params.iter().map(|p| Param::from_token(p)).collect(),
                callable: callable.clone(),
            };
            return Ok((Operation::Custom(custom), rest));
        }

        if name == "reroll" {
            if !params.is_empty() {
                return Err(ParseError::arity(name, "no", params.len()));
            }
            if !has_if {
                return Ok((Operation::Reroll(Condition::Always), rest));
            }
            let (condition, rest) = self.reroll_block(&rest[1..])?;
            return Ok((Operation::Reroll(condition), rest));
        }

        let op = operations::build(name, params)?;
        if !has_if {
            return Ok((op, rest));
        }
        if !IF_ABLE.contains(&name) {
            return Err(ParseError::NotIfAble(name.to_owned()));
        }
        let (condition, otherwise, rest) = self.cond_block(&rest[1..])?;
        if otherwise.is_some() && !ELSE_ABLE.contains(&name) {
            return Err(ParseError::NotElseAble(name.to_owned()));
        }
        Ok((conditional(op, condition, otherwise), rest))
    }

    fn stops_params(&self, token: &str) -> bool {
        lexer::is_builtin_operation(token)
            || lexer::is_logic_keyword(token)
            || lexer::is_bracket(token)
            || self.registry.contains(token)
    }

    /// Parse the tokens after `if`: the condition, an optional else-branch and
    /// an optional closing `then`.
    fn cond_block<'t>(
        &mut self,
        tokens: &'t [String],
    ) -> Result<(Condition, Option<Operation>, Rest<'t>), ParseError> {
        let end = find_top_level(tokens, |t| t == ELSE || t == THEN);
        let condition = parse_condition(&tokens[..end])?;
        let rest = &tokens[end..];

        let (otherwise, rest) = match rest.split_first() {
            Some((word, after)) if word == ELSE => {
                let end = find_top_level(after, |t| t == THEN);
                let branch = &after[..end];
                let Some(first) = branch.first() else {
                    return Err(ParseError::MissingElse);
                };
                if first != OPEN_BRACKET && !ELSE_ABLE.contains(&first.as_str()) {
                    return Err(ParseError::InvalidElse(first.clone()));
                }
                (Some(self.pipeline(branch, false)?), &after[end..])
            }
            _ => (None, rest),
        };

        Ok((condition, otherwise, skip_then(rest)))
    }

    fn reroll_block<'t>(&mut self, tokens: &'t [String]) -> Result<(Condition, Rest<'t>), ParseError> {
        let (condition, otherwise, rest) = self.cond_block(tokens)?;
        if otherwise.is_some() {
            return Err(ParseError::NotElseAble("reroll".to_owned()));
        }
        Ok((condition, rest))
    }

    fn slice_apply<'t>(
        &mut self,
        params: &[String],
        rest: Rest<'t>,
    ) -> Result<(Operation, Rest<'t>), ParseError> {
        let [size] = params else {
            return Err(ParseError::arity("slice-apply", "exactly one", params.len()));
        };
        let size = operations::slice_size("slice-apply", size)?;
        if rest.is_empty() {
            return Err(ParseError::domain("slice-apply", "missing inner operation"));
        }

        let (inner, after) = self.stage(rest)?;
        let inner = self.wrap(inner, false);
        let outer = if after.is_empty() {
            Operation::Identity
        } else {
            self.pipeline(after, false)?
        };

        let op = Operation::SliceApply {
            size,
            inner: Box::new(inner),
            outer: Box::new(outer),
        };
        Ok((op, &rest[rest.len()..]))
    }
}

fn conditional(then: Operation, condition: Condition, otherwise: Option<Operation>) -> Operation {
    Operation::Conditional {
        condition,
        then: Box::new(then),
        otherwise: Box::new(otherwise.unwrap_or(Operation::Identity)),
    }
}

fn skip_then(tokens: &[String]) -> &[String] {
    match tokens.split_first() {
        Some((word, rest)) if word == THEN => rest,
        _ => tokens,
    }
}

/// Index of the `]` closing the `[` at `tokens[0]`.
fn matching_bracket(tokens: &[String]) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        if token == OPEN_BRACKET {
            depth += 1;
        } else if token == CLOSE_BRACKET {
            depth = depth
                .checked_sub(1)
                .ok_or(ParseError::BracketMismatch("pipeline"))?;
            if depth == 0 {
                return Ok(index);
            }
        }
    }
    Err(ParseError::BracketMismatch("pipeline"))
}

/// First index outside brackets where `is_end` holds, or `tokens.len()`.
fn find_top_level(tokens: &[String], is_end: impl Fn(&str) -> bool) -> usize {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        if token == OPEN_BRACKET {
            depth += 1;
        } else if token == CLOSE_BRACKET {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && is_end(token) {
            return index;
        }
    }
    tokens.len()
}
