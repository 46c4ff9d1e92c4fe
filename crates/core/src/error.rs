/// A grammar, parameter or domain error found while parsing a pipeline.
///
/// All of these are raised before any dice are processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("pipeline is empty")]
    EmptyPipeline,

    #[error("operation '{0}' is not valid")]
    UnknownOperation(String),

    #[error("comparison '{0}' is not valid")]
    UnknownComparison(String),

    #[error("bracket mismatch in {0}")]
    BracketMismatch(&'static str),

    #[error("no contents inside brackets")]
    EmptyBrackets,

    #[error("operation '{0}' does not accept an if-block")]
    NotIfAble(String),

    #[error("operation '{0}' does not accept an else-branch")]
    NotElseAble(String),

    #[error("'{0}' cannot start an else-branch")]
    InvalidElse(String),

    #[error("'else' must be followed by an operation")]
    MissingElse,

    #[error("'{op}' expects {expected}, got {got} parameter(s)")]
    Arity {
        op: String,
        expected: &'static str,
        got: usize,
    },

    #[error("'{op}' parameter '{token}' is not a valid {kind}")]
    InvalidParameter {
        op: String,
        token: String,
        kind: &'static str,
    },

    #[error("'{op}': {message}")]
    Domain { op: String, message: String },

    #[error("malformed condition: {0}")]
    Condition(String),
}

impl ParseError {
    pub(crate) fn arity(op: &str, expected: &'static str, got: usize) -> Self {
        ParseError::Arity {
            op: op.to_owned(),
            expected,
            got,
        }
    }

    pub(crate) fn invalid(op: &str, token: &str, kind: &'static str) -> Self {
        ParseError::InvalidParameter {
            op: op.to_owned(),
            token: token.to_owned(),
            kind,
        }
    }

    pub(crate) fn domain(op: &str, message: impl Into<String>) -> Self {
        ParseError::Domain {
            op: op.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn condition(message: impl Into<String>) -> Self {
        ParseError::Condition(message.into())
    }
}

/// Errors raised while populating a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("'{0}' is reserved by the pipeline language")]
    Reserved(String),

    #[error("'{0}' reads as a number and cannot name an operation")]
    Numeric(String),

    #[error("custom operation '{0}' is already registered")]
    Duplicate(String),

    #[error("custom operation name must not be empty")]
    EmptyName,
}
