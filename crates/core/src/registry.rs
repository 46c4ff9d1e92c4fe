//! Custom operation registry.
//!
//! A `Registry` is built once by the host before parsing and passed by
//! reference into [`parse_pipeline`](crate::parse_pipeline). Names are
//! resolved at parse time; the parsed tree holds its own `Arc` to each
//! callable, so the registry can be dropped afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{DiceTuple, Param};
use crate::error::RegistryError;
use crate::lexer;

/// Result of a custom operation: a single value or a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomOutput {
    Int(i64),
    Sequence(Vec<i64>),
}

impl CustomOutput {
    pub fn into_tuple(self) -> DiceTuple {
        match self {
            CustomOutput::Int(n) => vec![n],
            CustomOutput::Sequence(values) => values,
        }
    }
}

impl From<i64> for CustomOutput {
    fn from(n: i64) -> Self {
        CustomOutput::Int(n)
    }
}

impl From<Vec<i64>> for CustomOutput {
    fn from(values: Vec<i64>) -> Self {
        CustomOutput::Sequence(values)
    }
}

/// Failure reported by a custom operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CustomError {
    pub message: String,
}

impl CustomError {
    pub fn new(message: impl Into<String>) -> Self {
        CustomError {
            message: message.into(),
        }
    }
}

/// A named operation supplied by the host.
///
/// Receives the input tuple and the call-site parameters in order.
pub trait CustomOperation: Send + Sync {
    fn call(&self, dice: &[i64], params: &[Param]) -> Result<CustomOutput, CustomError>;
}

impl<F> CustomOperation for F
where
    F: Fn(&[i64], &[Param]) -> Result<CustomOutput, CustomError> + Send + Sync,
{
    fn call(&self, dice: &[i64], params: &[Param]) -> Result<CustomOutput, CustomError> {
        self(dice, params)
    }
}

#[derive(Clone, Default)]
pub struct Registry {
    operations: BTreeMap<String, Arc<dyn CustomOperation>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<O>(&mut self, name: &str, operation: O) -> Result<(), RegistryError>
    where
        O: CustomOperation + 'static,
    {
        self.register_arc(name, Arc::new(operation))
    }

    pub fn register_arc(
        &mut self,
        name: &str,
        operation: Arc<dyn CustomOperation>,
    ) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let splits = name
            .chars()
            .any(|c| c.is_whitespace() || c == '[' || c == ']');
        if lexer::is_reserved(name) || splits {
            return Err(RegistryError::Reserved(name.to_owned()));
        }
        if name.parse::<i64>().is_ok() || crate::ast::parse_decimal(name).is_some() {
            return Err(RegistryError::Numeric(name.to_owned()));
        }
        if self.operations.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_owned()));
        }
        tracing::debug!(name, "registered custom operation");
        self.operations.insert(name.to_owned(), operation);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomOperation>> {
        self.operations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.operations.keys()).finish()
    }
}
