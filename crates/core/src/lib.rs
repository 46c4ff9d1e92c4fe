//! dicedist-core: the operation pipeline language.
//!
//! Turns a flat list of command-line words into one [`Operation`] tree:
//! token normalization, the condition engine (`eq`/`mod`/`not`/`and`/`or`
//! with bracket groups), the recursive stage parser, and the registry of
//! custom operations resolved at parse time.
//!
//! # Public API
//!
//! - [`parse_pipeline()`] -- words to an [`Operation`]
//! - [`parse_condition()`] -- words to a [`Condition`]
//! - [`Registry`] -- named [`CustomOperation`]s
//! - [`ParseError`], [`RegistryError`]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod registry;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{
    Comparison, Condition, CustomOp, DiceTuple, Operation, Param, Reduction, Rounding,
};
pub use error::{ParseError, RegistryError};
pub use lexer::normalize_tokens;
pub use parser::{parse_condition, parse_pipeline, ParseOptions};
pub use registry::{CustomError, CustomOperation, CustomOutput, Registry};
