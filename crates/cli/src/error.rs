use std::path::PathBuf;

use dicedist_core::{ParseError, RegistryError};
use dicedist_eval::{DiceError, EvalError};
use dicedist_storage::StorageError;

/// Everything that can end a `dicedist` run.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse '{}': {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("custom operation '{name}' in '{}': {source}", path.display())]
    Alias {
        name: String,
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("invalid pipeline: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("invalid dice: {0}")]
    Dice(#[from] DiceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Flag combinations clap cannot express.
    #[error("{0}")]
    Usage(String),
}
