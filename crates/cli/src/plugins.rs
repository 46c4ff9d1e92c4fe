//! Custom operations defined as named pipelines.
//!
//! Each definition comes from the `[operations]` table of the config file or
//! of a `--custom` file. The pipeline is parsed once at load time, over the
//! built-in vocabulary only, and registered under its name.

use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dicedist_core::{
    parse_pipeline, CustomError, CustomOperation, CustomOutput, Operation, Param, ParseOptions,
    Registry,
};
use dicedist_eval::{Evaluator, MemoCache, MemoStats};

use crate::config::{self, Config, OperationDef};
use crate::error::CliError;

/// A loaded definition and the file it came from.
#[derive(Debug, Clone)]
pub(crate) struct AliasDef {
    pub name: String,
    pub path: PathBuf,
    pub def: OperationDef,
}

/// A parsed pipeline callable by name.
///
/// The memo caches of its stages live with the alias, so repeated calls
/// across the outcome loop share them.
#[derive(Debug)]
pub(crate) struct PipelineAlias {
    name: String,
    pipeline: Operation,
    caches: Mutex<Vec<MemoCache>>,
}

impl PipelineAlias {
    pub(crate) fn parse(
        alias: &AliasDef,
        options: ParseOptions,
        memo_capacity: Option<usize>,
    ) -> Result<Self, CliError> {
        let tokens: Vec<&str> = alias.def.pipeline.split_whitespace().collect();
        let pipeline = parse_pipeline(&tokens, &Registry::new(), options).map_err(|source| {
            CliError::Alias {
                name: alias.name.clone(),
                path: alias.path.clone(),
                source,
            }
        })?;
        let caches = Evaluator::with_memo_capacity(&pipeline, memo_capacity).into_caches();
        Ok(PipelineAlias {
            name: alias.name.clone(),
            pipeline,
            caches: Mutex::new(caches),
        })
    }

    pub(crate) fn memo_stats(&self) -> MemoStats {
        let caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);
        MemoStats::sum(caches.iter())
    }
}

impl CustomOperation for PipelineAlias {
    fn call(&self, dice: &[i64], params: &[Param]) -> Result<CustomOutput, CustomError> {
        if !params.is_empty() {
            return Err(CustomError::new(format!(
                "'{}' takes no parameters, got {}",
                self.name,
                params.len()
            )));
        }
        let mut caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);
        let mut evaluator = Evaluator::from_caches(&self.pipeline, mem::take(&mut *caches));
        let result = evaluator.apply(dice);
        *caches = evaluator.into_caches();
        result
            .map(CustomOutput::Sequence)
            .map_err(|e| CustomError::new(e.to_string()))
    }
}

/// Definitions from the config file followed by each `--custom` file in order.
pub(crate) fn collect(
    config_path: Option<&Path>,
    config: &Config,
    custom_files: &[PathBuf],
) -> Result<Vec<AliasDef>, CliError> {
    let mut aliases: Vec<AliasDef> = Vec::new();
    if let Some(path) = config_path {
        aliases.extend(config.operations.iter().map(|(name, def)| AliasDef {
            name: name.clone(),
            path: path.to_path_buf(),
            def: def.clone(),
        }));
    }
    for path in custom_files {
        let file = config::read_operations(path)?;
        aliases.extend(file.operations.into_iter().map(|(name, def)| AliasDef {
            name,
            path: path.clone(),
            def,
        }));
    }
    Ok(aliases)
}

/// Parse and register every definition. A name defined twice is an error.
pub(crate) fn register(
    registry: &mut Registry,
    aliases: &[AliasDef],
    options: ParseOptions,
    memo_capacity: Option<usize>,
) -> Result<(), CliError> {
    for alias in aliases {
        let operation = PipelineAlias::parse(alias, options, memo_capacity)?;
        registry.register(&alias.name, operation)?;
        tracing::debug!(
            name = %alias.name,
            path = %alias.path.display(),
            pipeline = %alias.def.pipeline,
            "loaded custom operation"
        );
    }
    Ok(())
}
