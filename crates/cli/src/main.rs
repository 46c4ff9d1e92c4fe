mod config;
mod error;
mod plugins;
mod pool;
mod render;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use dicedist_core::{parse_pipeline, ParseOptions, Registry};
use dicedist_eval::{Combine, Distribution, Enumerate, Evaluator, Simulate};

use crate::config::{Config, SortOrder};
use crate::error::CliError;
use crate::pool::DiceArgs;
use crate::render::RenderOptions;

/// Distribution of dice roll outcomes after an operation pipeline.
#[derive(Debug, Parser)]
#[command(
    name = "dicedist",
    version,
    about = "Distribution of dice roll outcomes after an operation pipeline",
    allow_negative_numbers = true
)]
struct Cli {
    #[command(flatten)]
    dice: DiceArgs,

    /// Operation pipeline applied to every roll, e.g. `sort select -1 -2 sum`
    #[arg(long, num_args = 1.., default_value = "id")]
    apply: Vec<String>,

    /// Cache results of every stage after the first, keyed by its input
    #[arg(long)]
    memorize_input: bool,

    /// Entries kept per stage cache before it is cleared
    #[arg(long, requires = "memorize_input")]
    memo_capacity: Option<usize>,

    /// Skip per-stage diagnostics on evaluation errors
    #[arg(long)]
    skip_checks: bool,

    /// TOML files defining named operations
    #[arg(long, num_args = 1..)]
    custom: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    // ── Display ──────────────────────────────────────────────────────────────
    /// Bar characters per percent (0 hides bars)
    #[arg(long)]
    bar_size: Option<usize>,

    /// Character repeated to draw bars
    #[arg(long)]
    bar_char: Option<String>,

    /// Text printed before each bar
    #[arg(long)]
    bar_prefix: Option<String>,

    /// Order of output lines
    #[arg(long, value_enum)]
    sort: Option<SortOrder>,

    /// Decimal places of percentages and fractional counts
    #[arg(long, visible_alias = "rdp", value_parser = pool::positive)]
    result_decimal_place: Option<usize>,

    /// Print counts instead of percentages
    #[arg(long)]
    show_counts: bool,

    /// Do not print the distribution
    #[arg(long)]
    no_output: bool,

    // ── Outcomes ─────────────────────────────────────────────────────────────
    /// Sample this many random rolls instead of enumerating every roll
    #[arg(
        long = "simulate",
        visible_alias = "simulate-num-iterations",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    simulate: Option<u64>,

    /// Random seed for --simulate
    #[arg(long, requires = "simulate")]
    seed: Option<u64>,

    /// Use the product of saved distributions as outcomes
    #[arg(long, num_args = 1..)]
    load: Vec<PathBuf>,

    /// Save the resulting distribution as JSON
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the resolved arguments and pipeline before computing
    #[arg(long)]
    show_args: bool,

    /// Log debug events to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Built-in defaults, then the config file, then flags.
    fn render_options(&self, config: &Config) -> RenderOptions {
        let mut options = RenderOptions::from_config(&config.display);
        if let Some(n) = self.bar_size {
            options.bar_size = n;
        }
        if let Some(c) = &self.bar_char {
            options.bar_char = c.clone();
        }
        if let Some(p) = &self.bar_prefix {
            options.bar_prefix = p.clone();
        }
        if let Some(sort) = self.sort {
            options.sort = sort;
        }
        if let Some(dp) = self.result_decimal_place {
            options.decimal_places = dp;
        }
        options.show_counts |= self.show_counts;
        options
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => config::read_config(path)?,
        None => Config::default(),
    };
    let options = ParseOptions {
        validate: !cli.skip_checks,
        memoize: cli.memorize_input,
    };

    let aliases = plugins::collect(cli.config.as_deref(), &config, &cli.custom)?;
    let mut registry = Registry::new();
    plugins::register(&mut registry, &aliases, options, cli.memo_capacity)?;

    let pipeline = parse_pipeline(&cli.apply, &registry, options)?;

    if cli.show_args {
        println!("{:#?}", cli);
        for alias in &aliases {
            match &alias.def.description {
                Some(text) => println!("custom: {} = {} ({})", alias.name, alias.def.pipeline, text),
                None => println!("custom: {} = {}", alias.name, alias.def.pipeline),
            }
        }
        println!("pipeline: {}", pipeline);
    }

    let mut evaluator = Evaluator::with_memo_capacity(&pipeline, cli.memo_capacity);
    let distribution = if cli.load.is_empty() {
        let pool = cli.dice.pool()?;
        match cli.simulate {
            Some(samples) => {
                let rng = match cli.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                tracing::debug!(samples, dice = pool.len(), "simulating rolls");
                Distribution::tally(&mut evaluator, Simulate::new(&pool, rng, samples))?
            }
            None => {
                tracing::debug!(outcomes = ?pool.outcome_count(), dice = pool.len(), "enumerating rolls");
                Distribution::tally(&mut evaluator, Enumerate::new(&pool))?
            }
        }
    } else {
        if cli.dice.is_set() || cli.simulate.is_some() {
            tracing::warn!("--load given; dice and simulation flags are ignored");
        }
        let loaded = dicedist_storage::load_all(&cli.load)?;
        Distribution::tally(&mut evaluator, Combine::new(&loaded))?
    };

    if let Some(path) = &cli.save {
        dicedist_storage::save(&distribution, path)?;
    }

    if !cli.no_output {
        for line in render::render(&distribution, &cli.render_options(&config)) {
            println!("{}", line);
        }
    }
    Ok(())
}
