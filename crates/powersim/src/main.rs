use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use powersim::commands::DEFAULT_CHUNK_SIZE;
use powersim::{
    OutputDirectory, RunOptions, aggregate_results, build_grid, init_logging, load_config,
    run_grid, simulate,
};
use powersim_core::{AggregateOptions, ExecutionStrategy};

#[derive(Parser, Debug)]
#[command(name = "powersim")]
#[command(about = "Monte Carlo power and bias simulation for pre/post treatment designs")]
struct Cli {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the simulation grid and write it to the output directory
    Grid {
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        out: OutArgs,
    },
    /// Run every grid row that has no result yet
    Run {
        #[command(flatten)]
        out: OutArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Summarize results into bias and power per condition
    Aggregate {
        #[command(flatten)]
        out: OutArgs,
        #[command(flatten)]
        aggregate: AggregateArgs,
    },
    /// Grid, run and aggregate in one go
    Simulate {
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        out: OutArgs,
        #[command(flatten)]
        run: RunArgs,
        #[command(flatten)]
        aggregate: AggregateArgs,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Study config (YAML); the default design is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct OutArgs {
    /// Output directory for grid, results, summary and log
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Worker threads (default: one per core)
    #[arg(short, long, conflicts_with = "sequential")]
    workers: Option<usize>,

    /// Run rows one after another on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Rows run and appended per batch
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        let strategy = if self.sequential {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel {
                workers: self.workers,
            }
        };
        RunOptions {
            strategy,
            chunk_size: self.chunk_size,
        }
    }
}

#[derive(Args, Debug)]
struct AggregateArgs {
    /// Leave out results whose design was flagged singular
    #[arg(long)]
    exclude_singular: bool,
}

impl AggregateArgs {
    fn options(&self) -> AggregateOptions {
        AggregateOptions {
            exclude_singular: self.exclude_singular,
            ..Default::default()
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let out_dir = match &cli.command {
        Command::Grid { out, .. }
        | Command::Run { out, .. }
        | Command::Aggregate { out, .. }
        | Command::Simulate { out, .. } => out.out.clone(),
    };
    init_logging(Some(&out_dir), &cli.log_level)?;
    let out = OutputDirectory::new(out_dir);

    match cli.command {
        Command::Grid { config, .. } => {
            let config = load_config(config.config.as_deref())?;
            build_grid(&config, &out)?;
        }
        Command::Run { run, .. } => {
            let report = run_grid(&out, run.options())?;
            tracing::info!(
                total = report.total,
                completed = report.completed,
                skipped = report.skipped,
                "run step done"
            );
        }
        Command::Aggregate { aggregate, .. } => {
            aggregate_results(&out, &aggregate.options())?;
        }
        Command::Simulate {
            config,
            run,
            aggregate,
            ..
        } => {
            let config = load_config(config.config.as_deref())?;
            // Worker settings from the command line take precedence
            let run_options = if run.sequential || run.workers.is_some() {
                run.options()
            } else {
                RunOptions {
                    strategy: config.strategy(),
                    chunk_size: run.chunk_size,
                }
            };
            simulate(&config, &out, run_options, &aggregate.options())?;
        }
    }

    tracing::info!("powersim finished");
    Ok(())
}
