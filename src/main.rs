// SHINJUKU -- ROCKSDB SHINJUKU EXPERIMENTS ON CFS AND GHOST
// A CENTRALISED FIFO OF ROCKSDB REQUESTS, SERVED EITHER RUN-TO-COMPLETION
// (CFS) OR WITH A FIXED PREEMPTION TIME SLICE (GHOST) SO LONG REQUESTS
// CANNOT HEAD-OF-LINE BLOCK SHORT ONES. PREEMPTED REQUESTS GO TO THE BACK.
//
// THIS BINARY PLANS THE SWEEPS AND HANDS EACH ONE TO A RUNNER.
// MEASUREMENT AND REPORTING BELONG TO THE BENCHMARK BINARY.

mod cli;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shinjuku::discipline::{self, Discipline};
use shinjuku::dispatch::{check_arg_count, Dispatcher};
use shinjuku::duration;
use shinjuku::runner::{
    Binaries, DryRunner, ProcessRunner, DEFAULT_AGENT_BIN, DEFAULT_ANTAGONIST_BIN,
    DEFAULT_ROCKSDB_BIN,
};
use shinjuku::scenario::{self, ScenarioBook};
use shinjuku::spec::Overrides;
use shinjuku::workload::PrintFormat;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "shinjuku")]
#[command(about = "SHINJUKU -- ROCKSDB SWEEPS UNDER CFS (RUN-TO-COMPLETION) AND GHOST (PREEMPTIVE)")]
struct Cli {
    // `cfs` AND/OR `ghost`, RUN IN THE ORDER GIVEN
    experiments: Vec<String>,

    // NAMED GHOST WORKLOAD MIX. ONLY CHECKED WHEN `ghost` IS REQUESTED.
    #[arg(long, default_value = scenario::DEFAULT_GHOST_VARIANT)]
    ghost_variant: String,

    // OVERRIDE THE GHOST PREEMPTION TIME SLICE (E.G. 5us)
    #[arg(long, value_parser = duration::parse_arg)]
    time_slice: Option<Duration>,

    // OVERRIDE EVERY EXPERIMENT'S DURATION (E.G. 15s)
    #[arg(long, value_parser = duration::parse_arg)]
    experiment_duration: Option<Duration>,

    // RUN AN ANTAGONIST WITH THIS MANY THREADS NEXT TO EVERY POINT
    #[arg(long)]
    antagonist: Option<u32>,

    // ASK THE BENCHMARK FOR CSV INSTEAD OF PRETTY TABLES
    #[arg(long)]
    csv: bool,

    // PRINT THE COMMANDS INSTEAD OF RUNNING THEM
    #[arg(long)]
    dry_run: bool,

    // CHECK BINARIES AND KERNEL SUPPORT BEFORE DISPATCHING
    #[arg(long)]
    check: bool,

    #[arg(long, env = "SHINJUKU_ROCKSDB_BIN", default_value = DEFAULT_ROCKSDB_BIN)]
    rocksdb_bin: PathBuf,

    #[arg(long, env = "SHINJUKU_AGENT_BIN", default_value = DEFAULT_AGENT_BIN)]
    agent_bin: PathBuf,

    #[arg(long, env = "SHINJUKU_ANTAGONIST_BIN", default_value = DEFAULT_ANTAGONIST_BIN)]
    antagonist_bin: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // FAIL FAST: NOTHING IS BUILT OR RUN UNTIL EVERY ARGUMENT CHECKS OUT
    check_arg_count(cli.experiments.as_slice())?;
    let disciplines = discipline::validate(cli.experiments.as_slice())?;

    let overrides = Overrides {
        time_slice: cli.time_slice,
        experiment_duration: cli.experiment_duration,
        antagonist_threads: cli.antagonist,
        print_format: cli.csv.then_some(PrintFormat::Csv),
    };
    let book = ScenarioBook::for_disciplines(&disciplines, &cli.ghost_variant)?;
    let dispatcher = Dispatcher::new(book).with_overrides(overrides)?;

    let bins = Binaries {
        rocksdb: cli.rocksdb_bin,
        agent: cli.agent_bin,
        antagonist: cli.antagonist_bin,
    };

    println!("SHINJUKU SWEEP");
    println!(
        "EXPERIMENTS:     {}",
        disciplines.iter().map(|d| d.token()).collect::<Vec<_>>().join(", ")
    );
    if disciplines.contains(&Discipline::Preemptive) {
        println!("GHOST VARIANT:   {}", cli.ghost_variant);
    }
    if let Some(slice) = cli.time_slice {
        println!("TIME SLICE:      {} (OVERRIDE)", duration::format(slice));
    }
    if let Some(n) = cli.antagonist {
        println!("ANTAGONIST:      {} THREADS", n);
    }
    println!("MODE:            {}", if cli.dry_run { "DRY RUN" } else { "LIVE" });
    println!();

    if cli.check {
        cli::check::run_check(&disciplines, &bins, cli.antagonist.is_some())?;
    }

    let done = if cli.dry_run {
        let mut runner = DryRunner::new(std::io::stdout().lock(), bins);
        dispatcher.dispatch(&disciplines, &mut runner)?
    } else {
        ctrlc::set_handler(move || {
            SHUTDOWN.store(true, Ordering::Relaxed);
        })?;
        let mut runner = ProcessRunner::new(bins, &SHUTDOWN);
        dispatcher.dispatch(&disciplines, &mut runner)?
    };

    println!("SHINJUKU OUT. {} EXPERIMENT{} COMPLETE.", done, if done == 1 { "" } else { "S" });
    Ok(())
}
