use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fast_summary::config::{EngineConfig, DEFAULT_BLOCK_SIZE, DEFAULT_TABLE_BITS};
use fast_summary::{aggregate_file, Error, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "fast_summary")]
#[command(about = "Per-key min/mean/max over large `<key>;<value>` files")]
#[command(version)]
struct Cli {
    /// Input file, one `<key>;<value>` record per line
    input: PathBuf,

    #[arg(short, long, help = "Write the report here instead of stdout")]
    output: Option<PathBuf>,

    #[arg(short, long, env = "FAST_SUMMARY_WORKERS", default_value_t = num_cpus::get())]
    workers: usize,

    #[arg(long, env = "FAST_SUMMARY_TABLE_BITS", default_value_t = DEFAULT_TABLE_BITS)]
    table_bits: u32,

    #[arg(long, env = "FAST_SUMMARY_BLOCK_SIZE", default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    #[arg(long, help = "Skip records outside the fixed `-?d?d.d` format")]
    strict: bool,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write wall-clock timings per phase and per worker (plain text, not a sampled CPU profile)"
    )]
    cpuprofile: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::new(cli.workers)
        .with_table_bits(cli.table_bits)
        .with_block_size(cli.block_size)
        .with_strict(cli.strict);

    let profile_error = |path: &PathBuf, source: io::Error| Error::Write {
        path: path.clone(),
        source,
    };
    // Fail before scanning if the profile cannot be written.
    let profile_file = match &cli.cpuprofile {
        Some(path) => Some((
            path,
            File::create(path).map_err(|source| profile_error(path, source))?,
        )),
        None => None,
    };

    let run = aggregate_file(&cli.input, &config)?;

    match &cli.output {
        Some(path) => run.summary.write_file(path)?,
        None => run.summary.write_to(BufWriter::new(io::stdout().lock()))?,
    }

    if let Some((path, file)) = profile_file {
        run.profile
            .write_to(BufWriter::new(file))
            .map_err(|source| profile_error(path, source))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
