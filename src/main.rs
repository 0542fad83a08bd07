//! CLI entry point for the booga driver.
//!
//! Builds one driver instance from configuration, runs a command against it, and prints the
//! statistics report the way the driver's procfs entry would show it.
//!
//! # Usage
//!
//! Read 40 bytes from minor 1:
//! ```bash
//! booga read --minor 1 --count 40
//! ```
//!
//! Write to minor 0 (minor 3 terminates the writer unless `[terminate] mode = "disabled"`):
//! ```bash
//! booga write --minor 0 "hello"
//! ```
//!
//! Hammer all minors from several threads (Ctrl-C interrupts the workers):
//! ```bash
//! booga stress --threads 8 --reads 10000 --length 64
//! ```

use anyhow::Result;
use booga::config::BoogaConfig;
use booga::logging;
use booga::{BoogaError, Caller, DriverFacade, Interrupt, TERMINATE_MINOR};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "booga")]
#[command(about = "Multi-minor booga pseudo-device driver", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/booga.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a minor and read from it once
    Read {
        /// Minor to open
        #[arg(long, default_value = "0")]
        minor: u32,

        /// Number of bytes to read
        #[arg(long, default_value = "64")]
        count: usize,
    },

    /// Open a minor and write to it once
    Write {
        /// Minor to open
        #[arg(long, default_value = "0")]
        minor: u32,

        /// Bytes to write
        data: String,
    },

    /// Read and write concurrently from several workers
    Stress {
        /// Number of worker threads
        #[arg(long, default_value = "4")]
        threads: usize,

        /// Reads per worker
        #[arg(long, default_value = "1000")]
        reads: usize,

        /// Bytes per read
        #[arg(long, default_value = "32")]
        length: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BoogaConfig::load_from(path)?,
        None => BoogaConfig::load()?,
    };
    config.validate()?;
    logging::init(config.logging_config()?)?;

    let driver = Arc::new(config.build_driver()?);
    let caller = Caller::current();

    match cli.command {
        Commands::Read { minor, count } => {
            let handle = driver.open_device(&caller, minor)?;
            let result = driver.read_device(&caller, handle, count);
            driver.close_device(handle);
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&result?)?;
            writeln!(stdout)?;
        }
        Commands::Write { minor, data } => {
            let handle = driver.open_device(&caller, minor)?;
            let result = driver.write_device(&caller, handle, data.as_bytes());
            driver.close_device(handle);
            println!("accepted {} bytes", result?);
        }
        Commands::Stress {
            threads,
            reads,
            length,
        } => stress(Arc::clone(&driver), threads, reads, length).await?,
    }

    let stats = driver.snapshot(&caller)?;
    if cli.json {
        println!("{}", driver.renderer().render_json(&stats)?);
    } else {
        print!("{}", driver.renderer().render(&stats));
    }
    Ok(())
}

async fn stress(driver: Arc<DriverFacade>, threads: usize, reads: usize, length: usize) -> Result<()> {
    let interrupt = Interrupt::new();
    let watcher = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping workers");
                interrupt.raise();
            }
        })
    };

    let workers: Vec<_> = (0..threads)
        .map(|worker| {
            let driver = Arc::clone(&driver);
            let caller = Caller::with_interrupt(std::process::id(), interrupt.clone());
            tokio::task::spawn_blocking(move || run_worker(&driver, &caller, worker, reads, length))
        })
        .collect();

    let mut completed = 0;
    for worker in workers {
        completed += worker.await??;
    }
    watcher.abort();

    println!("{completed} reads completed by {threads} workers");
    Ok(())
}

/// One worker: open a minor, alternate reads and writes, close. Returns completed reads.
fn run_worker(
    driver: &DriverFacade,
    caller: &Caller,
    worker: usize,
    reads: usize,
    length: usize,
) -> std::result::Result<usize, BoogaError> {
    let minor = worker % driver.device_count();
    let handle = match driver.open_device(caller, minor as u32) {
        Ok(handle) => handle,
        Err(BoogaError::Restart) => return Ok(0),
        Err(err) => return Err(err),
    };

    let mut buf = vec![0u8; length];
    let mut completed = 0;
    let outcome = loop {
        if completed == reads || caller.interrupt().is_raised() {
            break Ok(());
        }
        if let Err(err) = driver.read_device_into(caller, handle, &mut buf) {
            break Err(err);
        }
        completed += 1;
        // Writes to the terminate minor would end the whole process.
        if minor != TERMINATE_MINOR {
            if let Err(err) = driver.write_device(caller, handle, &buf) {
                break Err(err);
            }
        }
    };
    driver.close_device(handle);

    match outcome {
        Ok(()) | Err(BoogaError::Restart) => {
            tracing::debug!(worker, minor, completed, "worker finished");
            Ok(completed)
        }
        Err(err) => Err(err),
    }
}
