//! Progress Demo: log lines scrolling above live progress bars.
//!
//! Run in a terminal to see the bars pinned to the bottom rows; pipe the
//! output to see the plain-text fallback.
//!
//! ```text
//! cargo run --example progress_demo -- -v --log-file demo.log.zst
//! ```

use clap::Parser;
use gaugeline::gauge::{progress_bar, ProgressOptions};
use gaugeline::log::{self, LogArgs};
use gaugeline::{SetupError, TermColor};
use std::thread;
use std::time::Duration;

/// Simulate a few concurrent jobs.
#[derive(Parser)]
struct Cli {
    /// Number of concurrent jobs
    #[arg(short, long, default_value_t = 3)]
    jobs: usize,

    /// Steps per job
    #[arg(long, default_value_t = 60)]
    steps: u64,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<(), SetupError> {
    let cli = Cli::parse();
    let _guard = log::init(cli.log.into_config().process("demo"))?;

    let colors = [TermColor::Green, TermColor::Cyan, TermColor::Magenta, TermColor::Yellow];
    let workers: Vec<_> = (0..cli.jobs)
        .map(|job| -> Result<_, SetupError> {
            let options = ProgressOptions::new(format!("job {job}"))
                .total(cli.steps)
                .color(colors[job % colors.len()]);
            let bar = progress_bar(options)?;
            let steps = cli.steps;
            Ok(thread::spawn(move || {
                let bar = bar.finish_on_drop();
                for step in 0..steps {
                    thread::sleep(Duration::from_millis(20 + 15 * job as u64));
                    bar.advance(1);
                    if step % 10 == 0 {
                        tracing::info!(context = %format!("job-{job}"), "reached step {step}");
                    } else {
                        tracing::debug!("step {step}");
                    }
                }
                tracing::info!("job {job} done");
            }))
        })
        .collect::<Result<_, SetupError>>()?;

    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("a worker panicked");
        }
    }
    tracing::info!("all jobs finished");
    Ok(())
}
