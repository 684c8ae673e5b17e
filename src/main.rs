use anyhow::{Context, Result};
use cadence::Pacer;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cadence", about = "Pace a sequence of items with a delay between each step")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Echo each item on a fixed cadence.
    Run {
        /// Items to pace through.
        items: Vec<String>,
        /// Seconds between steps.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
        /// Defer the first step by one interval instead of firing immediately.
        #[arg(long)]
        deferred: bool,
    },
    /// Count down from a number, one tick per interval.
    Countdown {
        /// Starting value.
        from: u32,
        /// Seconds between ticks.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            items,
            interval,
            deferred,
        } => run_items(items, interval, deferred)?,
        Commands::Countdown { from, interval } => run_countdown(from, interval)?,
    }

    Ok(())
}

fn run_items(items: Vec<String>, interval: f64, deferred: bool) -> Result<()> {
    let total = items.len();

    let pacer = Pacer::builder(items)
        .interval(interval)
        .instant(!deferred)
        .on_each(move |item, index, _progress, _interval| {
            println!("[{}/{}] {}", index + 1, total, item);
        })
        .on_complete(|progress, _user_stopped| {
            println!("done: {} items", progress.len());
        })
        .start()
        .context("failed to start pacing")?;

    pacer.run_until_idle();
    Ok(())
}

fn run_countdown(from: u32, interval: f64) -> Result<()> {
    let pacer = Pacer::builder((1..=from).rev())
        .interval(interval)
        .on_each(|tick, _index, _progress, _interval| println!("{tick}..."))
        .on_complete(|_progress, _user_stopped| println!("liftoff!"))
        .start()
        .context("failed to start countdown")?;

    pacer.run_until_idle();
    Ok(())
}
