//! Poll a directory and print each detected change as a JSON line
//!
//! ```text
//! cargo run --example poll_json -- --path ./data --recursive --interval 500
//! ```

use clap::Parser;
use rust_fsdiff::{Differ, DifferConfig};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "poll_json")]
#[command(about = "Polls a directory tree and prints create/write/remove/rename events as JSON")]
struct Cli {
	/// Directory to track
	#[arg(short, long)]
	path: PathBuf,

	/// Descend into subdirectories
	#[arg(short, long)]
	recursive: bool,

	/// Delay between snapshots in milliseconds
	#[arg(short, long, default_value_t = 1000)]
	interval: u64,

	/// Snapshots to buffer with `update` before each `poll`
	#[arg(short, long, default_value_t = 0)]
	buffer: u32,

	/// Stop after this many polls (0 runs forever)
	#[arg(short, long, default_value_t = 0)]
	count: u64,

	/// Enable verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = if cli.verbose {
		Level::DEBUG
	} else {
		Level::INFO
	};
	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(std::io::stderr)
		.init();

	let mut config = DifferConfig::with_root(cli.path);
	if cli.recursive {
		config = config.recursive();
	}
	let mut differ = Differ::new(config)?;
	let interval = Duration::from_millis(cli.interval);

	let stdout = std::io::stdout();
	let mut polls = 0;
	while cli.count == 0 || polls < cli.count {
		for _ in 0..cli.buffer {
			std::thread::sleep(interval);
			differ.update();
		}
		std::thread::sleep(interval);

		let events = match differ.poll() {
			Ok(events) => events,
			Err(err) if differ.is_failed() => return Err(err.into()),
			Err(err) => {
				warn!("Poll failed, keeping previous snapshot: {}", err);
				continue;
			}
		};
		polls += 1;

		let mut out = stdout.lock();
		for event in &events {
			serde_json::to_writer(&mut out, event)?;
			writeln!(out)?;
		}
	}

	let stats = differ.stats();
	info!(
		"Done after {} polls: {} creates, {} writes, {} removes, {} renames",
		stats.polls, stats.creates, stats.writes, stats.removes, stats.renames
	);
	Ok(())
}
