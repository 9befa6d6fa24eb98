// main.rs - Headless Game of Life runner
// Key presses on stdin steer the run: s saves a snapshot, p pauses/resumes, q quits.

use std::io::Read;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gol::io::encode_pgm;
use gol::{Board, Event, RunConfig, patterns};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "gol", about = "Parallel Game of Life on a toroidal board")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Cmd>,

    #[command(flatten)]
    run: RunConfig,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run a simulation (the default)
    Run(RunConfig),
    /// Write an initial image holding a single pattern
    Seed(SeedArgs),
}

#[derive(Args)]
struct SeedArgs {
    /// Pattern name, e.g. glider or r-pentomino
    #[arg(long)]
    pattern: String,

    /// Column of the pattern's top-left corner
    #[arg(long, default_value_t = 0)]
    x: usize,

    /// Row of the pattern's top-left corner
    #[arg(long, default_value_t = 0)]
    y: usize,

    #[command(flatten)]
    run: RunConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Cmd::Seed(args)) => seed(&args),
        Some(Cmd::Run(config)) => run(config).await,
        None => run(cli.run).await,
    }
}

fn seed(args: &SeedArgs) -> Result<()> {
    let params = args.run.params();
    params.validate()?;
    let pattern = patterns::find(&args.pattern).with_context(|| {
        let known: Vec<_> = patterns::PATTERNS.iter().map(|p| p.name).collect();
        format!("unknown pattern {:?}, expected one of {}", args.pattern, known.join(", "))
    })?;

    let mut board = Board::new(params.image_width, params.image_height);
    pattern.stamp(&mut board, args.x, args.y);

    let io_config = args.run.io_config();
    let path = io_config.input_path(&params.image_name());
    std::fs::create_dir_all(&io_config.input_dir)
        .with_context(|| format!("creating {}", io_config.input_dir.display()))?;
    let pixels: Vec<u8> = board.pixels().collect();
    let bytes = encode_pgm(&path, params.image_width, params.image_height, &pixels)?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("writing {}", path.display()))?;

    log::info!("seeded {} at ({}, {}) into {}", pattern.name, args.x, args.y, path.display());
    Ok(())
}

/// Forwards stdin bytes as key presses until stdin closes or the run ends.
fn spawn_key_reader(keys: mpsc::Sender<char>) {
    std::thread::spawn(move || {
        for byte in std::io::stdin().lock().bytes() {
            let Ok(byte) = byte else { break };
            if keys.blocking_send(char::from(byte)).is_err() {
                break;
            }
        }
    });
}

async fn run(config: RunConfig) -> Result<()> {
    let params = config.params();
    let (events_tx, mut events) = mpsc::channel(1024);
    let (keys_tx, keys) = mpsc::channel(16);
    spawn_key_reader(keys_tx);

    log::info!(
        "running {} turns on {}x{} with {} threads",
        params.turns, params.image_width, params.image_height, params.threads
    );
    let engine = tokio::spawn(gol::run(params, config.io_config(), events_tx, keys));

    while let Some(event) = events.recv().await {
        match event {
            Event::CellFlipped { .. } => log::trace!("{event}"),
            Event::TurnComplete { .. } => log::debug!("{event}"),
            _ => log::info!("{event}"),
        }
    }

    engine.await?.context("simulation failed")
}
