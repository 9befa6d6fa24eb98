// lib.rs - Parallel Game of Life engine on a toroidal board
//
// The controller owns the double-buffered grid and drives a fixed worker pool one
// generation at a time, while an image collaborator task loads the initial board
// and stores snapshots as PGM files.

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod event;
pub mod executor;
pub mod grid;
pub mod io;
pub mod params;
pub mod patterns;

use tokio::sync::mpsc;

pub use config::RunConfig;
pub use controller::Controller;
pub use error::{Error, Result};
pub use event::{Cell, Command, Event, State};
pub use grid::{Board, Grid};
pub use io::IoConfig;
pub use params::Params;

/// Runs a whole simulation: loads `{height}x{width}.pgm`, evolves it for
/// `params.turns` turns (or until `'q'`), and writes the final snapshot.
///
/// `events` is dropped, closing the stream, only after the last snapshot has
/// been flushed. Key presses other than `'s'`, `'q'` and `'p'` are ignored.
pub async fn run(
    params: Params,
    io_config: IoConfig,
    events: mpsc::Sender<Event>,
    key_presses: mpsc::Receiver<char>,
) -> Result<()> {
    params.validate()?;

    let (controller, io_channels) = context::wire(&params, events, key_presses);
    let collaborator = tokio::spawn(io::start(params, io_config, io_channels));

    let outcome = Controller::new(params, controller).run().await;
    let io_outcome = collaborator.await?;

    // A failing collaborator only shows up in the controller as a closed channel.
    match (outcome, io_outcome) {
        (_, Err(root)) => Err(root),
        (outcome, Ok(())) => outcome,
    }
}
