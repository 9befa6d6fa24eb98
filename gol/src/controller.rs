// controller.rs - The turn loop: polls the report timer and key presses, runs
// generations, and reports everything on the event stream

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::context::{ControllerChannels, IoCommand};
use crate::error::{Error, Result};
use crate::event::{Command, Event, State};
use crate::executor::TurnExecutor;
use crate::grid::Grid;
use crate::params::Params;

pub const REPORT_PERIOD: Duration = Duration::from_secs(2);

/// What the loop does on one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Report,
    Command(Command),
    Advance,
}

/// Waits for the timer or a recognised key, whichever is ready first. When both
/// are ready the choice is random, so neither source can starve the other.
async fn pending_signal(ticker: &mut Interval, keys: &mut mpsc::Receiver<char>) -> Signal {
    loop {
        tokio::select! {
            _ = ticker.tick() => return Signal::Report,
            Some(key) = keys.recv() => {
                if let Some(command) = Command::from_key(key) {
                    return Signal::Command(command);
                }
            }
        }
    }
}

/// Timer or command if either is pending right now, otherwise advance a turn.
async fn next_signal(ticker: &mut Interval, keys: &mut mpsc::Receiver<char>) -> Signal {
    tokio::select! {
        biased;
        signal = pending_signal(ticker, keys) => signal,
        () = std::future::ready(()) => Signal::Advance,
    }
}

pub struct Controller {
    params: Params,
    grid: Grid,
    executor: TurnExecutor,
    channels: ControllerChannels,
    turn: usize,
}

impl Controller {
    /// Starts the worker pool, so this must be called inside a tokio runtime.
    pub fn new(params: Params, channels: ControllerChannels) -> Self {
        Self {
            params,
            grid: Grid::new(params.image_width, params.image_height),
            executor: TurnExecutor::new(params.threads, params.image_height),
            channels,
            turn: 0,
        }
    }

    /// Runs until the configured turns are exhausted or a quit arrives. Either
    /// way the last snapshot is flushed before the event stream closes.
    pub async fn run(mut self) -> Result<()> {
        self.load().await?;

        let mut ticker = time::interval_at(Instant::now() + REPORT_PERIOD, REPORT_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.turn < self.params.turns {
            match next_signal(&mut ticker, &mut self.channels.key_presses).await {
                Signal::Report => self.report_alive_count().await?,
                Signal::Command(Command::Save) => self.save().await?,
                Signal::Command(Command::Quit) => {
                    log::info!("quit requested at turn {}", self.turn);
                    return self.quit().await;
                }
                Signal::Command(Command::TogglePause) => {
                    if !self.pause().await? {
                        return self.quit().await;
                    }
                }
                Signal::Advance => self.advance().await?,
            }
        }

        log::info!("completed {} turns", self.turn);
        let alive = self.grid.current().alive_cells();
        self.emit(Event::FinalTurnComplete { turn: self.turn, alive }).await?;
        self.quit().await
    }

    async fn emit(&self, event: Event) -> Result<()> {
        self.channels.events.send(event).await.map_err(|_| Error::EventsDropped)
    }

    async fn io_request(&self, command: IoCommand) -> Result<()> {
        self.channels.io_command.send(command).await.map_err(|_| Error::IoUnavailable)
    }

    /// Reads the initial board, one intensity per cell in row-major order.
    async fn load(&mut self) -> Result<()> {
        let filename = self.params.image_name();
        self.io_request(IoCommand::Input).await?;
        self.channels.io_filename.send(filename.clone()).await.map_err(|_| Error::IoUnavailable)?;

        let (width, height) = (self.grid.width(), self.grid.height());
        for y in 0..height {
            for x in 0..width {
                let pixel = self.channels.io_input.recv().await.ok_or(Error::InputExhausted {
                    expected: width * height,
                    received: y * width + x,
                })?;
                self.grid.set_initial(x, y, pixel == 255);
            }
        }

        let alive = self.grid.current().alive_cells();
        log::info!("loaded {filename} with {} alive cells", alive.len());
        self.emit(Event::ImageInputComplete { filename, alive }).await
    }

    async fn report_alive_count(&self) -> Result<()> {
        let count = self.grid.current().alive_count();
        self.emit(Event::AliveCellsCount { turn: self.turn, count }).await
    }

    /// One generation: compute, report every flipped cell, then the turn itself.
    async fn advance(&mut self) -> Result<()> {
        self.executor.run_turn(&mut self.grid).await?;
        for cell in self.grid.flipped() {
            self.emit(Event::CellFlipped { turn: self.turn, cell }).await?;
        }
        self.emit(Event::TurnComplete { turn: self.turn }).await?;
        log::trace!("turn {} complete", self.turn);
        self.turn += 1;
        Ok(())
    }

    /// Streams the current board to the image collaborator without waiting for it to land.
    async fn save(&self) -> Result<()> {
        let filename = self.params.snapshot_name(self.turn);
        self.io_request(IoCommand::Output).await?;
        self.channels.io_filename.send(filename.clone()).await.map_err(|_| Error::IoUnavailable)?;
        for pixel in self.grid.current().pixels() {
            self.channels.io_output.send(pixel).await.map_err(|_| Error::IoUnavailable)?;
        }

        log::info!("saving {filename}");
        self.emit(Event::ImageOutputComplete { filename, turn: self.turn }).await
    }

    /// Blocks until another pause toggle arrives; every other key is dropped.
    /// Returns false if the key source closed, since nothing can resume the run.
    async fn pause(&mut self) -> Result<bool> {
        self.emit(Event::StateChange { turn: self.turn, state: State::Paused }).await?;
        log::debug!("paused at turn {}", self.turn);

        loop {
            match self.channels.key_presses.recv().await {
                Some(key) if Command::from_key(key) == Some(Command::TogglePause) => break,
                Some(_) => {}
                None => {
                    log::warn!("key presses closed while paused at turn {}, quitting", self.turn);
                    return Ok(false);
                }
            }
        }

        self.emit(Event::StateChange { turn: self.turn, state: State::Running }).await?;
        log::debug!("resumed at turn {}", self.turn);
        Ok(true)
    }

    /// Save, wait for the collaborator to go idle, announce quitting, then close the stream.
    async fn quit(mut self) -> Result<()> {
        self.save().await?;
        self.io_request(IoCommand::CheckIdle).await?;
        self.channels.io_idle.recv().await.ok_or(Error::IoUnavailable)?;
        self.emit(Event::StateChange { turn: self.turn, state: State::Quitting }).await?;

        let Controller { executor, channels, .. } = self;
        executor.shutdown().await?;
        drop(channels);
        Ok(())
    }
}
