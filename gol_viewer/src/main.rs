// main.rs - Desktop viewer for the Game of Life engine
// Renders the event stream and forwards S / P / Q presses as control keys.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::egui;
use egui::Color32;
use gol::{Board, Event, RunConfig, State};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

mod ui;

/// Upper bound on events applied per frame, so a fast engine cannot stall painting.
const EVENTS_PER_FRAME: usize = 200_000;

/// Vertical room taken by the heading, controls and statistics rows.
const CHROME_HEIGHT: f32 = 170.0;

/// Window size that shows the whole board with square cells of 1 to 12 pixels,
/// keeping the board itself within roughly 1200x900.
fn window_size(width: usize, height: usize) -> [f32; 2] {
    let (width, height) = (width.max(1) as f32, height.max(1) as f32);
    let cell_size = (1200.0 / width).min(900.0 / height).clamp(1.0, 12.0);
    let board = [cell_size * width, cell_size * height];
    [board[0].max(480.0) + 20.0, board[1] + CHROME_HEIGHT]
}

#[derive(Parser)]
#[command(name = "gol-viewer", about = "Watch a parallel Game of Life run")]
struct Cli {
    #[command(flatten)]
    run: RunConfig,
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Cli::parse().run;
    let params = config.params();
    params.validate()?;

    let (events_tx, events) = mpsc::channel(4096);
    let (keys, keys_rx) = mpsc::channel(16);
    let io_config = config.io_config();
    let engine = std::thread::spawn(move || -> Result<()> {
        let runtime = tokio::runtime::Runtime::new().context("starting the engine runtime")?;
        runtime.block_on(gol::run(params, io_config, events_tx, keys_rx))?;
        Ok(())
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(window_size(params.image_width, params.image_height)),
        ..Default::default()
    };
    let viewer = Viewer::new(Board::new(params.image_width, params.image_height), events, keys);
    eframe::run_native(
        "Game of Life Viewer",
        options,
        Box::new(|_cc| Box::new(viewer)),
    )
    .map_err(|err| anyhow!("viewer window failed: {err}"))?;

    // Closing the window drops the event receiver, which stops the engine.
    match engine.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => match err.downcast_ref::<gol::Error>() {
            Some(gol::Error::EventsDropped) => {
                log::info!("window closed before the run finished");
                Ok(())
            }
            _ => Err(err),
        },
        Err(_) => Err(anyhow!("engine thread panicked")),
    }
}

/// Mirror of the engine's board, rebuilt purely from events.
pub struct Viewer {
    board: Board,
    events: mpsc::Receiver<Event>,
    keys: mpsc::Sender<char>,

    pub turn: usize,
    pub state: State,
    pub reported_alive: Option<usize>,
    pub last_snapshot: Option<String>,
    pub finished: bool,
    pub live_color: Color32,
    pub dead_color: Color32,
}

impl Viewer {
    fn new(board: Board, events: mpsc::Receiver<Event>, keys: mpsc::Sender<char>) -> Self {
        Self {
            board,
            events,
            keys,
            turn: 0,
            state: State::Running,
            reported_alive: None,
            last_snapshot: None,
            finished: false,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
        }
    }

    /// Applies whatever the engine has sent since the last frame.
    fn drain_events(&mut self) {
        for _ in 0..EVENTS_PER_FRAME {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
            }
        }
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::ImageInputComplete { alive, .. } => {
                self.board = Board::new(self.board.width(), self.board.height());
                for cell in alive {
                    self.board.flip(cell);
                }
            }
            Event::CellFlipped { cell, .. } => self.board.flip(cell),
            Event::TurnComplete { turn } => self.turn = turn + 1,
            Event::AliveCellsCount { count, .. } => self.reported_alive = Some(count),
            Event::FinalTurnComplete { turn, .. } => self.turn = turn,
            Event::ImageOutputComplete { filename, .. } => self.last_snapshot = Some(filename),
            Event::StateChange { state, .. } => self.state = state,
        }
    }

    /// Queues a control key; a full queue just drops the press.
    fn press(&self, key: char) {
        if self.keys.try_send(key).is_err() {
            log::debug!("key {key:?} dropped, engine busy or gone");
        }
    }
}
