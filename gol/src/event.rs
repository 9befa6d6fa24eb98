// event.rs - Outward notifications and inward control commands

use std::fmt;

/// A board coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Paused,
    Quitting,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Running  => "Running",
            State::Paused   => "Paused",
            State::Quitting => "Quitting",
        })
    }
}

/// Everything the engine reports. Within a turn, every `CellFlipped` precedes
/// that turn's `TurnComplete`. `AliveCellsCount` may land between any two turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ImageInputComplete { filename: String, alive: Vec<Cell> },
    AliveCellsCount { turn: usize, count: usize },
    CellFlipped { turn: usize, cell: Cell },
    TurnComplete { turn: usize },
    FinalTurnComplete { turn: usize, alive: Vec<Cell> },
    ImageOutputComplete { filename: String, turn: usize },
    StateChange { turn: usize, state: State },
}

impl Event {
    pub fn turn(&self) -> Option<usize> {
        match *self {
            Event::ImageInputComplete { .. } => None,
            Event::AliveCellsCount { turn, .. }
            | Event::CellFlipped { turn, .. }
            | Event::TurnComplete { turn }
            | Event::FinalTurnComplete { turn, .. }
            | Event::ImageOutputComplete { turn, .. }
            | Event::StateChange { turn, .. } => Some(turn),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ImageInputComplete { filename, alive } => {
                write!(f, "Loaded {filename} with {} alive cells", alive.len())
            }
            Event::AliveCellsCount { turn, count } => write!(f, "Alive Cells {count} (turn {turn})"),
            Event::CellFlipped { turn, cell } => write!(f, "Cell ({}, {}) flipped (turn {turn})", cell.x, cell.y),
            Event::TurnComplete { turn } => write!(f, "Turn {turn} complete"),
            Event::FinalTurnComplete { turn, alive } => {
                write!(f, "Final turn {turn} complete with {} alive cells", alive.len())
            }
            Event::ImageOutputComplete { filename, turn } => write!(f, "File {filename} output done (turn {turn})"),
            Event::StateChange { turn, state } => write!(f, "{state} (turn {turn})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    Quit,
    TogglePause,
}

impl Command {
    /// Maps a key press; anything unrecognised is ignored.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            's' => Some(Command::Save),
            'q' => Some(Command::Quit),
            'p' => Some(Command::TogglePause),
            _   => None,
        }
    }
}
