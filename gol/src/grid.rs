// grid.rs - Toroidal boards and the double buffer the executor turns over

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::event::Cell;

pub type TRow = Vec<bool>;

/// One generation of cells, stored row by row and indexed `[y][x]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    rows: Vec<TRow>,
}

impl Board {
    /// All-dead board. Callers validate that both dimensions are non-zero.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, rows: vec![vec![false; width]; height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sets a cell during the initial load. Out-of-range coordinates are ignored.
    pub fn set_initial(&mut self, x: usize, y: usize, alive: bool) {
        if x < self.width && y < self.height {
            self.rows[y][x] = alive;
        }
    }

    /// Reads a cell, wrapping both axes around the torus.
    pub fn cell_state(&self, x: isize, y: isize) -> bool {
        let x = x.rem_euclid(self.width as isize) as usize;
        let y = y.rem_euclid(self.height as isize) as usize;
        self.rows[y][x]
    }

    /// B3/S23: born with three live neighbours, survives with two or three.
    pub fn next_state(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as isize, y as isize);
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0) && self.cell_state(x + dx, y + dy) {
                    count += 1;
                }
            }
        }

        match (self.cell_state(x, y), count) {
            (true, 2) | (_, 3) => true,   // Survival or birth
            _                  => false,  // Death or stays dead
        }
    }

    pub fn is_alive(&self, cell: Cell) -> bool {
        self.rows[cell.y][cell.x]
    }

    /// Inverts one cell, as a `CellFlipped` consumer replays it.
    pub fn flip(&mut self, cell: Cell) {
        let alive = &mut self.rows[cell.y][cell.x];
        *alive = !*alive;
    }

    /// Alive coordinates in row-major order.
    pub fn alive_cells(&self) -> Vec<Cell> {
        self.cells().filter(|&cell| self.is_alive(cell)).collect()
    }

    pub fn alive_count(&self) -> usize {
        self.rows.iter().map(|row| row.iter().filter(|&&alive| alive).count()).sum()
    }

    /// Every coordinate, outer loop over rows.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Cell { x, y }))
    }

    /// Cells as image intensities, 255 alive and 0 dead, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().flatten().map(|&alive| if alive { 255 } else { 0 })
    }

    /// Moves the rows out in contiguous bands, one per range.
    pub(crate) fn take_bands(&mut self, ranges: &[std::ops::Range<usize>]) -> Vec<Band> {
        let mut rows = std::mem::take(&mut self.rows).into_iter();
        ranges
            .iter()
            .map(|range| Band { first_row: range.start, rows: rows.by_ref().take(range.len()).collect() })
            .collect()
    }

    /// Puts bands returned by the workers back in place, in row order.
    pub(crate) fn restore_bands(&mut self, bands: Vec<Band>) {
        debug_assert!(bands.windows(2).all(|pair| pair[0].first_row + pair[0].rows.len() == pair[1].first_row));
        self.rows = bands.into_iter().flat_map(|band| band.rows).collect();
        debug_assert_eq!(self.rows.len(), self.height);
    }
}

/// Rows owned by one worker for the duration of a turn.
#[derive(Debug)]
pub(crate) struct Band {
    pub first_row: usize,
    pub rows: Vec<TRow>,
}

/// Double-buffered board. `current` is shared read-only with the workers while a
/// turn runs. `back` is the write target, and after a swap it holds the
/// generation before `current`.
#[derive(Debug)]
pub struct Grid {
    current: Arc<Board>,
    back: Board,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self { current: Arc::new(Board::new(width, height)), back: Board::new(width, height) }
    }

    pub fn width(&self) -> usize {
        self.current.width
    }

    pub fn height(&self) -> usize {
        self.current.height
    }

    pub fn current(&self) -> &Board {
        &self.current
    }

    pub fn set_initial(&mut self, x: usize, y: usize, alive: bool) {
        Arc::make_mut(&mut self.current).set_initial(x, y, alive);
    }

    /// Coordinates whose state differs between `current` and the previous
    /// generation, in row-major order.
    pub fn flipped(&self) -> Vec<Cell> {
        self.current
            .cells()
            .filter(|&cell| self.current.is_alive(cell) != self.back.is_alive(cell))
            .collect()
    }

    pub(crate) fn shared_current(&self) -> Arc<Board> {
        Arc::clone(&self.current)
    }

    pub(crate) fn back_mut(&mut self) -> &mut Board {
        &mut self.back
    }

    /// Exchanges buffer roles. Fails if a worker still holds the old generation.
    pub(crate) fn swap(&mut self) -> Result<()> {
        let next = std::mem::take(&mut self.back);
        let previous = std::mem::replace(&mut self.current, Arc::new(next));
        self.back = Arc::try_unwrap(previous).map_err(|_| Error::BufferShared)?;
        Ok(())
    }
}
