// executor.rs - Row-partitioned worker pool that computes one generation per call

use std::ops::Range;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::grid::{Band, Board, Grid};

/// One worker's share of a turn: a read-only view of the current generation
/// and the rows of the next generation it alone writes.
struct Task {
    current: Arc<Board>,
    band: Band,
    reply: oneshot::Sender<Band>,
}

struct Worker {
    tasks: mpsc::Sender<Task>,
    handle: JoinHandle<()>,
}

/// Fixed pool of `threads` tasks, spawned once and reused every turn.
pub struct TurnExecutor {
    workers: Vec<Worker>,
    ranges: Vec<Range<usize>>,
}

/// Splits `height` rows into at most `threads` contiguous, non-empty bands whose
/// sizes differ by at most one.
pub fn partition(height: usize, threads: usize) -> Vec<Range<usize>> {
    let bands = threads.min(height).max(1);
    let (base, extra) = (height / bands, height % bands);
    let mut start = 0;
    (0..bands)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .filter(|range| !range.is_empty())
        .collect()
}

/// Worker loop: fill every owned row from the shared generation, yielding between rows.
async fn process_bands(worker: usize, mut tasks: mpsc::Receiver<Task>) {
    while let Some(Task { current, mut band, reply }) = tasks.recv().await {
        for (offset, row) in band.rows.iter_mut().enumerate() {
            let y = band.first_row + offset;
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = current.next_state(x, y);
            }
            tokio::task::yield_now().await;  // Cooperative yielding
        }

        // The swap needs sole ownership of the generation again.
        drop(current);
        if reply.send(band).is_err() {
            log::debug!("worker {worker}: turn abandoned, stopping");
            break;
        }
    }
}

impl TurnExecutor {
    /// Spawns the pool on the current tokio runtime.
    pub fn new(threads: usize, height: usize) -> Self {
        let workers = (0..threads)
            .map(|worker| {
                let (tasks, inbox) = mpsc::channel(1);
                let handle = tokio::spawn(process_bands(worker, inbox));
                Worker { tasks, handle }
            })
            .collect();
        log::debug!("started {threads} workers for {height} rows");
        Self { workers, ranges: partition(height, threads) }
    }

    /// Computes the next generation into the back buffer and swaps it in.
    /// Returns only after every worker has handed its rows back.
    pub async fn run_turn(&self, grid: &mut Grid) -> Result<()> {
        let bands = grid.back_mut().take_bands(&self.ranges);

        let mut pending = Vec::with_capacity(bands.len());
        for (worker, (handle, band)) in self.workers.iter().zip(bands).enumerate() {
            let (reply, done) = oneshot::channel();
            let task = Task { current: grid.shared_current(), band, reply };
            handle.tasks.send(task).await.map_err(|_| Error::WorkerLost { worker })?;
            pending.push((worker, done));
        }

        let mut finished = Vec::with_capacity(pending.len());
        for (worker, done) in pending {
            finished.push(done.await.map_err(|_| Error::WorkerLost { worker })?);
        }

        grid.back_mut().restore_bands(finished);
        grid.swap()
    }

    /// Closes every task channel and waits for the workers to exit.
    pub async fn shutdown(self) -> Result<()> {
        let handles: Vec<_> = self.workers.into_iter().map(|worker| worker.handle).collect();
        let count = handles.len();
        for handle in handles {
            handle.await?;
        }
        log::debug!("stopped {count} workers");
        Ok(())
    }
}
