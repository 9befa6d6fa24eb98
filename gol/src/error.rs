// error.rs - Failure modes of the engine and its image collaborator

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{name} must be greater than zero")]
    InvalidParam { name: &'static str },

    #[error("worker {worker} stopped before finishing its rows")]
    WorkerLost { worker: usize },

    #[error("generation buffer still shared when swapping")]
    BufferShared,

    #[error("input image ended after {received} of {expected} cells")]
    InputExhausted { expected: usize, received: usize },

    #[error("image collaborator is no longer running")]
    IoUnavailable,

    #[error("event consumer went away")]
    EventsDropped,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: malformed PGM image: {reason}", path.display())]
    MalformedImage { path: PathBuf, reason: String },

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}
