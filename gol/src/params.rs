// params.rs - Run parameters and the file names derived from them

use crate::error::{Error, Result};

/// How many turns to run, how many workers share each turn, and the board size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub turns: usize,
    pub threads: usize,
    pub image_width: usize,
    pub image_height: usize,
}

impl Params {
    /// Rejects any zero field. Nothing is spawned for a run until this passes.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("turns", self.turns),
            ("threads", self.threads),
            ("image width", self.image_width),
            ("image height", self.image_height),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some(&(name, _)) => Err(Error::InvalidParam { name }),
            None => Ok(()),
        }
    }

    /// Name of the initial image, `"{height}x{width}"`.
    pub fn image_name(&self) -> String {
        format!("{}x{}", self.image_height, self.image_width)
    }

    /// Name of a snapshot taken at `turn`, `"{height}x{width}x{threads}-{turn}"`.
    pub fn snapshot_name(&self, turn: usize) -> String {
        format!(
            "{}x{}x{}-{}",
            self.image_height, self.image_width, self.threads, turn
        )
    }

    pub fn cell_count(&self) -> usize {
        self.image_width * self.image_height
    }
}
