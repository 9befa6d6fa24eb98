// config.rs - Command-line and environment configuration shared by both front ends

use std::path::PathBuf;

use clap::Args;

use crate::io::IoConfig;
use crate::params::Params;

#[derive(Debug, Clone, Args)]
pub struct RunConfig {
    /// Generations to run before writing the final image
    #[arg(long, env = "GOL_TURNS", default_value_t = 10_000_000_000)]
    pub turns: usize,

    /// Workers sharing each generation
    #[arg(long, env = "GOL_THREADS", default_value_t = 8)]
    pub threads: usize,

    /// Board width in cells
    #[arg(long, env = "GOL_WIDTH", default_value_t = 512)]
    pub width: usize,

    /// Board height in cells
    #[arg(long, env = "GOL_HEIGHT", default_value_t = 512)]
    pub height: usize,

    /// Directory holding `{height}x{width}.pgm`
    #[arg(long, env = "GOL_IMAGES", default_value = "images")]
    pub images: PathBuf,

    /// Directory snapshots are written to
    #[arg(long, env = "GOL_OUT", default_value = "out")]
    pub out: PathBuf,
}

impl RunConfig {
    pub fn params(&self) -> Params {
        Params {
            turns: self.turns,
            threads: self.threads,
            image_width: self.width,
            image_height: self.height,
        }
    }

    pub fn io_config(&self) -> IoConfig {
        IoConfig { input_dir: self.images.clone(), output_dir: self.out.clone() }
    }
}
