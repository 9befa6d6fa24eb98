// io.rs - PGM image collaborator: loads the initial board and stores snapshots

use std::path::{Path, PathBuf};

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

use crate::context::{IoChannels, IoCommand};
use crate::error::{Error, Result};
use crate::params::Params;

/// Where images are read from and written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self { input_dir: PathBuf::from("images"), output_dir: PathBuf::from("out") }
    }
}

impl IoConfig {
    pub fn input_path(&self, name: &str) -> PathBuf {
        self.input_dir.join(format!("{name}.pgm"))
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.pgm"))
    }
}

/// A decoded greyscale image, pixels row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

fn malformed(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::MalformedImage { path: path.to_path_buf(), reason: err.to_string() }
}

/// Binary PGM (P5) with a max value of 255. `path` only labels errors.
pub fn encode_pgm(path: &Path, width: usize, height: usize, pixels: &[u8]) -> Result<Vec<u8>> {
    let width = u32::try_from(width).map_err(|err| malformed(path, err))?;
    let height = u32::try_from(height).map_err(|err| malformed(path, err))?;
    // The encoder asserts on the buffer length, so check it here.
    if u64::from(width) * u64::from(height) != pixels.len() as u64 {
        return Err(malformed(path, format!("{} pixels for a {width}x{height} image", pixels.len())));
    }

    let mut bytes = Vec::with_capacity(pixels.len() + 32);
    PnmEncoder::new(&mut bytes)
        .with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary))
        .write_image(pixels, width, height, ExtendedColorType::L8)
        .map_err(|err| malformed(path, err))?;
    Ok(bytes)
}

/// Decodes any PNM image, converting it to 8-bit greyscale.
pub fn decode_pgm(path: &Path, bytes: &[u8]) -> Result<Image> {
    let luma = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)
        .map_err(|err| malformed(path, err))?
        .into_luma8();
    let (width, height) = luma.dimensions();
    Ok(Image { width: width as usize, height: height as usize, pixels: luma.into_raw() })
}

async fn read_image(params: &Params, path: &Path) -> Result<Image> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    let image = decode_pgm(path, &bytes)?;
    if (image.width, image.height) != (params.image_width, params.image_height) {
        return Err(Error::MalformedImage {
            path: path.to_path_buf(),
            reason: format!(
                "image is {}x{}, expected {}x{}",
                image.width, image.height, params.image_width, params.image_height
            ),
        });
    }
    Ok(image)
}

async fn write_image(params: &Params, path: &Path, pixels: &[u8]) -> Result<()> {
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
    }
    let bytes = encode_pgm(path, params.image_width, params.image_height, pixels)?;
    tokio::fs::write(path, bytes).await.map_err(io_err)
}

/// Serves the controller's image requests strictly in order until it hangs up.
/// Returns early, without error, if the controller disappears mid-exchange.
pub async fn start(params: Params, config: IoConfig, mut channels: IoChannels) -> Result<()> {
    while let Some(command) = channels.command.recv().await {
        match command {
            IoCommand::Input => {
                let Some(filename) = channels.filename.recv().await else { break };
                let path = config.input_path(&filename);
                let image = read_image(&params, &path).await?;
                log::info!("loaded {}", path.display());
                for pixel in image.pixels {
                    if channels.input.send(pixel).await.is_err() {
                        return Ok(());
                    }
                }
            }
            IoCommand::Output => {
                let Some(filename) = channels.filename.recv().await else { break };
                let mut pixels = Vec::with_capacity(params.cell_count());
                while pixels.len() < params.cell_count() {
                    match channels.output.recv().await {
                        Some(pixel) => pixels.push(pixel),
                        None => {
                            log::warn!("output of {filename} cut short after {} pixels", pixels.len());
                            return Ok(());
                        }
                    }
                }
                let path = config.output_path(&filename);
                write_image(&params, &path, &pixels).await?;
                log::info!("wrote {}", path.display());
            }
            IoCommand::CheckIdle => {
                if channels.idle.send(true).await.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
