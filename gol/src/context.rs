// context.rs - Channel wiring between the controller and the image collaborator

use tokio::sync::mpsc;

use crate::event::Event;
use crate::params::Params;

/// Tag that opens each exchange with the image collaborator. A filename
/// follows every `Input` and `Output`; pixels follow every `Output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCommand {
    Input,
    Output,
    CheckIdle,
}

/// The controller's ends of every channel.
pub struct ControllerChannels {
    pub(crate) events: mpsc::Sender<Event>,
    pub(crate) io_command: mpsc::Sender<IoCommand>,
    pub(crate) io_idle: mpsc::Receiver<bool>,
    pub(crate) io_filename: mpsc::Sender<String>,
    pub(crate) io_output: mpsc::Sender<u8>,
    pub(crate) io_input: mpsc::Receiver<u8>,
    pub(crate) key_presses: mpsc::Receiver<char>,
}

/// The image collaborator's ends.
pub struct IoChannels {
    pub(crate) command: mpsc::Receiver<IoCommand>,
    pub(crate) idle: mpsc::Sender<bool>,
    pub(crate) filename: mpsc::Receiver<String>,
    pub(crate) output: mpsc::Receiver<u8>,
    pub(crate) input: mpsc::Sender<u8>,
}

/// Builds every internal channel once per run. Pixel channels hold a full row.
pub fn wire(
    params: &Params,
    events: mpsc::Sender<Event>,
    key_presses: mpsc::Receiver<char>,
) -> (ControllerChannels, IoChannels) {
    let (io_command, command) = mpsc::channel(1);
    let (idle, io_idle) = mpsc::channel(1);
    let (io_filename, filename) = mpsc::channel(1);
    let (io_output, output) = mpsc::channel(params.image_width);
    let (input, io_input) = mpsc::channel(params.image_width);

    (
        ControllerChannels { events, io_command, io_idle, io_filename, io_output, io_input, key_presses },
        IoChannels { command, idle, filename, output, input },
    )
}
