// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

//! Virtual MIDI ports on the host MIDI subsystem, driven by [`midir`].

use midir::{
    os::unix::{VirtualInput as _, VirtualOutput as _},
    ConnectError, Ignore, InitError, MidiInput, MidiInputConnection, MidiOutput, SendError,
};
use thiserror::Error;

use crate::{
    BoxedMidiEventObserver, Decoder, DeviceConfig, Encoder, MidiInputHandler, OutputError,
    RawPacket, SharedDecoder, TimeStamp,
};

#[derive(Debug, Error)]
pub enum VirtualPortError {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    ConnectInput(#[from] ConnectError<MidiInput>),
    #[error(transparent)]
    ConnectOutput(#[from] ConnectError<MidiOutput>),
}

impl From<SendError> for OutputError {
    fn from(err: SendError) -> Self {
        OutputError::Send {
            msg: err.to_string().into(),
        }
    }
}

impl super::MidiOutputConnection for midir::MidiOutputConnection {
    fn send_midi_output(&mut self, packet: &RawPacket) -> crate::OutputResult<()> {
        self.send(packet.as_bytes()).map_err(Into::into)
    }
}

// Adapter for the midir callback closure
fn handle_input<I>(micros: u64, input: &[u8], input_handler: &mut I)
where
    I: MidiInputHandler,
{
    let ts = TimeStamp::from_micros(micros);
    if !input_handler.handle_midi_input(ts, input) {
        log::trace!("Unhandled MIDI input {ts} {input:02x?}");
    }
}

fn create_virtual_input(
    config: &DeviceConfig,
    input: MidiInput,
    decoder: SharedDecoder,
) -> Result<MidiInputConnection<SharedDecoder>, VirtualPortError> {
    let port_name = config.input_port_name();
    log::debug!("Creating virtual MIDI input port \"{port_name}\"");
    input
        .create_virtual(
            &port_name,
            |micros, input, decoder| {
                handle_input(micros, input, decoder);
            },
            decoder,
        )
        .map_err(Into::into)
}

/// Virtual endpoint with one source and one destination.
///
/// Other applications see a source `<name> Out` that emits all messages
/// sent through [`VirtualMidiDevice::encoder_mut()`] and a destination
/// `<name> In` that forwards all received messages to the attached observer.
#[allow(missing_debug_implementations)]
pub struct VirtualMidiDevice {
    config: DeviceConfig,
    decoder: SharedDecoder,
    input_connection: MidiInputConnection<SharedDecoder>,
    encoder: Encoder<midir::MidiOutputConnection>,
}

impl VirtualMidiDevice {
    pub fn create(
        config: DeviceConfig,
        observer: Option<BoxedMidiEventObserver>,
    ) -> Result<Self, VirtualPortError> {
        let mut input = MidiInput::new(&config.name)?;
        input.ignore(Ignore::None);
        let decoder = observer.map_or_else(Decoder::new, Decoder::with_observer);
        let decoder = SharedDecoder::new(decoder);
        let input_connection = create_virtual_input(&config, input, decoder.clone())?;
        let output_port_name = config.output_port_name();
        log::debug!("Creating virtual MIDI output port \"{output_port_name}\"");
        let output_connection = MidiOutput::new(&config.name)?.create_virtual(&output_port_name)?;
        let encoder = Encoder::with_policy(output_connection, config.validation);
        log::info!(
            "Created virtual MIDI device \"{name}\"",
            name = config.name
        );
        Ok(Self {
            config,
            decoder,
            input_connection,
            encoder,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[must_use]
    pub const fn encoder(&self) -> &Encoder<midir::MidiOutputConnection> {
        &self.encoder
    }

    pub fn encoder_mut(&mut self) -> &mut Encoder<midir::MidiOutputConnection> {
        &mut self.encoder
    }

    /// The decoder that receives the input of the virtual destination.
    #[must_use]
    pub const fn decoder(&self) -> &SharedDecoder {
        &self.decoder
    }

    /// Attach an observer, replacing and returning the current one.
    ///
    /// The virtual ports stay registered and connected.
    pub fn attach_observer(
        &self,
        observer: BoxedMidiEventObserver,
    ) -> Option<BoxedMidiEventObserver> {
        self.decoder.attach_observer(observer)
    }

    pub fn detach_observer(&self) -> Option<BoxedMidiEventObserver> {
        self.decoder.detach_observer()
    }

    pub fn close(self) {
        let Self {
            config,
            decoder: _,
            input_connection,
            encoder,
        } = self;
        input_connection.close();
        encoder.into_connection().close();
        log::info!("Closed virtual MIDI device \"{name}\"", name = config.name);
    }
}
