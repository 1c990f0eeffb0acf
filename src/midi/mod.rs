// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

//! Transport capabilities that connect the codec to the host MIDI subsystem.

use std::{
    borrow::Cow,
    ops::{Deref, DerefMut},
};

use thiserror::Error;

use crate::{RawPacket, TimeStamp};

#[cfg(all(feature = "midir", unix))]
mod midir;
#[cfg(all(feature = "midir", unix))]
pub use self::midir::{VirtualMidiDevice, VirtualPortError};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("disconnected")]
    Disconnected,

    #[error("send: {msg}")]
    Send { msg: Cow<'static, str> },
}

pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Passive callback for sinking MIDI input messages
pub trait MidiInputHandler: Send {
    /// Invoked for each incoming packet.
    ///
    /// Returns `true` if the message has been accepted and handled
    /// or `false` otherwise.
    #[must_use]
    fn handle_midi_input(&mut self, ts: TimeStamp, input: &[u8]) -> bool;
}

impl<D> MidiInputHandler for D
where
    D: DerefMut + Send,
    <D as Deref>::Target: MidiInputHandler,
{
    fn handle_midi_input(&mut self, ts: TimeStamp, input: &[u8]) -> bool {
        self.deref_mut().handle_midi_input(ts, input)
    }
}

/// Submits packets to a logical output endpoint.
pub trait MidiOutputConnection {
    /// Returns after the transport has accepted the packet.
    fn send_midi_output(&mut self, packet: &RawPacket) -> OutputResult<()>;
}

pub type BoxedMidiOutputConnection = Box<dyn MidiOutputConnection + Send + 'static>;

impl<C> MidiOutputConnection for Box<C>
where
    C: MidiOutputConnection + ?Sized,
{
    fn send_midi_output(&mut self, packet: &RawPacket) -> OutputResult<()> {
        self.as_mut().send_midi_output(packet)
    }
}
