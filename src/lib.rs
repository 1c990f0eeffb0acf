// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

#![allow(rustdoc::invalid_rust_codeblocks)]
#![doc = include_str!("../README.md")]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]
#![warn(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(rustdoc::broken_intra_doc_links)]
// Repetitions of module/type names occur frequently when using many
// modules for keeping the size of the source files handy. Often
// types have the same name as their parent module.
#![allow(clippy::module_name_repetitions)]
// Repeating the type name in `..Default::default()` expressions
// is not needed since the context is obvious.
#![allow(clippy::default_trait_access)]

use derive_more::{Display, From};

mod config;
pub use self::config::{DeviceConfig, ValidationPolicy, DEFAULT_DEVICE_NAME};

mod decoder;
pub use self::decoder::{
    decode_packet_list, try_decode_midi_event, DecodeError, Decoder, SharedDecoder,
};

mod encoder;
pub use self::encoder::{
    encode_control_change, encode_mono_aftertouch, encode_note_off, encode_note_on,
    encode_pitchbend, encode_poly_aftertouch, encode_program_change, encode_sysex, EncodeError,
    Encoder, SendError,
};

mod message;
pub use self::message::{Channel, DataByte, MidiEvent, StatusKind, ValueError, SYSEX_START};

pub mod midi;
pub use self::midi::{
    BoxedMidiOutputConnection, MidiInputHandler, MidiOutputConnection, OutputError,
    OutputResult,
};
#[cfg(all(feature = "midir", unix))]
pub use self::midi::{VirtualMidiDevice, VirtualPortError};

mod observer;
pub use self::observer::{dispatch_midi_event, BoxedMidiEventObserver, MidiEventObserver};

mod packet;
pub use self::packet::{PacketData, PacketError, PacketList, RawPacket, MAX_PACKET_LEN};

/// Time stamp with microsecond precision.
///
/// The origin is defined by the transport. Outgoing packets use
/// [`TimeStamp::NOW`] for immediate delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
#[display("{_0}us")]
pub struct TimeStamp(u64);

impl TimeStamp {
    pub const NOW: Self = Self(0);

    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    #[must_use]
    pub const fn to_micros(self) -> u64 {
        self.0
    }
}
