// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

//! Typed MIDI values and events.

use derive_more::{Deref, Display};
use strum::{EnumCount, EnumIter, FromRepr};
use thiserror::Error;

use crate::{EncodeError, RawPacket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("channel {0} out of range [1,16]")]
    Channel(u8),
    #[error("data byte {0} out of range [0,127]")]
    DataByte(u8),
}

/// 1-based MIDI channel in the range [1, 16].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Deref)]
pub struct Channel(u8);

impl Channel {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(16);

    pub const fn new(channel: u8) -> Result<Self, ValueError> {
        if channel < Self::MIN.0 || channel > Self::MAX.0 {
            return Err(ValueError::Channel(channel));
        }
        Ok(Self(channel))
    }

    /// Channel addressed by the low nibble of a status byte.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        Self((nibble & 0x0f) + 1)
    }

    #[must_use]
    pub const fn to_nibble(self) -> u8 {
        self.0 - 1
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Channel {
    type Error = ValueError;

    fn try_from(from: u8) -> Result<Self, Self::Error> {
        Self::new(from)
    }
}

/// 7-bit payload value in the range [0, 127].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Deref)]
pub struct DataByte(u8);

impl DataByte {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(0x7f);

    pub const fn new(value: u8) -> Result<Self, ValueError> {
        if value > Self::MAX.0 {
            return Err(ValueError::DataByte(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DataByte {
    type Error = ValueError;

    fn try_from(from: u8) -> Result<Self, Self::Error> {
        Self::new(from)
    }
}

/// Message type encoded in the high nibble of a status byte.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    FromRepr,
    EnumIter,
    EnumCount,
    strum::Display,
)]
#[repr(u8)]
pub enum StatusKind {
    NoteOff = 0x8,
    NoteOn = 0x9,
    PolyAftertouch = 0xa,
    ControlChange = 0xb,
    ProgramChange = 0xc,
    MonoAftertouch = 0xd,
    Pitchbend = 0xe,
    SysEx = 0xf,
}

pub const SYSEX_START: u8 = 0xf0;

impl StatusKind {
    #[must_use]
    pub const fn from_status_byte(status: u8) -> Option<Self> {
        if status < 0x80 {
            return None;
        }
        Self::from_repr(status >> 4)
    }

    /// Number of data bytes following the status byte.
    ///
    /// Always 0 for [`StatusKind::SysEx`] that has a variable length.
    #[must_use]
    pub const fn data_len(self) -> usize {
        match self {
            Self::ProgramChange | Self::MonoAftertouch => 1,
            Self::SysEx => 0,
            _ => 2,
        }
    }

    /// Base status code without the channel offset, e.g. 0x90 for note on.
    #[must_use]
    pub const fn base_code(self) -> u8 {
        (self as u8) << 4
    }

    #[must_use]
    pub const fn status_byte(self, channel: Channel) -> u8 {
        self.base_code() | channel.to_nibble()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOff {
        channel: Channel,
        note: DataByte,
        velocity: DataByte,
    },
    NoteOn {
        channel: Channel,
        note: DataByte,
        velocity: DataByte,
    },
    PolyAftertouch {
        channel: Channel,
        note: DataByte,
        pressure: DataByte,
    },
    ControlChange {
        channel: Channel,
        controller: DataByte,
        value: DataByte,
    },
    ProgramChange {
        channel: Channel,
        program: DataByte,
    },
    MonoAftertouch {
        channel: Channel,
        pressure: DataByte,
    },
    Pitchbend {
        channel: Channel,
        lsb: DataByte,
        msb: DataByte,
    },
    /// Complete raw bytes, including the leading 0xF0 and any trailing 0xF7.
    SysEx { data: Vec<u8> },
}

impl MidiEvent {
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::NoteOff { .. } => StatusKind::NoteOff,
            Self::NoteOn { .. } => StatusKind::NoteOn,
            Self::PolyAftertouch { .. } => StatusKind::PolyAftertouch,
            Self::ControlChange { .. } => StatusKind::ControlChange,
            Self::ProgramChange { .. } => StatusKind::ProgramChange,
            Self::MonoAftertouch { .. } => StatusKind::MonoAftertouch,
            Self::Pitchbend { .. } => StatusKind::Pitchbend,
            Self::SysEx { .. } => StatusKind::SysEx,
        }
    }

    /// `None` for SysEx that is not addressed to a channel.
    #[must_use]
    pub const fn channel(&self) -> Option<Channel> {
        match self {
            Self::NoteOff { channel, .. }
            | Self::NoteOn { channel, .. }
            | Self::PolyAftertouch { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::MonoAftertouch { channel, .. }
            | Self::Pitchbend { channel, .. } => Some(*channel),
            Self::SysEx { .. } => None,
        }
    }

    /// Combined 14-bit pitch bend value with 8192 at the center.
    #[must_use]
    pub fn pitchbend_value(&self) -> Option<u16> {
        let Self::Pitchbend { lsb, msb, .. } = self else {
            return None;
        };
        Some(u16::from(msb.value()) << 7 | u16::from(lsb.value()))
    }

    pub fn encode(&self) -> Result<RawPacket, EncodeError> {
        let (kind, channel, data1, data2) = match *self {
            Self::NoteOff {
                channel,
                note,
                velocity,
            } => (StatusKind::NoteOff, channel, note, Some(velocity)),
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => (StatusKind::NoteOn, channel, note, Some(velocity)),
            Self::PolyAftertouch {
                channel,
                note,
                pressure,
            } => (StatusKind::PolyAftertouch, channel, note, Some(pressure)),
            Self::ControlChange {
                channel,
                controller,
                value,
            } => (StatusKind::ControlChange, channel, controller, Some(value)),
            Self::ProgramChange { channel, program } => {
                (StatusKind::ProgramChange, channel, program, None)
            }
            Self::MonoAftertouch { channel, pressure } => {
                (StatusKind::MonoAftertouch, channel, pressure, None)
            }
            Self::Pitchbend { channel, lsb, msb } => {
                (StatusKind::Pitchbend, channel, lsb, Some(msb))
            }
            Self::SysEx { ref data } => return crate::encoder::encode_sysex(data),
        };
        Ok(crate::encoder::encode_channel_message(
            kind, channel, data1, data2,
        ))
    }
}
