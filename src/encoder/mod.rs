// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

use crate::{
    Channel, DataByte, MidiEvent, MidiOutputConnection, OutputError, PacketError, RawPacket,
    StatusKind, TimeStamp, ValidationPolicy, ValueError,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Invalid(#[from] ValueError),

    #[error(transparent)]
    SizeExceeded(#[from] PacketError),
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Invalid(#[from] ValueError),

    #[error(transparent)]
    SizeExceeded(#[from] PacketError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl From<EncodeError> for SendError {
    fn from(from: EncodeError) -> Self {
        match from {
            EncodeError::Invalid(err) => Self::Invalid(err),
            EncodeError::SizeExceeded(err) => Self::SizeExceeded(err),
        }
    }
}

pub(crate) fn encode_channel_message(
    kind: StatusKind,
    channel: Channel,
    data1: DataByte,
    data2: Option<DataByte>,
) -> RawPacket {
    debug_assert_ne!(kind, StatusKind::SysEx);
    debug_assert_eq!(kind.data_len(), 1 + usize::from(data2.is_some()));
    RawPacket::from_message(
        kind.status_byte(channel),
        data1.value(),
        data2.map(DataByte::value),
    )
}

fn validate_and_encode(
    kind: StatusKind,
    channel: u8,
    data1: u8,
    data2: Option<u8>,
) -> Result<RawPacket, EncodeError> {
    let channel = Channel::new(channel)?;
    let data1 = DataByte::new(data1)?;
    let data2 = data2.map(DataByte::new).transpose()?;
    Ok(encode_channel_message(kind, channel, data1, data2))
}

pub fn encode_note_off(channel: u8, note: u8, velocity: u8) -> Result<RawPacket, EncodeError> {
    validate_and_encode(StatusKind::NoteOff, channel, note, Some(velocity))
}

pub fn encode_note_on(channel: u8, note: u8, velocity: u8) -> Result<RawPacket, EncodeError> {
    validate_and_encode(StatusKind::NoteOn, channel, note, Some(velocity))
}

pub fn encode_poly_aftertouch(
    channel: u8,
    note: u8,
    pressure: u8,
) -> Result<RawPacket, EncodeError> {
    validate_and_encode(StatusKind::PolyAftertouch, channel, note, Some(pressure))
}

pub fn encode_control_change(
    channel: u8,
    controller: u8,
    value: u8,
) -> Result<RawPacket, EncodeError> {
    validate_and_encode(StatusKind::ControlChange, channel, controller, Some(value))
}

pub fn encode_program_change(channel: u8, program: u8) -> Result<RawPacket, EncodeError> {
    validate_and_encode(StatusKind::ProgramChange, channel, program, None)
}

pub fn encode_mono_aftertouch(channel: u8, pressure: u8) -> Result<RawPacket, EncodeError> {
    validate_and_encode(StatusKind::MonoAftertouch, channel, pressure, None)
}

pub fn encode_pitchbend(channel: u8, lsb: u8, msb: u8) -> Result<RawPacket, EncodeError> {
    validate_and_encode(StatusKind::Pitchbend, channel, lsb, Some(msb))
}

/// Copy the bytes verbatim into a single packet.
///
/// No framing bytes are added. Payloads that do not fit into a
/// single packet are rejected and never split.
pub fn encode_sysex(bytes: &[u8]) -> Result<RawPacket, EncodeError> {
    RawPacket::try_from_slice(TimeStamp::NOW, bytes).map_err(Into::into)
}

/// Sends typed MIDI messages through an output connection.
#[derive(Debug)]
pub struct Encoder<C> {
    connection: C,
    policy: ValidationPolicy,
}

impl<C> Encoder<C>
where
    C: MidiOutputConnection,
{
    #[must_use]
    pub fn new(connection: C) -> Self {
        Self::with_policy(connection, ValidationPolicy::default())
    }

    #[must_use]
    pub const fn with_policy(connection: C, policy: ValidationPolicy) -> Self {
        Self { connection, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ValidationPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub const fn connection(&self) -> &C {
        &self.connection
    }

    #[must_use]
    pub fn into_connection(self) -> C {
        self.connection
    }

    pub fn send_note_off(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SendError> {
        self.send_encoded(encode_note_off(channel, note, velocity))
    }

    pub fn send_note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SendError> {
        self.send_encoded(encode_note_on(channel, note, velocity))
    }

    pub fn send_poly_aftertouch(
        &mut self,
        channel: u8,
        note: u8,
        pressure: u8,
    ) -> Result<(), SendError> {
        self.send_encoded(encode_poly_aftertouch(channel, note, pressure))
    }

    pub fn send_control_change(
        &mut self,
        channel: u8,
        controller: u8,
        value: u8,
    ) -> Result<(), SendError> {
        self.send_encoded(encode_control_change(channel, controller, value))
    }

    pub fn send_program_change(&mut self, channel: u8, program: u8) -> Result<(), SendError> {
        self.send_encoded(encode_program_change(channel, program))
    }

    pub fn send_mono_aftertouch(&mut self, channel: u8, pressure: u8) -> Result<(), SendError> {
        self.send_encoded(encode_mono_aftertouch(channel, pressure))
    }

    pub fn send_pitchbend(&mut self, channel: u8, lsb: u8, msb: u8) -> Result<(), SendError> {
        self.send_encoded(encode_pitchbend(channel, lsb, msb))
    }

    /// Send a System Exclusive message.
    ///
    /// The caller supplies the complete message including the
    /// 0xF0 and 0xF7 framing bytes. Fails with [`SendError::SizeExceeded`]
    /// independent of the [`ValidationPolicy`] if the message does not
    /// fit into a single packet.
    pub fn send_sysex(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        self.send_encoded(encode_sysex(bytes))
    }

    /// Send a status byte with 1 or 2 data bytes without any validation.
    pub fn send_raw_message(
        &mut self,
        status: u8,
        data1: u8,
        data2: Option<u8>,
    ) -> Result<(), SendError> {
        self.send_packet(&RawPacket::from_message(status, data1, data2))
    }

    pub fn send_event(&mut self, event: &MidiEvent) -> Result<(), SendError> {
        self.send_encoded(event.encode())
    }

    pub fn send_packet(&mut self, packet: &RawPacket) -> Result<(), SendError> {
        log::trace!(
            "Sending MIDI output: {ts} {bytes:02x?}",
            ts = packet.ts,
            bytes = packet.as_bytes()
        );
        self.connection.send_midi_output(packet)?;
        Ok(())
    }

    fn send_encoded(&mut self, encoded: Result<RawPacket, EncodeError>) -> Result<(), SendError> {
        let packet = match encoded {
            Ok(packet) => packet,
            Err(EncodeError::Invalid(err)) => match self.policy {
                ValidationPolicy::SilentDrop => {
                    log::debug!("Dropping outgoing MIDI message: {err}");
                    return Ok(());
                }
                ValidationPolicy::Reject => {
                    log::debug!("Rejecting outgoing MIDI message: {err}");
                    return Err(err.into());
                }
            },
            Err(EncodeError::SizeExceeded(err)) => {
                log::warn!("Rejecting outgoing SysEx message: {err}");
                return Err(err.into());
            }
        };
        self.send_packet(&packet)
    }
}
