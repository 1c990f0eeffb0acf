// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    dispatch_midi_event, BoxedMidiEventObserver, Channel, DataByte, MidiEvent, MidiInputHandler,
    PacketList, RawPacket, StatusKind, TimeStamp, SYSEX_START,
};

#[cfg(test)]
mod tests;

/// Reason for ignoring an incoming packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty packet")]
    Empty,

    #[error("unknown status byte {0:#04x}")]
    UnknownStatus(u8),

    #[error("truncated {kind} message with {len} of {expected} bytes")]
    Truncated {
        kind: StatusKind,
        len: usize,
        expected: usize,
    },

    #[error("invalid data byte {0:#04x}")]
    InvalidDataByte(u8),
}

/// Decode the first message of a packet.
///
/// Channel messages are decoded from the leading status and data
/// bytes, trailing bytes are ignored. A leading 0xF0 turns the whole
/// packet into a SysEx event.
pub fn try_decode_midi_event(input: &[u8]) -> Result<MidiEvent, DecodeError> {
    let Some(&status) = input.first() else {
        return Err(DecodeError::Empty);
    };
    if status == SYSEX_START {
        return Ok(MidiEvent::SysEx {
            data: input.to_vec(),
        });
    }
    let Some(kind) = StatusKind::from_status_byte(status) else {
        return Err(DecodeError::UnknownStatus(status));
    };
    let expected = 1 + kind.data_len();
    let Some(data_bytes) = input.get(1..expected) else {
        return Err(DecodeError::Truncated {
            kind,
            len: input.len(),
            expected,
        });
    };
    let mut data = [DataByte::MIN; 2];
    for (decoded, &byte) in data.iter_mut().zip(data_bytes) {
        *decoded = DataByte::new(byte).map_err(|_| DecodeError::InvalidDataByte(byte))?;
    }
    let [data1, data2] = data;
    let channel = Channel::from_nibble(status);
    let event = match kind {
        StatusKind::NoteOff => MidiEvent::NoteOff {
            channel,
            note: data1,
            velocity: data2,
        },
        StatusKind::NoteOn => MidiEvent::NoteOn {
            channel,
            note: data1,
            velocity: data2,
        },
        StatusKind::PolyAftertouch => MidiEvent::PolyAftertouch {
            channel,
            note: data1,
            pressure: data2,
        },
        StatusKind::ControlChange => MidiEvent::ControlChange {
            channel,
            controller: data1,
            value: data2,
        },
        StatusKind::ProgramChange => MidiEvent::ProgramChange {
            channel,
            program: data1,
        },
        StatusKind::MonoAftertouch => MidiEvent::MonoAftertouch {
            channel,
            pressure: data1,
        },
        StatusKind::Pitchbend => MidiEvent::Pitchbend {
            channel,
            lsb: data1,
            msb: data2,
        },
        // System common and real-time messages other than SysEx
        StatusKind::SysEx => return Err(DecodeError::UnknownStatus(status)),
    };
    Ok(event)
}

/// Lazily decode all recognized events in packet order.
///
/// Unrecognized packets are skipped.
pub fn decode_packet_list(packets: &PacketList) -> impl Iterator<Item = MidiEvent> + '_ {
    packets
        .iter()
        .filter_map(|packet| match try_decode_midi_event(packet.as_bytes()) {
            Ok(event) => Some(event),
            Err(err) => {
                log::debug!(
                    "Skipping MIDI input {bytes:02x?}: {err}",
                    bytes = packet.as_bytes()
                );
                None
            }
        })
}

/// Decodes incoming packets and dispatches the events to the
/// attached observer.
#[allow(missing_debug_implementations)]
#[derive(Default)]
pub struct Decoder {
    observer: Option<BoxedMidiEventObserver>,
}

impl Decoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { observer: None }
    }

    #[must_use]
    pub fn with_observer(observer: BoxedMidiEventObserver) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.observer.is_some()
    }

    /// Attach an observer, replacing and returning the current one.
    pub fn attach_observer(
        &mut self,
        observer: BoxedMidiEventObserver,
    ) -> Option<BoxedMidiEventObserver> {
        let detached = self.detach_observer();
        if detached.is_some() {
            log::warn!("Replaced existing MIDI event observer");
        }
        log::info!("Attaching MIDI event observer");
        self.observer = Some(observer);
        detached
    }

    pub fn detach_observer(&mut self) -> Option<BoxedMidiEventObserver> {
        let observer = self.observer.take()?;
        log::info!("Detaching MIDI event observer");
        Some(observer)
    }

    /// Process all packets of a list in order.
    ///
    /// Returns the number of events that have been dispatched.
    pub fn process_packet_list(&mut self, packets: &PacketList) -> usize {
        packets
            .iter()
            .filter(|packet| self.process_packet(packet))
            .count()
    }

    /// Returns `true` if an event has been dispatched.
    pub fn process_packet(&mut self, packet: &RawPacket) -> bool {
        let input = packet.as_bytes();
        log::trace!("Received MIDI input: {ts} {input:02x?}", ts = packet.ts);
        let Some(observer) = &mut self.observer else {
            log::debug!("Ignoring MIDI input {input:02x?}: No observer attached");
            return false;
        };
        observer.log_incoming_raw_midi_data(input);
        match try_decode_midi_event(input) {
            Ok(event) => {
                dispatch_midi_event(&mut **observer, &event);
                true
            }
            Err(err) => {
                log::debug!("Ignoring MIDI input {input:02x?}: {err}");
                false
            }
        }
    }
}

impl MidiInputHandler for Decoder {
    fn handle_midi_input(&mut self, ts: TimeStamp, input: &[u8]) -> bool {
        match RawPacket::try_from_slice(ts, input) {
            Ok(packet) => self.process_packet(&packet),
            Err(err) => {
                log::warn!("Ignoring MIDI input: {err}");
                false
            }
        }
    }
}

/// A [`Decoder`] shared between the transport thread that delivers
/// incoming packets and the owner that replaces the observer.
///
/// Cloning yields another handle to the same decoder. Replacing the
/// observer through any handle takes effect for the next packet.
#[allow(missing_debug_implementations)]
#[derive(Clone, Default)]
pub struct SharedDecoder(Arc<Mutex<Decoder>>);

impl SharedDecoder {
    #[must_use]
    pub fn new(decoder: Decoder) -> Self {
        Self(Arc::new(Mutex::new(decoder)))
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.0.lock().is_attached()
    }

    /// Attach an observer, replacing and returning the current one.
    pub fn attach_observer(
        &self,
        observer: BoxedMidiEventObserver,
    ) -> Option<BoxedMidiEventObserver> {
        self.0.lock().attach_observer(observer)
    }

    pub fn detach_observer(&self) -> Option<BoxedMidiEventObserver> {
        self.0.lock().detach_observer()
    }

    pub fn process_packet_list(&self, packets: &PacketList) -> usize {
        self.0.lock().process_packet_list(packets)
    }
}

impl From<Decoder> for SharedDecoder {
    fn from(from: Decoder) -> Self {
        Self::new(from)
    }
}

impl MidiInputHandler for SharedDecoder {
    fn handle_midi_input(&mut self, ts: TimeStamp, input: &[u8]) -> bool {
        self.0.lock().handle_midi_input(ts, input)
    }
}
