// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

use std::ops::{Deref, DerefMut};

use crate::{Channel, DataByte, MidiEvent};

/// Receives decoded incoming MIDI events.
///
/// Callbacks are invoked synchronously on the thread that delivers
/// the incoming packets, in packet order.
pub trait MidiEventObserver: Send {
    fn received_note_off(&mut self, channel: Channel, note: DataByte, velocity: DataByte);

    fn received_note_on(&mut self, channel: Channel, note: DataByte, velocity: DataByte);

    fn received_poly_aftertouch(&mut self, channel: Channel, note: DataByte, pressure: DataByte);

    fn received_control_change(&mut self, channel: Channel, controller: DataByte, value: DataByte);

    fn received_program_change(&mut self, channel: Channel, program: DataByte);

    fn received_mono_aftertouch(&mut self, channel: Channel, pressure: DataByte);

    fn received_pitchbend(&mut self, channel: Channel, lsb: DataByte, msb: DataByte);

    /// `data` includes the leading 0xF0.
    fn received_sysex(&mut self, data: &[u8]);

    /// Diagnostic hook, invoked with the raw bytes of every packet
    /// before decoding.
    ///
    /// Also invoked for packets that are ignored afterwards. Does nothing
    /// by default.
    fn log_incoming_raw_midi_data(&mut self, _data: &[u8]) {}
}

impl<D> MidiEventObserver for D
where
    D: DerefMut + Send,
    <D as Deref>::Target: MidiEventObserver,
{
    fn received_note_off(&mut self, channel: Channel, note: DataByte, velocity: DataByte) {
        self.deref_mut().received_note_off(channel, note, velocity);
    }

    fn received_note_on(&mut self, channel: Channel, note: DataByte, velocity: DataByte) {
        self.deref_mut().received_note_on(channel, note, velocity);
    }

    fn received_poly_aftertouch(&mut self, channel: Channel, note: DataByte, pressure: DataByte) {
        self.deref_mut()
            .received_poly_aftertouch(channel, note, pressure);
    }

    fn received_control_change(&mut self, channel: Channel, controller: DataByte, value: DataByte) {
        self.deref_mut()
            .received_control_change(channel, controller, value);
    }

    fn received_program_change(&mut self, channel: Channel, program: DataByte) {
        self.deref_mut().received_program_change(channel, program);
    }

    fn received_mono_aftertouch(&mut self, channel: Channel, pressure: DataByte) {
        self.deref_mut().received_mono_aftertouch(channel, pressure);
    }

    fn received_pitchbend(&mut self, channel: Channel, lsb: DataByte, msb: DataByte) {
        self.deref_mut().received_pitchbend(channel, lsb, msb);
    }

    fn received_sysex(&mut self, data: &[u8]) {
        self.deref_mut().received_sysex(data);
    }

    fn log_incoming_raw_midi_data(&mut self, data: &[u8]) {
        self.deref_mut().log_incoming_raw_midi_data(data);
    }
}

pub type BoxedMidiEventObserver = Box<dyn MidiEventObserver + 'static>;

/// Invoke the callback that matches the event.
pub fn dispatch_midi_event<O>(observer: &mut O, event: &MidiEvent)
where
    O: MidiEventObserver + ?Sized,
{
    match *event {
        MidiEvent::NoteOff {
            channel,
            note,
            velocity,
        } => observer.received_note_off(channel, note, velocity),
        MidiEvent::NoteOn {
            channel,
            note,
            velocity,
        } => observer.received_note_on(channel, note, velocity),
        MidiEvent::PolyAftertouch {
            channel,
            note,
            pressure,
        } => observer.received_poly_aftertouch(channel, note, pressure),
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } => observer.received_control_change(channel, controller, value),
        MidiEvent::ProgramChange { channel, program } => {
            observer.received_program_change(channel, program);
        }
        MidiEvent::MonoAftertouch { channel, pressure } => {
            observer.received_mono_aftertouch(channel, pressure);
        }
        MidiEvent::Pitchbend { channel, lsb, msb } => {
            observer.received_pitchbend(channel, lsb, msb);
        }
        MidiEvent::SysEx { ref data } => observer.received_sysex(data),
    }
}
