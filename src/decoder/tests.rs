// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

use std::sync::{Arc, Mutex};

use super::*;
use crate::{
    encode_control_change, encode_mono_aftertouch, encode_note_off, encode_note_on,
    encode_pitchbend, encode_poly_aftertouch, encode_program_change, MidiEventObserver,
    MAX_PACKET_LEN,
};

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<MidiEvent>,
    raw: Vec<Vec<u8>>,
}

/// Records all callbacks into a shared log.
#[derive(Debug, Clone, Default)]
struct RecordingObserver {
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<MidiEvent> {
        self.recorded.lock().unwrap().events.clone()
    }

    fn raw(&self) -> Vec<Vec<u8>> {
        self.recorded.lock().unwrap().raw.clone()
    }

    fn push(&self, event: MidiEvent) {
        self.recorded.lock().unwrap().events.push(event);
    }
}

impl MidiEventObserver for RecordingObserver {
    fn received_note_off(&mut self, channel: Channel, note: DataByte, velocity: DataByte) {
        self.push(MidiEvent::NoteOff {
            channel,
            note,
            velocity,
        });
    }

    fn received_note_on(&mut self, channel: Channel, note: DataByte, velocity: DataByte) {
        self.push(MidiEvent::NoteOn {
            channel,
            note,
            velocity,
        });
    }

    fn received_poly_aftertouch(&mut self, channel: Channel, note: DataByte, pressure: DataByte) {
        self.push(MidiEvent::PolyAftertouch {
            channel,
            note,
            pressure,
        });
    }

    fn received_control_change(&mut self, channel: Channel, controller: DataByte, value: DataByte) {
        self.push(MidiEvent::ControlChange {
            channel,
            controller,
            value,
        });
    }

    fn received_program_change(&mut self, channel: Channel, program: DataByte) {
        self.push(MidiEvent::ProgramChange { channel, program });
    }

    fn received_mono_aftertouch(&mut self, channel: Channel, pressure: DataByte) {
        self.push(MidiEvent::MonoAftertouch { channel, pressure });
    }

    fn received_pitchbend(&mut self, channel: Channel, lsb: DataByte, msb: DataByte) {
        self.push(MidiEvent::Pitchbend { channel, lsb, msb });
    }

    fn received_sysex(&mut self, data: &[u8]) {
        self.push(MidiEvent::SysEx {
            data: data.to_vec(),
        });
    }

    fn log_incoming_raw_midi_data(&mut self, data: &[u8]) {
        self.recorded.lock().unwrap().raw.push(data.to_vec());
    }
}

/// Observer that only implements the mandatory callbacks.
#[derive(Debug, Default)]
struct CountingObserver {
    count: usize,
}

impl MidiEventObserver for CountingObserver {
    fn received_note_off(&mut self, _: Channel, _: DataByte, _: DataByte) {
        self.count += 1;
    }

    fn received_note_on(&mut self, _: Channel, _: DataByte, _: DataByte) {
        self.count += 1;
    }

    fn received_poly_aftertouch(&mut self, _: Channel, _: DataByte, _: DataByte) {
        self.count += 1;
    }

    fn received_control_change(&mut self, _: Channel, _: DataByte, _: DataByte) {
        self.count += 1;
    }

    fn received_program_change(&mut self, _: Channel, _: DataByte) {
        self.count += 1;
    }

    fn received_mono_aftertouch(&mut self, _: Channel, _: DataByte) {
        self.count += 1;
    }

    fn received_pitchbend(&mut self, _: Channel, _: DataByte, _: DataByte) {
        self.count += 1;
    }

    fn received_sysex(&mut self, _: &[u8]) {
        self.count += 1;
    }
}

fn packet(bytes: &[u8]) -> RawPacket {
    RawPacket::try_from_slice(TimeStamp::NOW, bytes).unwrap()
}

fn channel(value: u8) -> Channel {
    Channel::new(value).unwrap()
}

fn data(value: u8) -> DataByte {
    DataByte::new(value).unwrap()
}

fn new_decoder() -> (Decoder, RecordingObserver) {
    let observer = RecordingObserver::default();
    let decoder = Decoder::with_observer(Box::new(observer.clone()));
    (decoder, observer)
}

#[test]
fn note_on_then_note_off() {
    let (mut decoder, observer) = new_decoder();
    let packets = [packet(&[0x90, 60, 100]), packet(&[0x80, 60, 0])]
        .into_iter()
        .collect::<PacketList>();
    assert_eq!(2, decoder.process_packet_list(&packets));
    assert_eq!(
        vec![
            MidiEvent::NoteOn {
                channel: channel(1),
                note: data(60),
                velocity: data(100),
            },
            MidiEvent::NoteOff {
                channel: channel(1),
                note: data(60),
                velocity: data(0),
            },
        ],
        observer.events()
    );
}

#[test]
fn sysex_contains_all_bytes() {
    let (mut decoder, observer) = new_decoder();
    assert!(decoder.process_packet(&packet(&[0xf0, 0x7e, 0x00, 0xf7])));
    let events = observer.events();
    assert_eq!(
        vec![MidiEvent::SysEx {
            data: vec![0xf0, 0x7e, 0x00, 0xf7]
        }],
        events
    );
    let MidiEvent::SysEx { data } = &events[0] else {
        unreachable!();
    };
    assert_eq!(4, data.len());
}

#[test]
fn unrecognized_status_is_ignored() {
    let (mut decoder, observer) = new_decoder();
    assert!(!decoder.process_packet(&packet(&[0x00, 60, 100])));
    assert!(!decoder.process_packet(&packet(&[0x7f])));
    assert!(observer.events().is_empty());
}

#[test]
fn system_messages_other_than_sysex_are_ignored() {
    let (mut decoder, observer) = new_decoder();
    // MIDI clock, start, active sensing, song position
    for bytes in [&[0xf8][..], &[0xfa], &[0xfe], &[0xf2, 0x00, 0x00]] {
        assert!(!decoder.process_packet(&packet(bytes)));
    }
    assert!(observer.events().is_empty());
    assert_eq!(
        Err(DecodeError::UnknownStatus(0xf8)),
        try_decode_midi_event(&[0xf8])
    );
}

#[test]
fn empty_packet_is_ignored() {
    let (mut decoder, observer) = new_decoder();
    assert!(!decoder.process_packet(&packet(&[])));
    assert!(observer.events().is_empty());
    assert_eq!(vec![Vec::<u8>::new()], observer.raw());
    assert_eq!(Err(DecodeError::Empty), try_decode_midi_event(&[]));
}

#[test]
fn truncated_packet_is_ignored() {
    let (mut decoder, observer) = new_decoder();
    assert!(!decoder.process_packet(&packet(&[0x90, 60])));
    assert!(!decoder.process_packet(&packet(&[0xc0])));
    assert!(observer.events().is_empty());
    assert_eq!(
        Err(DecodeError::Truncated {
            kind: StatusKind::NoteOn,
            len: 2,
            expected: 3,
        }),
        try_decode_midi_event(&[0x90, 60])
    );
}

#[test]
fn decode_error_names_the_message_kind() {
    assert_eq!(
        "truncated NoteOn message with 2 of 3 bytes",
        try_decode_midi_event(&[0x90, 60]).unwrap_err().to_string()
    );
    assert_eq!(
        "unknown status byte 0xf8",
        try_decode_midi_event(&[0xf8]).unwrap_err().to_string()
    );
}

#[test]
fn invalid_data_byte_is_ignored() {
    assert_eq!(
        Err(DecodeError::InvalidDataByte(0x80)),
        try_decode_midi_event(&[0x90, 0x80, 0x40])
    );
    assert_eq!(
        Err(DecodeError::InvalidDataByte(0xff)),
        try_decode_midi_event(&[0xd0, 0xff])
    );
}

#[test]
fn channel_is_derived_from_low_nibble() {
    for value in 1..=16 {
        let status = 0xb0 | (value - 1);
        assert_eq!(
            Ok(MidiEvent::ControlChange {
                channel: channel(value),
                controller: data(7),
                value: data(127),
            }),
            try_decode_midi_event(&[status, 7, 127])
        );
    }
}

#[test]
fn single_data_byte_messages() {
    assert_eq!(
        Ok(MidiEvent::ProgramChange {
            channel: channel(16),
            program: data(5),
        }),
        try_decode_midi_event(&[0xcf, 5])
    );
    // Trailing bytes are ignored
    assert_eq!(
        Ok(MidiEvent::MonoAftertouch {
            channel: channel(2),
            pressure: data(64),
        }),
        try_decode_midi_event(&[0xd1, 64, 0x99])
    );
}

#[test]
fn raw_data_is_logged_for_every_packet() {
    let (mut decoder, observer) = new_decoder();
    let packets = [
        packet(&[0x00]),
        packet(&[0x90, 60, 100]),
        packet(&[0xf8]),
    ]
    .into_iter()
    .collect::<PacketList>();
    assert_eq!(1, decoder.process_packet_list(&packets));
    assert_eq!(
        vec![vec![0x00], vec![0x90, 60, 100], vec![0xf8]],
        observer.raw()
    );
    assert_eq!(1, observer.events().len());
}

#[test]
fn traversal_stops_at_declared_count() {
    let (mut decoder, observer) = new_decoder();
    let packets = PacketList::with_declared_count(
        1,
        vec![packet(&[0x90, 60, 100]), packet(&[0x80, 60, 0])],
    );
    assert_eq!(1, decoder.process_packet_list(&packets));
    assert_eq!(1, observer.events().len());
    assert_eq!(1, observer.raw().len());
}

#[test]
fn replacing_the_observer() {
    let (mut decoder, first) = new_decoder();
    let second = RecordingObserver::default();
    assert!(decoder.process_packet(&packet(&[0x90, 1, 1])));
    assert!(decoder
        .attach_observer(Box::new(second.clone()))
        .is_some());
    assert!(decoder.process_packet(&packet(&[0x90, 2, 2])));
    assert_eq!(1, first.events().len());
    assert_eq!(1, second.events().len());

    assert!(decoder.detach_observer().is_some());
    assert!(!decoder.is_attached());
    assert!(!decoder.process_packet(&packet(&[0x90, 3, 3])));
    assert_eq!(1, second.events().len());
}

#[test]
fn replacing_the_observer_of_a_shared_decoder_keeps_the_handler_live() {
    let first = RecordingObserver::default();
    let shared = SharedDecoder::new(Decoder::with_observer(Box::new(first.clone())));
    // The transport owns its own handle for the lifetime of the port
    let mut input_handler = shared.clone();
    let ts = TimeStamp::from_micros(1);
    assert!(input_handler.handle_midi_input(ts, &[0x90, 1, 1]));

    let second = RecordingObserver::default();
    assert!(shared.attach_observer(Box::new(second.clone())).is_some());
    assert!(input_handler.handle_midi_input(ts, &[0x90, 2, 2]));
    assert_eq!(1, first.events().len());
    assert_eq!(1, second.events().len());

    assert!(shared.detach_observer().is_some());
    assert!(!shared.is_attached());
    assert!(!input_handler.handle_midi_input(ts, &[0x90, 3, 3]));

    let third = RecordingObserver::default();
    assert!(shared.attach_observer(Box::new(third.clone())).is_none());
    let packets = PacketList::from(packet(&[0xc0, 4]));
    assert_eq!(1, shared.process_packet_list(&packets));
    assert!(input_handler.handle_midi_input(ts, &[0xc0, 5]));
    assert_eq!(1, second.events().len());
    assert_eq!(2, third.events().len());
}

#[test]
fn shared_decoder_is_driven_from_the_transport_thread() {
    let observer = RecordingObserver::default();
    let shared = SharedDecoder::from(Decoder::new());
    let mut input_handler = shared.clone();
    let transport = std::thread::spawn(move || {
        input_handler.handle_midi_input(TimeStamp::NOW, &[0xb0, 7, 100])
    });
    // Unhandled while no observer is attached
    assert!(!transport.join().unwrap());
    shared.attach_observer(Box::new(observer.clone()));
    let mut input_handler = shared.clone();
    let transport = std::thread::spawn(move || {
        input_handler.handle_midi_input(TimeStamp::NOW, &[0xb0, 7, 100])
    });
    assert!(transport.join().unwrap());
    assert_eq!(1, observer.events().len());
}

#[test]
fn raw_data_hook_is_optional() {
    let mut decoder = Decoder::new();
    decoder.attach_observer(Box::new(CountingObserver::default()));
    let packets = [packet(&[0xe0, 0, 64]), packet(&[0xf0, 0xf7])]
        .into_iter()
        .collect::<PacketList>();
    assert_eq!(2, decoder.process_packet_list(&packets));
}

#[test]
fn input_handler() {
    let (mut decoder, observer) = new_decoder();
    let ts = TimeStamp::from_micros(1234);
    assert!(decoder.handle_midi_input(ts, &[0xa0, 60, 10]));
    assert!(!decoder.handle_midi_input(ts, &[0xf0; MAX_PACKET_LEN + 1]));
    assert_eq!(
        vec![MidiEvent::PolyAftertouch {
            channel: channel(1),
            note: data(60),
            pressure: data(10),
        }],
        observer.events()
    );
}

#[test]
fn lazy_packet_list_decoding() {
    let packets = [
        packet(&[0xb0, 1, 2]),
        packet(&[]),
        packet(&[0xe5, 0, 0x40]),
    ]
    .into_iter()
    .collect::<PacketList>();
    let mut events = decode_packet_list(&packets);
    assert!(matches!(
        events.next(),
        Some(MidiEvent::ControlChange { .. })
    ));
    assert_eq!(
        Some(8192),
        events.next().and_then(|event| event.pitchbend_value())
    );
    assert!(events.next().is_none());
}

#[test]
fn round_trip() {
    for ch in [1, 9, 16] {
        for (value1, value2) in [(0, 0), (60, 100), (127, 127)] {
            let packets = [
                encode_note_off(ch, value1, value2),
                encode_note_on(ch, value1, value2),
                encode_poly_aftertouch(ch, value1, value2),
                encode_control_change(ch, value1, value2),
                encode_program_change(ch, value1),
                encode_mono_aftertouch(ch, value1),
                encode_pitchbend(ch, value1, value2),
            ]
            .into_iter()
            .map(Result::unwrap)
            .collect::<PacketList>();
            let (ch, data1, data2) = (channel(ch), data(value1), data(value2));
            assert_eq!(
                vec![
                    MidiEvent::NoteOff {
                        channel: ch,
                        note: data1,
                        velocity: data2,
                    },
                    MidiEvent::NoteOn {
                        channel: ch,
                        note: data1,
                        velocity: data2,
                    },
                    MidiEvent::PolyAftertouch {
                        channel: ch,
                        note: data1,
                        pressure: data2,
                    },
                    MidiEvent::ControlChange {
                        channel: ch,
                        controller: data1,
                        value: data2,
                    },
                    MidiEvent::ProgramChange {
                        channel: ch,
                        program: data1,
                    },
                    MidiEvent::MonoAftertouch {
                        channel: ch,
                        pressure: data1,
                    },
                    MidiEvent::Pitchbend {
                        channel: ch,
                        lsb: data1,
                        msb: data2,
                    },
                ],
                decode_packet_list(&packets).collect::<Vec<_>>()
            );
        }
    }
}

#[test]
fn event_encode_round_trip() {
    let event = MidiEvent::ControlChange {
        channel: channel(11),
        controller: data(64),
        value: data(127),
    };
    let packet = event.encode().unwrap();
    assert_eq!(&[0xba, 64, 127], packet.as_bytes());
    assert_eq!(Ok(event), try_decode_midi_event(packet.as_bytes()));
}
