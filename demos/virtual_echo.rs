// SPDX-FileCopyrightText: The virmidi authors
// SPDX-License-Identifier: MPL-2.0

use std::{
    sync::mpsc::{channel, Sender},
    time::Duration,
};

use virmidi::{Channel, DataByte, DeviceConfig, MidiEvent, MidiEventObserver, VirtualMidiDevice};

/// Forwards all received events to the main thread.
#[derive(Debug)]
struct ForwardEvents {
    tx: Sender<MidiEvent>,
}

impl ForwardEvents {
    fn forward(&self, event: MidiEvent) {
        if self.tx.send(event).is_err() {
            log::warn!("Receiver disconnected");
        }
    }
}

impl MidiEventObserver for ForwardEvents {
    fn received_note_off(&mut self, channel: Channel, note: DataByte, velocity: DataByte) {
        self.forward(MidiEvent::NoteOff {
            channel,
            note,
            velocity,
        });
    }

    fn received_note_on(&mut self, channel: Channel, note: DataByte, velocity: DataByte) {
        self.forward(MidiEvent::NoteOn {
            channel,
            note,
            velocity,
        });
    }

    fn received_poly_aftertouch(&mut self, channel: Channel, note: DataByte, pressure: DataByte) {
        self.forward(MidiEvent::PolyAftertouch {
            channel,
            note,
            pressure,
        });
    }

    fn received_control_change(&mut self, channel: Channel, controller: DataByte, value: DataByte) {
        self.forward(MidiEvent::ControlChange {
            channel,
            controller,
            value,
        });
    }

    fn received_program_change(&mut self, channel: Channel, program: DataByte) {
        self.forward(MidiEvent::ProgramChange { channel, program });
    }

    fn received_mono_aftertouch(&mut self, channel: Channel, pressure: DataByte) {
        self.forward(MidiEvent::MonoAftertouch { channel, pressure });
    }

    fn received_pitchbend(&mut self, channel: Channel, lsb: DataByte, msb: DataByte) {
        self.forward(MidiEvent::Pitchbend { channel, lsb, msb });
    }

    fn received_sysex(&mut self, data: &[u8]) {
        self.forward(MidiEvent::SysEx {
            data: data.to_vec(),
        });
    }

    fn log_incoming_raw_midi_data(&mut self, data: &[u8]) {
        let msg = data
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("MIDI received: {msg} length: {len}", len = data.len());
    }
}

fn main() {
    pretty_env_logger::init();
    match run() {
        Ok(()) => (),
        Err(err) => println!("Error: {err}"),
    }
}

fn run() -> anyhow::Result<()> {
    let config = DeviceConfig::new("virmidi echo");
    let (tx, rx) = channel();
    let mut device = VirtualMidiDevice::create(config, Some(Box::new(ForwardEvents { tx })))
        .map_err(|err| anyhow::anyhow!("{err}"))?;
    println!(
        "Connect to \"{input}\" and \"{output}\", press CTRL-C to exit...",
        input = device.config().input_port_name(),
        output = device.config().output_port_name(),
    );
    loop {
        let event = match rx.recv_timeout(Duration::from_millis(1000)) {
            Ok(event) => event,
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };
        println!("Echoing {event:?}");
        device.encoder_mut().send_event(&event)?;
    }
    device.close();
    Ok(())
}
