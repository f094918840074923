//! Standard MIDI File decoding via `midly`.
//!
//! [`SmfDecoder`] turns raw `.mid` bytes into a [`MidiDocument`]: delta times become
//! absolute ticks, channel messages are re-encoded to status and data bytes, and meta
//! events keep their meta type as the status byte.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::document::{MidiDecoder, MidiDocument, MidiEvent};
use crate::error::PlayerError;

const SYSEX: u8 = 0xF0;
const ESCAPE: u8 = 0xF7;

/// Decoder for Standard MIDI Files with metrical (ticks per quarter) timing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmfDecoder;

impl MidiDecoder for SmfDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<MidiDocument, PlayerError> {
        let smf = Smf::parse(bytes).map_err(|e| PlayerError::DecodeFailure(e.to_string()))?;

        let time_division = match smf.header.timing {
            Timing::Metrical(ticks_per_quarter) => ticks_per_quarter.as_int(),
            Timing::Timecode(..) => {
                return Err(PlayerError::DecodeFailure(
                    "SMPTE timecode division is not supported".to_string(),
                ))
            }
        };

        let tracks: Vec<Vec<MidiEvent>> = smf
            .tracks
            .iter()
            .map(|track| {
                let mut ticks = 0u64;
                track
                    .iter()
                    .filter_map(|event| {
                        ticks += u64::from(event.delta.as_int());
                        convert(ticks, event.kind)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        MidiDocument::new(time_division, tracks)
    }
}

fn convert(ticks: u64, kind: TrackEventKind<'_>) -> Option<MidiEvent> {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let (status, data) = channel_message(message);
            Some(MidiEvent::new(ticks, status | channel.as_int(), data))
        }
        TrackEventKind::SysEx(bytes) => Some(MidiEvent::new(ticks, SYSEX, bytes.to_vec())),
        TrackEventKind::Escape(bytes) => Some(MidiEvent::new(ticks, ESCAPE, bytes.to_vec())),
        TrackEventKind::Meta(meta) => {
            meta_message(meta).map(|(kind, data)| MidiEvent::new(ticks, kind, data))
        }
    }
}

fn channel_message(message: MidiMessage) -> (u8, Vec<u8>) {
    match message {
        MidiMessage::NoteOff { key, vel } => (0x80, vec![key.as_int(), vel.as_int()]),
        MidiMessage::NoteOn { key, vel } => (0x90, vec![key.as_int(), vel.as_int()]),
        MidiMessage::Aftertouch { key, vel } => (0xA0, vec![key.as_int(), vel.as_int()]),
        MidiMessage::Controller { controller, value } => {
            (0xB0, vec![controller.as_int(), value.as_int()])
        }
        MidiMessage::ProgramChange { program } => (0xC0, vec![program.as_int()]),
        MidiMessage::ChannelAftertouch { vel } => (0xD0, vec![vel.as_int()]),
        MidiMessage::PitchBend { bend } => {
            let raw = bend.0.as_int();
            (0xE0, vec![(raw & 0x7F) as u8, (raw >> 7) as u8])
        }
    }
}

/// Meta type byte and payload. Returns `None` for meta events with no useful payload.
fn meta_message(meta: MetaMessage<'_>) -> Option<(u8, Vec<u8>)> {
    let encoded = match meta {
        MetaMessage::Text(text) => (0x01, text.to_vec()),
        MetaMessage::Copyright(text) => (0x02, text.to_vec()),
        MetaMessage::TrackName(name) => (0x03, name.to_vec()),
        MetaMessage::InstrumentName(name) => (0x04, name.to_vec()),
        MetaMessage::Lyric(text) => (0x05, text.to_vec()),
        MetaMessage::Marker(text) => (0x06, text.to_vec()),
        MetaMessage::CuePoint(text) => (0x07, text.to_vec()),
        MetaMessage::EndOfTrack => (0x2F, Vec::new()),
        MetaMessage::Tempo(us_per_quarter) => {
            let [_, a, b, c] = us_per_quarter.as_int().to_be_bytes();
            (crate::document::META_SET_TEMPO, vec![a, b, c])
        }
        MetaMessage::TimeSignature(num, den, clocks, notes) => {
            (0x58, vec![num, den, clocks, notes])
        }
        MetaMessage::KeySignature(sharps, minor) => (0x59, vec![sharps as u8, u8::from(minor)]),
        MetaMessage::SequencerSpecific(data) => (0x7F, data.to_vec()),
        MetaMessage::Unknown(kind, data) => (kind, data.to_vec()),
        _ => return None,
    };
    Some(encoded)
}
