use super::*;
use crate::document::{MidiDocument, MidiEvent};
use approx::assert_abs_diff_eq;

fn single_track(time_division: u16, events: Vec<MidiEvent>) -> MidiDocument {
    MidiDocument::new(time_division, vec![events]).unwrap()
}

#[test]
fn test_extract_single_quarter_note() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::tempo(0, 500_000),
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_off(480, 0, 60),
        ],
    );
    let result = extract_notes(&doc);
    assert!(result.is_ok());
    let timeline = result.unwrap();

    assert_eq!(timeline.len(), 1);
    let note = timeline.channel(0)[0];
    assert_eq!(note.pitch, 60);
    assert_eq!(note.channel, 0);
    assert_eq!(note.start, 0.0);
    assert_abs_diff_eq!(note.length, 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(note.velocity, 0.787, epsilon = 1e-3);
}

#[test]
fn test_empty_document_yields_sixteen_empty_channels() {
    let doc = MidiDocument::new(480, vec![]).unwrap();
    let timeline = extract_notes(&doc).unwrap();
    assert_eq!(timeline.channels().len(), CHANNEL_COUNT);
    assert!(timeline.channels().iter().all(Vec::is_empty));
}

#[test]
fn test_default_tempo_without_tempo_event() {
    let doc = single_track(
        96,
        vec![
            MidiEvent::note_on(96, 2, 64, 127),
            MidiEvent::note_off(192, 2, 64),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    let note = timeline.channel(2)[0];
    assert_abs_diff_eq!(note.start, 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(note.length, 0.5, epsilon = 1e-9);
    assert_eq!(note.velocity, 1.0);
}

#[test]
fn test_tempo_change_applies_from_its_own_tick() {
    // First beat at 120 BPM, then 60 BPM from tick 480 on.
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::tempo(480, 1_000_000),
            MidiEvent::note_off(480, 0, 60),
            MidiEvent::note_on(480, 0, 62, 100),
            MidiEvent::note_off(960, 0, 62),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    let notes = timeline.channel(0);
    assert_eq!(notes.len(), 2);

    // The tempo change does not stretch the beat before it.
    assert_abs_diff_eq!(notes[0].length, 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(notes[1].start, 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(notes[1].length, 1.0, epsilon = 1e-9);
}

#[test]
fn test_tempo_event_in_another_track() {
    let doc = MidiDocument::new(
        480,
        vec![
            vec![MidiEvent::tempo(0, 250_000)],
            vec![
                MidiEvent::note_on(0, 1, 48, 64),
                MidiEvent::note_off(480, 1, 48),
            ],
        ],
    )
    .unwrap();
    let timeline = extract_notes(&doc).unwrap();
    assert_abs_diff_eq!(timeline.channel(1)[0].length, 0.25, epsilon = 1e-9);
}

#[test]
fn test_velocity_zero_note_on_closes_note() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::new(240, 0x90, vec![60, 0]),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    assert_eq!(timeline.len(), 1);
    assert_abs_diff_eq!(timeline.channel(0)[0].length, 0.25, epsilon = 1e-9);
}

#[test]
fn test_retrigger_closes_previous_note() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_on(240, 0, 60, 80),
            MidiEvent::note_off(480, 0, 60),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    let notes = timeline.channel(0);
    assert_eq!(notes.len(), 2);
    assert_abs_diff_eq!(notes[0].length, 0.25, epsilon = 1e-9);
    assert_abs_diff_eq!(notes[1].start, 0.25, epsilon = 1e-9);
    assert_abs_diff_eq!(notes[1].length, 0.25, epsilon = 1e-9);
}

#[test]
fn test_same_pitch_on_different_channels_is_independent() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_on(0, 1, 60, 100),
            MidiEvent::note_off(240, 1, 60),
            MidiEvent::note_off(480, 0, 60),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    assert_abs_diff_eq!(timeline.channel(0)[0].length, 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(timeline.channel(1)[0].length, 0.25, epsilon = 1e-9);
}

#[test]
fn test_percussion_minimum_length() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 9, 36, 100),
            MidiEvent::note_off(0, 9, 36),
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_off(480, 0, 60),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    assert_eq!(timeline.channel(PERCUSSION_CHANNEL)[0].length, MIN_PERCUSSION_LENGTH);
}

#[test]
fn test_long_percussion_note_is_not_clamped() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 9, 38, 100),
            MidiEvent::note_off(480, 9, 38),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    assert_abs_diff_eq!(timeline.channel(9)[0].length, 0.5, epsilon = 1e-9);
}

#[test]
fn test_unterminated_notes_close_at_end_of_stream() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_on(480, 3, 67, 100),
            MidiEvent::new(960, 0x2F, vec![]),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    assert_abs_diff_eq!(timeline.channel(0)[0].length, 1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(timeline.channel(3)[0].length, 0.5, epsilon = 1e-9);
}

#[test]
fn test_notes_kept_in_note_on_order() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_on(240, 0, 64, 100),
            MidiEvent::note_on(240, 0, 67, 100),
            MidiEvent::note_off(960, 0, 67),
            MidiEvent::note_off(960, 0, 64),
            MidiEvent::note_off(960, 0, 60),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    let pitches: Vec<u8> = timeline.channel(0).iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![60, 64, 67]);
}

#[test]
fn test_note_off_without_note_on_is_ignored() {
    let doc = single_track(
        480,
        vec![MidiEvent::note_off(0, 0, 60), MidiEvent::note_off(480, 0, 61)],
    );
    assert!(extract_notes(&doc).unwrap().is_empty());
}

#[test]
fn test_malformed_tempo_fails_extraction() {
    let doc = MidiDocument {
        time_division: 480,
        duration: 0.0,
        tracks: vec![vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::new(240, 0x51, vec![0x07, 0xA1, 0x20, 0x00]),
            MidiEvent::note_off(480, 0, 60),
        ]],
    };
    let result = extract_notes(&doc);
    assert_eq!(
        result.unwrap_err(),
        crate::PlayerError::MalformedTempo { ticks: 240, len: 4 }
    );
}

#[test]
fn test_extraction_is_idempotent() {
    let doc = single_track(
        192,
        vec![
            MidiEvent::tempo(0, 600_000),
            MidiEvent::note_on(0, 0, 60, 90),
            MidiEvent::note_on(96, 9, 42, 70),
            MidiEvent::note_off(100, 9, 42),
            MidiEvent::tempo(192, 400_000),
            MidiEvent::note_off(384, 0, 60),
        ],
    );
    let before = doc.clone();
    let first = extract_notes(&doc).unwrap();
    let second = extract_notes(&doc).unwrap();
    assert_eq!(first, second);
    assert_eq!(doc, before);
}

#[test]
fn test_well_formed_notes_have_positive_length() {
    let mut events = vec![MidiEvent::tempo(0, 450_000)];
    for i in 0..32u64 {
        let channel = (i % 16) as u8;
        events.push(MidiEvent::note_on(i * 120, channel, 40 + i as u8, 90));
        events.push(MidiEvent::note_off(i * 120 + 60, channel, 40 + i as u8));
    }
    let doc = single_track(480, events);
    let timeline = extract_notes(&doc).unwrap();
    assert_eq!(timeline.len(), 32);
    for note in timeline.iter() {
        assert!(note.start >= 0.0);
        assert!(note.length > 0.0);
        if note.channel == PERCUSSION_CHANNEL {
            assert!(note.length >= MIN_PERCUSSION_LENGTH);
        }
    }
}

#[test]
fn test_by_start_orders_across_channels() {
    let doc = single_track(
        480,
        vec![
            MidiEvent::note_on(0, 5, 50, 100),
            MidiEvent::note_on(240, 1, 51, 100),
            MidiEvent::note_off(480, 5, 50),
            MidiEvent::note_off(480, 1, 51),
        ],
    );
    let timeline = extract_notes(&doc).unwrap();
    let starts: Vec<u8> = timeline.by_start().iter().map(|n| n.pitch).collect();
    assert_eq!(starts, vec![50, 51]);
    assert!(timeline.has_notes_after(0.1));
    assert!(!timeline.has_notes_after(0.25));
}

#[test]
fn test_timeline_serializes_as_channel_arrays() {
    let doc = single_track(
        480,
        vec![MidiEvent::note_on(0, 0, 60, 127), MidiEvent::note_off(480, 0, 60)],
    );
    let timeline = extract_notes(&doc).unwrap();
    let json = serde_json::to_value(&timeline).unwrap();
    let channels = json.as_array().unwrap();
    assert_eq!(channels.len(), 16);
    assert_eq!(channels[0][0]["pitch"], 60);
    assert_eq!(channels[0][0]["velocity"], 1.0);
}
