use std::rc::Rc;

use super::*;
use crate::document::{MidiDocument, MidiEvent};
use crate::error::PlayerError;
use crate::notes::{extract_notes, NoteTimeline};

/// Three quarter notes at 120 BPM: C at 0.0s, D at 0.5s, E at 1.0s. Duration 1.5s.
fn scale() -> (Rc<MidiDocument>, NoteTimeline) {
    let mut events = vec![MidiEvent::tempo(0, 500_000)];
    for (i, pitch) in [60u8, 62, 64].into_iter().enumerate() {
        let start = i as u64 * 480;
        events.push(MidiEvent::note_on(start, 0, pitch, 100));
        events.push(MidiEvent::note_off(start + 480, 0, pitch));
    }
    let doc = MidiDocument::new(480, vec![events]).unwrap();
    let notes = extract_notes(&doc).unwrap();
    (Rc::new(doc), notes)
}

fn bank(url: &str) -> InstrumentBank {
    InstrumentBank::new(url, Vec::new())
}

fn loaded() -> (PlaybackController, VirtualTransportFactory) {
    let mut factory = VirtualTransportFactory::new(VirtualClock::new());
    let mut controller = PlaybackController::new();
    let (doc, notes) = scale();
    controller
        .load(doc, &notes, &bank("bank-a"), &mut factory)
        .unwrap();
    (controller, factory)
}

fn note_pitches(signals: &[TransportSignal]) -> Vec<u8> {
    signals
        .iter()
        .filter_map(|s| match s {
            TransportSignal::Note(note) => Some(note.pitch),
            _ => None,
        })
        .collect()
}

#[test]
fn test_new_controller_is_unloaded() {
    let mut controller = PlaybackController::new();
    assert_eq!(controller.state(), PlaybackState::Unloaded);
    assert!(!controller.play());
    assert_eq!(controller.set_current_time(1.0), Err(PlayerError::NoContent));
    assert_eq!(controller.duration(), 0.0);
}

#[test]
fn test_load_makes_controller_ready() {
    let (controller, factory) = loaded();
    assert_eq!(controller.state(), PlaybackState::Ready);
    assert_eq!(controller.bank_url(), Some("bank-a"));
    assert!((controller.duration() - 1.5).abs() < 1e-9);
    assert_eq!(factory.stats().created(), 1);
    assert_eq!(factory.stats().song_loads(), 1);
}

#[test]
fn test_play_and_pause_transitions() {
    let (mut controller, factory) = loaded();
    assert!(controller.play());
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert!(!controller.play(), "play while playing is a no-op");

    factory.clock().advance(0.3);
    controller.poll();
    assert!(controller.pause());
    assert_eq!(controller.state(), PlaybackState::Ready);
    assert!(!controller.pause(), "pause while ready is a no-op");
    assert!((controller.current_time() - 0.3).abs() < 1e-9);

    // Time passing while paused does not move the transport.
    factory.clock().advance(1.0);
    assert!(controller.play());
    factory.clock().advance(0.1);
    controller.poll();
    assert!((controller.current_time() - 0.4).abs() < 1e-9);
}

#[test]
fn test_poll_reports_crossed_notes_in_order() {
    let (mut controller, factory) = loaded();
    controller.play();

    let first = controller.poll();
    assert_eq!(note_pitches(&first), vec![60]);

    factory.clock().advance(0.6);
    let second = controller.poll();
    assert_eq!(note_pitches(&second), vec![62]);
    assert!(matches!(second.last(), Some(TransportSignal::Position(t)) if (t - 0.6).abs() < 1e-9));

    factory.clock().advance(0.1);
    assert!(note_pitches(&controller.poll()).is_empty());
}

#[test]
fn test_poll_while_not_playing_is_silent() {
    let (mut controller, factory) = loaded();
    factory.clock().advance(1.0);
    assert!(controller.poll().is_empty());
}

#[test]
fn test_natural_end_reports_finished() {
    let (mut controller, factory) = loaded();
    controller.play();
    factory.clock().advance(2.0);
    let signals = controller.poll();
    assert_eq!(note_pitches(&signals), vec![60, 62, 64]);
    assert_eq!(signals.last(), Some(&TransportSignal::Finished));
    assert_eq!(controller.state(), PlaybackState::Ready);
    assert!((controller.current_time() - 1.5).abs() < 1e-9);
}

#[test]
fn test_seek_keeps_play_state_and_moves_cursor() {
    let (mut controller, factory) = loaded();
    controller.play();
    controller.poll();

    controller.set_current_time(1.0).unwrap();
    assert!(controller.is_playing());
    let signals = controller.poll();
    assert_eq!(note_pitches(&signals), vec![64], "no replay of skipped notes");

    // Seeking backwards announces the earlier notes again.
    controller.set_current_time(0.5).unwrap();
    factory.clock().advance(0.1);
    assert_eq!(note_pitches(&controller.poll()), vec![62]);
}

#[test]
fn test_seek_while_ready_does_not_start() {
    let (mut controller, _factory) = loaded();
    controller.set_current_time(0.75).unwrap();
    assert_eq!(controller.state(), PlaybackState::Ready);
    assert_eq!(controller.current_time(), 0.75);
}

#[test]
fn test_seek_is_clamped_to_document() {
    let (mut controller, _factory) = loaded();
    controller.set_current_time(99.0).unwrap();
    assert!((controller.current_time() - 1.5).abs() < 1e-9);
    controller.set_current_time(-3.0).unwrap();
    assert_eq!(controller.current_time(), 0.0);
}

#[test]
fn test_reload_with_same_bank_reuses_backend() {
    let (mut controller, mut factory) = loaded();
    let (doc, notes) = scale();
    controller
        .load(doc, &notes, &bank("bank-a"), &mut factory)
        .unwrap();
    let stats = factory.stats();
    assert_eq!(stats.created(), 1);
    assert_eq!(stats.live(), 1);
    assert_eq!(stats.song_loads(), 2);
}

#[test]
fn test_reload_with_new_bank_replaces_backend() {
    let (mut controller, mut factory) = loaded();
    let (doc, notes) = scale();
    controller
        .load(doc, &notes, &bank("bank-b"), &mut factory)
        .unwrap();
    let stats = factory.stats();
    assert_eq!(stats.created(), 2);
    assert_eq!(stats.live(), 1, "old backend released before the new one");
    assert_eq!(controller.bank_url(), Some("bank-b"));
}

#[test]
fn test_backend_failure_enters_error_and_recovers() {
    let (mut controller, mut factory) = loaded();
    factory.set_unavailable(true);
    let (doc, notes) = scale();
    let result = controller.load(doc.clone(), &notes, &bank("bank-b"), &mut factory);
    assert!(matches!(result, Err(PlayerError::BackendInitFailure(_))));
    assert_eq!(controller.state(), PlaybackState::Error);
    assert!(!controller.is_loaded());
    assert_eq!(factory.stats().live(), 0);

    factory.set_unavailable(false);
    controller
        .load(doc, &notes, &bank("bank-b"), &mut factory)
        .unwrap();
    assert_eq!(controller.state(), PlaybackState::Ready);
    assert!(controller.last_error().is_none());
}

#[test]
fn test_begin_load_pauses_transport() {
    let (mut controller, factory) = loaded();
    controller.play();
    factory.clock().advance(0.2);
    controller.begin_load();
    assert_eq!(controller.state(), PlaybackState::Loading);
    assert!(!controller.play());
}
