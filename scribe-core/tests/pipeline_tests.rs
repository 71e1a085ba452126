//! End-to-end tests: synthesized audio through the capture window, the YIN
//! estimator and the transcriber, ticking at display rate.

use scribe_core::{
    AnalysisWindow, NotationEntry, ScribeSession, TrackerState, Transcriber, TranscriberConfig,
    score,
};

const SAMPLE_RATE: u32 = 44100;
/// Samples arriving between two 60 Hz ticks.
const TICK_SAMPLES: usize = 735;

/// A melody described as (frequency or silence, seconds).
fn synthesize(parts: &[(Option<f32>, f32)]) -> Vec<f32> {
    let mut samples = Vec::new();
    for &(freq, seconds) in parts {
        let len = (seconds * SAMPLE_RATE as f32) as usize;
        match freq {
            Some(f) => samples.extend((0..len).map(|i| {
                0.5 * (2.0 * std::f32::consts::PI * f * i as f32 / SAMPLE_RATE as f32).sin()
            })),
            None => samples.extend(std::iter::repeat(0.0).take(len)),
        }
    }
    samples
}

/// Feeds audio tick by tick, analysing the newest window after each tick.
fn transcribe(config: &TranscriberConfig, audio: &[f32]) -> Vec<NotationEntry> {
    let mut session = ScribeSession::new(Transcriber::with_yin(config));
    let mut window = AnalysisWindow::new(config.frame_size, SAMPLE_RATE);
    for chunk in audio.chunks(TICK_SAMPLES) {
        window.push(chunk);
        if let Some(frame) = window.snapshot() {
            session.process_frame(&frame);
        }
    }
    session.melody().to_notation()
}

#[test]
fn test_two_sung_notes() {
    let audio = synthesize(&[
        (None, 0.3),
        (Some(440.0), 0.6),
        (None, 0.3),
        (Some(523.25), 1.0),
        (None, 0.5),
    ]);
    let notes = transcribe(&TranscriberConfig::default(), &audio);
    assert_eq!(
        notes,
        vec![NotationEntry::new("a/4", "q"), NotationEntry::new("c/5", "h")]
    );
}

#[test]
fn test_unrefined_estimator_agrees() {
    let config = TranscriberConfig {
        refine_with_spectrum: false,
        ..TranscriberConfig::default()
    };
    let audio = synthesize(&[(None, 0.2), (Some(329.63), 0.9), (None, 0.4)]);
    assert_eq!(transcribe(&config, &audio), vec![NotationEntry::new("e/4", "h")]);
}

#[test]
fn test_short_blip_is_not_a_note() {
    let audio = synthesize(&[(None, 0.3), (Some(440.0), 0.05), (None, 0.5)]);
    assert!(transcribe(&TranscriberConfig::default(), &audio).is_empty());
}

#[test]
fn test_out_of_range_tone_is_ignored() {
    // 98 Hz is G2, below the playable octaves.
    let audio = synthesize(&[(None, 0.2), (Some(98.0), 1.0), (None, 0.3)]);
    assert!(transcribe(&TranscriberConfig::default(), &audio).is_empty());
}

#[test]
fn test_note_still_sounding_at_stop_is_dropped() {
    let config = TranscriberConfig::default();
    let audio = synthesize(&[(None, 0.2), (Some(440.0), 1.0)]);

    let mut session = ScribeSession::new(Transcriber::with_yin(&config));
    let mut window = AnalysisWindow::new(config.frame_size, SAMPLE_RATE);
    for chunk in audio.chunks(TICK_SAMPLES) {
        window.push(chunk);
        if let Some(frame) = window.snapshot() {
            session.process_frame(&frame);
        }
    }
    assert!(matches!(session.state(), TrackerState::Holding(_)));
    assert!(session.melody().is_empty());

    // Stopping discards the held note; restarting begins idle.
    session.stop();
    assert!(session.melody().is_empty());
    session.start(Transcriber::with_yin(&config));
    assert_eq!(session.state(), TrackerState::Idle);

    let silence = vec![0.0; TICK_SAMPLES];
    for _ in 0..30 {
        window.push(&silence);
        if let Some(frame) = window.snapshot() {
            session.process_frame(&frame);
        }
    }
    assert!(session.melody().is_empty());
}

#[test]
fn test_scripted_estimator_feeds_score() {
    // One frequency per tick: 20 frames of G4, silence, 40 frames of B4.
    let mut script: Vec<Option<f32>> = Vec::new();
    script.extend(std::iter::repeat(Some(392.0)).take(20));
    script.extend(std::iter::repeat(None).take(10));
    script.extend(std::iter::repeat(Some(493.88)).take(40));
    script.extend(std::iter::repeat(None).take(10));
    let mut feed = script.into_iter();
    let estimator = move |_: &[f32], _: u32| feed.next().flatten();

    let config = TranscriberConfig::default();
    let mut session = ScribeSession::new(Transcriber::new(estimator, &config));
    let mut window = AnalysisWindow::new(config.frame_size, SAMPLE_RATE);
    window.push(&vec![0.0; config.frame_size]);
    for _ in 0..80 {
        window.push(&[0.0; TICK_SAMPLES]);
        let frame = window.snapshot().unwrap();
        session.process_frame(&frame);
    }

    let notation = session.melody().to_notation();
    assert_eq!(
        notation,
        vec![NotationEntry::new("g/4", "8"), NotationEntry::new("b/4", "q")]
    );

    let layout = score::layout_score(&notation);
    assert_eq!(layout.lines.len(), 1);
    assert_eq!(layout.note_count(), 2);
    assert!(layout.lines[0].show_time_signature);
}
