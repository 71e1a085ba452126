//! # Melody Scribe - Live Melody Transcription GUI
//!
//! Listens to the microphone, turns what is sung or played into notes, and
//! draws them on a staff as they finish.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application; runs the transcriber on every tick
//! - **Audio Thread**: Owns the CPAL input stream until recording stops
//! - **Communication**: Crossbeam channel carrying capture events
//! - **Updates**: 16 ms timer subscription while recording

mod ui;

use crossbeam_channel::{Receiver, Sender};
use cpal::traits::StreamTrait;
use iced::{self, Element, Subscription, Task, Theme};
use std::path::Path;
use std::thread::{self, JoinHandle};
use scribe_core::{
    audio, score, AnalysisWindow, CaptureEvent, FrameReport, ScribeSession, Transcriber,
    TranscriberConfig, YinEstimator,
};
use ui::main_display::create_main_view;

/// Optional config file read from the working directory at startup.
const CONFIG_PATH: &str = "scribe_config.json";

/// Capture chunks buffered between ticks; the callback drops audio beyond this.
const CAPTURE_QUEUE_CHUNKS: usize = 64;

/// Main entry point for the Melody Scribe application.
pub fn main() -> iced::Result {
    env_logger::init();
    log::info!("Starting Melody Scribe...");
    let result = iced::application("Melody Scribe", ScribeApp::update, ScribeApp::view)
        .subscription(ScribeApp::subscription)
        .theme(ScribeApp::theme)
        .window_size((860.0, 720.0))
        .run();
    log::info!("Application finished with result: {:?}", result);
    result
}

#[derive(Debug, Clone)]
pub enum Message {
    ToggleRecording, // Start/stop button
    Reset,           // Clear the melody
    Exit,
    Tick,            // Timer tick while recording
}

/// Where the capture side currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingStatus {
    Stopped,
    /// Worker spawned, waiting for the device to open.
    Starting,
    Listening { sample_rate: u32 },
    /// Capture failed; recording was not started.
    Failed(String),
}

/// Everything the view needs, rebuilt after each mutation.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub status: RecordingStatus,
    pub layout: score::ScoreLayout,
    pub note_count: usize,
    pub last_report: Option<FrameReport>,
    /// Cents off the stable note, for the tuning readout.
    pub cents: Option<f32>,
}

/// Audio worker thread management structure.
///
/// The thread owns the CPAL stream so it is opened, paused and dropped on
/// one thread. Dropping the worker stops capture and joins the thread.
#[derive(Debug)]
struct AudioWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AudioWorker {
    fn spawn(events_tx: Sender<CaptureEvent>, target_rate: u32) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let thread_handle = thread::spawn(move || {
            log::debug!("Audio thread starting capture...");
            let (stream, sample_rate) = match audio::start_audio_capture(events_tx.clone(), target_rate) {
                Ok(tuple) => tuple,
                Err(e) => {
                    log::error!("Could not start audio capture: {:#}", e);
                    let _ = events_tx.send(CaptureEvent::Failed(e.to_string()));
                    return;
                }
            };
            let _ = events_tx.send(CaptureEvent::Started { sample_rate });

            // Blocks until stop is requested or the worker handle is gone.
            let _ = shutdown_rx.recv();

            if let Err(e) = stream.pause() {
                log::warn!("Error pausing stream: {}", e);
            }
            drop(stream);
            log::debug!("Audio thread released the input device");
        });

        Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        }
    }
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Audio thread panicked");
            }
        }
    }
}

/// Per-recording resources. Dropping this ends capture.
#[derive(Debug)]
struct Recording {
    worker: AudioWorker,
    events: Receiver<CaptureEvent>,
    /// Created once the stream reports its sample rate.
    window: Option<AnalysisWindow>,
}

#[derive(Debug)]
struct ScribeApp {
    config: TranscriberConfig,
    session: ScribeSession<YinEstimator>,
    recording: Option<Recording>,
    display_data: AppDisplayData,
}

impl Default for ScribeApp {
    fn default() -> Self {
        let config = match load_config(Path::new(CONFIG_PATH)) {
            Ok(Some(config)) => {
                log::info!("Loaded configuration from {}", CONFIG_PATH);
                config
            }
            Ok(None) => TranscriberConfig::default(),
            Err(e) => {
                log::warn!("Ignoring {}: {:#}", CONFIG_PATH, e);
                TranscriberConfig::default()
            }
        };

        Self {
            config,
            session: ScribeSession::default(),
            recording: None,
            display_data: AppDisplayData {
                status: RecordingStatus::Stopped,
                layout: score::layout_score(&[]),
                note_count: 0,
                last_report: None,
                cents: None,
            },
        }
    }
}

impl ScribeApp {
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToggleRecording => {
                if self.recording.is_some() {
                    self.stop_recording(RecordingStatus::Stopped);
                } else {
                    self.start_recording();
                }
            }
            Message::Reset => {
                log::info!("Reset: clearing {} note(s)", self.session.melody().len());
                self.session.reset();
                self.refresh_score();
            }
            Message::Exit => {
                self.stop_recording(RecordingStatus::Stopped);
                return iced::exit();
            }
            Message::Tick => self.on_tick(),
        }
        Task::none()
    }

    fn start_recording(&mut self) {
        log::info!("Recording started");
        let (events_tx, events_rx) = capture_channel();
        self.recording = Some(Recording {
            worker: AudioWorker::spawn(events_tx, self.config.sample_rate),
            events: events_rx,
            window: None,
        });
        // Fresh debouncer and tracker for every recording.
        self.session.start(Transcriber::with_yin(&self.config));
        self.display_data.status = RecordingStatus::Starting;
        self.display_data.last_report = None;
        self.display_data.cents = None;
    }

    /// Releases capture and analysis state. Safe to call when not recording.
    fn stop_recording(&mut self, status: RecordingStatus) {
        if let Some(recording) = self.recording.take() {
            log::info!("Recording stopped");
            drop(recording.worker);
        }
        self.session.stop();
        self.display_data.status = status;
        self.display_data.last_report = None;
        self.display_data.cents = None;
    }

    /// One driving-loop step: fold in new audio, analyse the newest window.
    fn on_tick(&mut self) {
        let Some(recording) = self.recording.as_mut() else {
            return;
        };

        let mut failure = None;
        for event in recording.events.try_iter() {
            match event {
                CaptureEvent::Started { sample_rate } => {
                    recording.window = Some(AnalysisWindow::new(self.config.frame_size, sample_rate));
                    self.display_data.status = RecordingStatus::Listening { sample_rate };
                }
                CaptureEvent::Samples(chunk) => {
                    if let Some(window) = recording.window.as_mut() {
                        window.push(&chunk);
                    }
                }
                CaptureEvent::Failed(reason) => {
                    failure = Some(reason);
                    break;
                }
            }
        }

        if let Some(reason) = failure {
            log::warn!("Recording could not continue: {}", reason);
            self.stop_recording(RecordingStatus::Failed(reason));
            return;
        }

        let Some(frame) = recording.window.as_ref().and_then(AnalysisWindow::snapshot) else {
            return;
        };
        let report = self.session.process_frame(&frame);
        if let Some(note) = report.finished {
            log::info!("Note added: {} ({})", note.key, note.duration);
            self.refresh_score();
        }
        self.display_data.cents = report.cents(self.config.reference_frequency);
        self.display_data.last_report = Some(report);
    }

    /// Re-lays out the score after the melody changed.
    fn refresh_score(&mut self) {
        let notation = self.session.melody().to_notation();
        self.display_data.layout = score::layout_score(&notation);
        self.display_data.note_count = notation.len();
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.recording.is_some() {
            iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Channel from the capture callback to the tick handler.
fn capture_channel() -> (Sender<CaptureEvent>, Receiver<CaptureEvent>) {
    crossbeam_channel::bounded(CAPTURE_QUEUE_CHUNKS)
}

/// Loads and validates a configuration file.
///
/// Returns `Ok(None)` when the file does not exist.
fn load_config(path: &Path) -> anyhow::Result<Option<TranscriberConfig>> {
    use anyhow::Context;

    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: TranscriberConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(Some(config))
}
