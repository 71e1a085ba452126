//! # Audio Capture Module
//!
//! Real-time capture from the default input device using CPAL, and the
//! sliding window the transcriber samples from.
//!
//! The capture callback only forwards mono sample chunks over a channel. The
//! consumer folds them into an [`AnalysisWindow`] and reads the most recent
//! `frame_size` samples whenever it wants a frame. Reads are lossy: audio that
//! scrolls out of the window between two reads is never analysed, and nothing
//! backs up when a read is slow.

use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

/// Messages sent from the capture side to the analysis side.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// The stream is running at this sample rate.
    Started { sample_rate: u32 },
    /// A chunk of mono samples, in arrival order.
    Samples(Vec<f32>),
    /// Capture could not start or broke down.
    Failed(String),
}

/// One frame handed to the estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Capture clock in seconds at the end of this frame.
    pub timestamp: f64,
}

/// Starts audio capture from the default input device.
///
/// Picks an f32 input configuration close to `target_rate` (mono preferred),
/// and streams downmixed mono chunks to `sender`. Chunks are dropped while
/// the channel is full.
///
/// # Arguments
/// * `sender` - Channel that receives sample chunks and stream errors
/// * `target_rate` - Preferred sample rate in Hz, clamped to what the device supports
///
/// # Returns
/// The running stream and its actual sample rate. The stream must be kept
/// alive for capture to continue; dropping it releases the device.
pub fn start_audio_capture(
    sender: Sender<CaptureEvent>,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = cpal::SampleRate(target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    ));
    let config = supported_config.with_sample_rate(sample_rate);
    let sample_rate_val = config.sample_rate().0;
    let channels = config.channels().max(1) as usize;
    let config: cpal::StreamConfig = config.into();

    log::info!("Selected sample rate: {} Hz, {} channel(s)", sample_rate_val, channels);

    let err_sender = sender.clone();
    let err_fn = move |err: cpal::StreamError| {
        log::error!("An error occurred on the audio stream: {}", err);
        let _ = err_sender.try_send(CaptureEvent::Failed(err.to_string()));
    };

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let chunk = downmix(data, channels);
            // Receiver gone means the session is shutting down.
            let _ = sender.try_send(CaptureEvent::Samples(chunk));
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Averages interleaved channels into mono.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Picks the f32 input configuration closest to `target_rate`, preferring
/// mono over multi-channel.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_distance = if (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&target_rate) {
                0
            } else {
                let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
                let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
                min_diff.min(max_diff)
            };
            (c.channels() != 1, rate_distance)
        })
}

/// Sliding window over the most recent mono samples, with a sample clock.
#[derive(Debug, Clone)]
pub struct AnalysisWindow {
    samples: VecDeque<f32>,
    size: usize,
    sample_rate: u32,
    total_samples: u64,
}

impl AnalysisWindow {
    pub fn new(size: usize, sample_rate: u32) -> Self {
        Self {
            samples: VecDeque::with_capacity(size),
            size,
            sample_rate,
            total_samples: 0,
        }
    }

    /// Appends a chunk, keeping only the newest `size` samples.
    pub fn push(&mut self, chunk: &[f32]) {
        self.total_samples += chunk.len() as u64;
        let tail = &chunk[chunk.len().saturating_sub(self.size)..];
        let overflow = (self.samples.len() + tail.len()).saturating_sub(self.size);
        self.samples.drain(..overflow);
        self.samples.extend(tail.iter().copied());
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.size
    }

    /// Seconds of audio received so far.
    pub fn clock(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_samples as f64 / self.sample_rate as f64
    }

    /// The newest full frame, or `None` until enough audio has arrived.
    pub fn snapshot(&self) -> Option<AudioFrame> {
        if !self.is_full() {
            return None;
        }
        Some(AudioFrame {
            samples: self.samples.iter().copied().collect(),
            sample_rate: self.sample_rate,
            timestamp: self.clock(),
        })
    }
}
