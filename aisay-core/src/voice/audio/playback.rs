//! Streaming audio playback using cpal
//! Resamples from source rate to native device rate if needed

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{take_samples, AudioOutput, AudioProfile};
use crate::error::{Result, SayError};

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Resampler with input buffer to accumulate samples
struct ResamplerWithBuffer {
    resampler: FftFixedIn<f32>,
    buffer: Vec<f32>,
    /// Samples have gone in since the last flush
    primed: bool,
}

impl ResamplerWithBuffer {
    fn new(source_rate: u32, target_rate: u32) -> Result<Self> {
        let chunk_size = 1024;
        let resampler =
            FftFixedIn::<f32>::new(source_rate as usize, target_rate as usize, chunk_size, 2, 1)
                .map_err(|e| SayError::Device(format!("failed to create resampler: {e}")))?;
        Ok(Self {
            resampler,
            buffer: Vec::with_capacity(chunk_size * 2),
            primed: false,
        })
    }

    /// Resample every complete input chunk, keeping the remainder buffered
    fn process(&mut self, mono: &[f32]) -> Result<Vec<f32>> {
        self.buffer.extend_from_slice(mono);
        self.primed |= !mono.is_empty();

        let mut output = Vec::new();
        loop {
            let frames_needed = self.resampler.input_frames_next();
            if self.buffer.len() < frames_needed {
                break;
            }

            let input = vec![self.buffer[..frames_needed].to_vec()];
            let resampled = self
                .resampler
                .process(&input, None)
                .map_err(|e| SayError::Device(format!("resampling failed: {e:?}")))?;
            if let Some(chunk) = resampled.into_iter().next() {
                output.extend(chunk);
            }

            self.buffer.drain(..frames_needed);
        }

        Ok(output)
    }

    /// Pad the buffered tail with silence, then keep feeding silence until
    /// the resampler's output delay has been pushed out
    fn flush(&mut self) -> Result<Vec<f32>> {
        if !self.primed {
            return Ok(Vec::new());
        }

        let frames_needed = self.resampler.input_frames_next();
        let padding = if self.buffer.is_empty() {
            0
        } else {
            frames_needed.saturating_sub(self.buffer.len())
        };
        let mut output = self.process(&vec![0.0; padding])?;

        let delay = self.resampler.output_delay();
        let mut trailing = 0;
        while trailing < delay {
            let silence = vec![0.0; self.resampler.input_frames_next()];
            let chunk = self.process(&silence)?;
            if chunk.is_empty() {
                break;
            }
            trailing += chunk.len();
            output.extend(chunk);
        }

        self.primed = false;
        Ok(output)
    }
}

/// State shared with the device callback
struct Shared {
    queue: Mutex<VecDeque<f32>>,
    ended: AtomicBool,
    finished: AtomicBool,
    failed: AtomicBool,
}

/// Plays PCM as it is written. The device starts immediately and outputs
/// silence while the queue is empty; once `finish` has been called and the
/// queue runs dry, playback is reported as drained.
pub struct StreamingPlayer {
    _stream: Stream,
    shared: Arc<Shared>,
    resampler: Option<ResamplerWithBuffer>,
    source_channels: u16,
    device_channels: usize,
    pending: Option<u8>,
}

impl StreamingPlayer {
    /// Open the default output device for audio in the given source format
    pub fn new(profile: AudioProfile) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SayError::Device("no output device available".to_string()))?;

        let supported_config = device
            .default_output_config()
            .map_err(|e| SayError::Device(format!("failed to get default output config: {e}")))?;

        let native_rate = supported_config.sample_rate().0;
        let device_channels = supported_config.channels() as usize;
        let sample_format = supported_config.sample_format();
        let config: StreamConfig = supported_config.into();

        tracing::debug!(
            device_name = ?device.name(),
            native_sample_rate = native_rate,
            native_channels = device_channels,
            native_format = ?sample_format,
            source_sample_rate = profile.sample_rate,
            "audio playback initialized"
        );

        let resampler = if native_rate == profile.sample_rate {
            None
        } else {
            Some(ResamplerWithBuffer::new(profile.sample_rate, native_rate)?)
        };

        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            ended: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        });

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, shared.clone())?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, shared.clone())?,
            format => {
                return Err(SayError::Device(format!(
                    "unsupported sample format: {format:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| SayError::Device(format!("failed to start playback stream: {e}")))?;

        Ok(Self {
            _stream: stream,
            shared,
            resampler,
            source_channels: profile.channels,
            device_channels,
            pending: None,
        })
    }

    fn enqueue(&self, mono: Vec<f32>) -> Result<()> {
        if mono.is_empty() {
            return Ok(());
        }
        let samples = if self.source_channels == 1 && self.device_channels > 1 {
            expand_to_channels(&mono, self.device_channels)
        } else {
            mono
        };

        let mut queue = self
            .shared
            .queue
            .lock()
            .map_err(|_| SayError::Device("playback queue poisoned".to_string()))?;
        queue.extend(samples);
        Ok(())
    }
}

#[async_trait(?Send)]
impl AudioOutput for StreamingPlayer {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        if self.shared.ended.load(Ordering::SeqCst) {
            return Err(SayError::Device("write after finish".to_string()));
        }

        let input: Vec<f32> = take_samples(&mut self.pending, pcm)
            .into_iter()
            .map(|s| s as f32 / 32768.0)
            .collect();

        let output = match self.resampler.as_mut() {
            Some(resampler) => resampler.process(&input)?,
            None => input,
        };
        self.enqueue(output)
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(resampler) = self.resampler.as_mut() {
            let tail = resampler.flush()?;
            self.enqueue(tail)?;
        }
        self.shared.ended.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn drained(&mut self) -> Result<()> {
        while !self.shared.finished.load(Ordering::SeqCst) {
            if self.shared.failed.load(Ordering::SeqCst) {
                return Err(SayError::Device("playback stream failed".to_string()));
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    shared: Arc<Shared>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32> + Default + Send + 'static,
{
    let err_shared = shared.clone();
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let Ok(mut queue) = shared.queue.lock() else {
                    data.fill(T::default());
                    return;
                };

                if queue.is_empty() && shared.ended.load(Ordering::SeqCst) {
                    data.fill(T::default());
                    shared.finished.store(true, Ordering::SeqCst);
                    return;
                }

                for slot in data.iter_mut() {
                    *slot = queue
                        .pop_front()
                        .map(|s| T::from_sample(s))
                        .unwrap_or_default();
                }
            },
            move |err| {
                tracing::error!(error = ?err, "playback stream error");
                err_shared.failed.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| SayError::Device(format!("failed to build output stream: {e}")))
}

fn expand_to_channels(samples: &[f32], channels: usize) -> Vec<f32> {
    let mut output = Vec::with_capacity(samples.len() * channels);
    for &sample in samples {
        for _ in 0..channels {
            output.push(sample);
        }
    }
    output
}
