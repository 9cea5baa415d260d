//! Audio output for streamed synthesis

use async_trait::async_trait;

use crate::error::Result;

#[cfg(feature = "playback")]
pub mod playback;
pub mod wav;

/// Audio format profile specifying sample rate and channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioProfile {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Destination for decoded PCM (signed 16-bit little-endian).
///
/// Frames are written in arrival order. `finish` closes the write side and
/// `drained` resolves once everything written has actually been output.
#[async_trait(?Send)]
pub trait AudioOutput {
    /// Queue raw PCM bytes. A frame may end mid-sample; the remainder is
    /// carried into the next write.
    fn write(&mut self, pcm: &[u8]) -> Result<()>;

    /// No more audio will arrive
    fn finish(&mut self) -> Result<()>;

    /// Wait until all written audio has been output
    async fn drained(&mut self) -> Result<()>;
}

/// Split `pcm` into whole little-endian i16 samples, carrying an odd trailing
/// byte in `pending` across calls
pub(crate) fn take_samples(pending: &mut Option<u8>, pcm: &[u8]) -> Vec<i16> {
    let mut samples = Vec::with_capacity(pcm.len() / 2 + 1);
    let mut bytes = pcm;

    if let Some(low) = pending.take() {
        match bytes.split_first() {
            Some((&high, rest)) => {
                samples.push(i16::from_le_bytes([low, high]));
                bytes = rest;
            }
            None => {
                *pending = Some(low);
                return samples;
            }
        }
    }

    let mut chunks = bytes.chunks_exact(2);
    samples.extend(chunks.by_ref().map(|c| i16::from_le_bytes([c[0], c[1]])));
    if let [odd] = chunks.remainder() {
        *pending = Some(*odd);
    }

    samples
}
