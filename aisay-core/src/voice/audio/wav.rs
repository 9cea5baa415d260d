//! WAV file output, used instead of the sound card with `--output`
//!
//! Audio is written to a temporary file beside the destination and only moved
//! into place once playback has drained. A failed session leaves nothing at
//! the destination path.

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

use super::{take_samples, AudioOutput, AudioProfile};
use crate::error::{Result, SayError};

pub struct WavFileOutput {
    path: PathBuf,
    // Dropped before `staged` so an abandoned writer never outlives its file
    writer: Option<WavWriter<BufWriter<File>>>,
    staged: Option<TempPath>,
    pending: Option<u8>,
    samples_written: u64,
}

impl WavFileOutput {
    pub fn create(path: impl AsRef<Path>, profile: AudioProfile) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let spec = WavSpec {
            channels: profile.channels,
            sample_rate: profile.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (file, staged) = NamedTempFile::new_in(dir)
            .map_err(|e| SayError::Device(format!("failed to create file in {dir:?}: {e}")))?
            .into_parts();

        let writer = WavWriter::new(BufWriter::new(file), spec)
            .map_err(|e| SayError::Device(format!("failed to start {path:?}: {e}")))?;

        Ok(Self {
            path,
            writer: Some(writer),
            staged: Some(staged),
            pending: None,
            samples_written: 0,
        })
    }

    fn finalize(&mut self) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        if self.pending.take().is_some() {
            tracing::warn!(path = ?self.path, "dropping trailing half sample");
        }
        writer.finalize()?;
        Ok(())
    }

    /// Move the finished file to its destination
    fn publish(&mut self) -> Result<()> {
        self.finalize()?;
        let Some(staged) = self.staged.take() else {
            return Ok(());
        };
        staged
            .persist(&self.path)
            .map_err(|e| SayError::Device(format!("failed to save {:?}: {e}", self.path)))?;

        tracing::info!(
            path = ?self.path,
            samples = self.samples_written,
            "wav file written"
        );
        Ok(())
    }
}

#[async_trait(?Send)]
impl AudioOutput for WavFileOutput {
    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| SayError::Device("write after finish".to_string()))?;

        for sample in take_samples(&mut self.pending, pcm) {
            writer.write_sample(sample)?;
            self.samples_written += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finalize()
    }

    async fn drained(&mut self) -> Result<()> {
        self.publish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::mock::{MockConnector, MockFrame};
    use crate::voice::tts::session::SynthesisSession;
    use crate::voice::tts::types::SynthesisRequest;
    use tempfile::TempDir;

    const PROFILE: AudioProfile = AudioProfile {
        sample_rate: 44_100,
        channels: 1,
    };

    #[tokio::test]
    async fn test_writes_samples_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.wav");

        let mut output = WavFileOutput::create(&path, PROFILE).unwrap();
        output.write(&[0x01, 0x00, 0x02]).unwrap();
        output.write(&[0x00, 0xff, 0xff]).unwrap();
        output.finish().unwrap();
        output.drained().await.unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44_100);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, -1]);
    }

    #[tokio::test]
    async fn test_file_appears_only_after_drain() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("late.wav");

        let mut output = WavFileOutput::create(&path, PROFILE).unwrap();
        output.write(&[0x05, 0x00]).unwrap();
        output.finish().unwrap();
        assert!(!path.exists());

        output.drained().await.unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_session_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.wav");
        let connector = MockConnector::new(vec![
            MockFrame::chunk(&[1, 0, 2, 0], false),
            MockFrame::error("quota exceeded"),
        ]);
        let request = SynthesisRequest::new("sonic-turbo-2025-03-07", "Hello", "voice").unwrap();

        let mut output = WavFileOutput::create(&path, PROFILE).unwrap();
        let err = SynthesisSession::new(&connector)
            .run(&request, &mut output)
            .await
            .unwrap_err();
        drop(output);

        assert!(matches!(err, SayError::Synthesis(_)));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_abandoned_output_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("unused.wav");

        let output = WavFileOutput::create(&path, PROFILE).unwrap();
        drop(output);

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_after_finish_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut output = WavFileOutput::create(temp_dir.path().join("a.wav"), PROFILE).unwrap();
        output.finish().unwrap();
        assert!(matches!(output.write(&[0, 0]), Err(SayError::Device(_))));
    }
}
