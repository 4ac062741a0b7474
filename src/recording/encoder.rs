//! In-memory WAV encoding of captured audio.
//!
//! Captured fragments are kept in order and only turned into a container when
//! the session stops. Encoding runs on the blocking pool so the event loop
//! keeps drawing while it completes.

use anyhow::{anyhow, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Ordered raw-audio fragments of one session.
#[derive(Debug, Default)]
pub struct ChunkEncoder {
    sample_rate: u32,
    chunks: Vec<Vec<i16>>,
}

impl ChunkEncoder {
    /// Creates an empty encoder for mono audio at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            chunks: Vec::new(),
        }
    }

    /// Appends one captured fragment. Empty fragments are dropped.
    pub fn push_chunk(&mut self, chunk: Vec<i16>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Number of fragments collected so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total number of samples collected so far.
    pub fn sample_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Encodes all fragments into a single WAV payload.
    ///
    /// # Errors
    /// - If the blocking encode task panics or is cancelled
    /// - If WAV writing fails
    pub async fn finalize(self) -> Result<Vec<u8>> {
        let Self {
            sample_rate,
            chunks,
        } = self;

        tokio::task::spawn_blocking(move || encode_wav(&chunks, sample_rate))
            .await
            .map_err(|e| anyhow!("Encoder task failed: {e}"))?
    }
}

/// Writes 16-bit mono PCM fragments as one WAV container.
///
/// # Errors
/// - If the WAV writer rejects the format or a sample
pub fn encode_wav(chunks: &[Vec<i16>], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for chunk in chunks {
            for &sample in chunk {
                writer.write_sample(sample)?;
            }
        }
        writer.finalize()?;
    }

    let bytes = cursor.into_inner();
    tracing::debug!(
        "Encoded {} fragments into {} bytes of WAV at {}Hz",
        chunks.len(),
        bytes.len(),
        sample_rate
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> (u32, Vec<i16>) {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let rate = reader.spec().sample_rate;
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (rate, samples)
    }

    #[tokio::test]
    async fn test_fragments_are_concatenated_in_order() {
        let mut encoder = ChunkEncoder::new(16000);
        encoder.push_chunk(vec![1, 2, 3]);
        encoder.push_chunk(Vec::new());
        encoder.push_chunk(vec![4, -5]);

        assert_eq!(encoder.chunk_count(), 2);
        assert_eq!(encoder.sample_count(), 5);

        let bytes = encoder.finalize().await.unwrap();
        let (rate, samples) = decode(&bytes);
        assert_eq!(rate, 16000);
        assert_eq!(samples, vec![1, 2, 3, 4, -5]);
    }

    #[test]
    fn test_empty_session_is_a_valid_container() {
        let bytes = encode_wav(&[], 48000).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        let (_, samples) = decode(&bytes);
        assert!(samples.is_empty());
    }
}
