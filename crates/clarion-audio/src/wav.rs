//! Canonical RIFF/WAV framing and atomic on-disk writes (§3 AudioArtifact,
//! §5: "write-then-rename is sufficient; the validity check tolerates
//! in-progress writes because it also checks magic bytes").

use std::path::Path;

use tokio::io::AsyncWriteExt;

const SAMPLE_RATE: u32 = 8_000;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Encodes mono 8 kHz 16-bit PCM samples as a canonical RIFF/WAV byte
/// buffer with a 44-byte header.
pub fn encode(samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = SAMPLE_RATE * CHANNELS as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);

    let mut buf = Vec::with_capacity(44 + data_len as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&CHANNELS.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }
    buf
}

/// Writes `bytes` to `path` atomically: write to a sibling temp file, then
/// rename over the destination. Readers only ever observe the old file or
/// the fully-written new one, never a partial write (§5).
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("wav.tmp");
    {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
    }
    tokio::fs::rename(&tmp_path, path).await
}

/// A file is "ready" iff it exists, is non-empty, and starts with the
/// `RIFF` magic (§3).
pub async fn is_valid(path: &Path) -> bool {
    match tokio::fs::read(path).await {
        Ok(bytes) => !bytes.is_empty() && bytes.len() >= 4 && &bytes[0..4] == b"RIFF",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn encode_starts_with_riff_and_wave_magic() {
        let bytes = encode(&[1, -1, 2, -2]);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[tokio::test]
    async fn write_then_read_round_trips_validity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc123.wav");
        assert!(!is_valid(&path).await);
        write_atomic(&path, &encode(&[1, 2, 3])).await.unwrap();
        assert!(is_valid(&path).await);
    }

    #[tokio::test]
    async fn empty_file_is_not_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        tokio::fs::write(&path, b"").await.unwrap();
        assert!(!is_valid(&path).await);
    }
}
