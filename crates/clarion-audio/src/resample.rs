//! Downmix/resample to the artifact contract: 8 kHz, mono, 16-bit PCM (§4.5).

use crate::engine::RawPcm;

pub const TARGET_SAMPLE_RATE: u32 = 8_000;

/// Downmixes to mono (if needed) and linearly resamples to 8 kHz.
pub fn to_target_format(pcm: &RawPcm) -> Vec<i16> {
    let mono = downmix(&pcm.samples, pcm.channels);
    if pcm.sample_rate == TARGET_SAMPLE_RATE {
        return mono;
    }
    linear_resample(&mono, pcm.sample_rate, TARGET_SAMPLE_RATE)
}

fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn linear_resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if samples.is_empty() || from_rate == to_rate {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = src_pos.floor() as usize;
            let frac = src_pos - idx as f64;
            let a = samples[idx.min(samples.len() - 1)] as f64;
            let b = samples[(idx + 1).min(samples.len() - 1)] as f64;
            (a + (b - a) * frac) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_already_target_format() {
        let pcm = RawPcm { sample_rate: 8_000, channels: 1, samples: vec![1, 2, 3] };
        assert_eq!(to_target_format(&pcm), vec![1, 2, 3]);
    }

    #[test]
    fn downmixes_stereo_to_mono() {
        let pcm = RawPcm { sample_rate: 8_000, channels: 2, samples: vec![100, 200, 300, 400] };
        let out = to_target_format(&pcm);
        assert_eq!(out, vec![150, 350]);
    }

    #[test]
    fn resamples_to_a_shorter_run_at_a_higher_source_rate() {
        let samples: Vec<i16> = (0..16000).map(|i| (i % 100) as i16).collect();
        let pcm = RawPcm { sample_rate: 16_000, channels: 1, samples };
        let out = to_target_format(&pcm);
        assert_eq!(out.len(), 8000);
    }
}
