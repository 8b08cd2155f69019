//! Shared in-process sample analysis for the analyzers that need genuine
//! decoded-sample access rather than the external tool's aggregate stats:
//! club-system stress, spectral balance, channel topology, and clipping's
//! temporal distribution. Decoding goes through
//! [`crate::core::normalizer::decode_interleaved`]; everything here is pure
//! number-crunching over the resulting `f32` buffers.

use std::path::Path;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::core::normalizer;
use crate::error::SonarGateResult;

/// FFT window length used for band-energy estimation. 4096 samples at a
/// 44.1-48 kHz source rate gives roughly 10-11 Hz bins, fine enough to
/// separate the sub-bass/bass boundary used by the club-stress bands.
const FFT_WINDOW: usize = 4096;
/// Fraction of [`FFT_WINDOW`] samples each successive analysis window
/// advances by (50% overlap).
const WINDOW_HOP: usize = FFT_WINDOW / 2;
/// Amplitude below which a sample is treated as digital silence for dB
/// conversion, to keep `log10` away from `-inf`.
const SILENCE_FLOOR: f64 = 1e-9;
/// dBFS returned for [`SILENCE_FLOOR`]-or-quieter input.
const SILENCE_DB: f64 = -180.0;

/// Per-channel decoded PCM at the track's native sample rate.
pub struct DecodedChannels {
    /// One `Vec<f32>` per channel, equal length.
    pub channels: Vec<Vec<f32>>,
    /// Native sample rate.
    pub sample_rate: u32,
}

/// Decode `path` and de-interleave it into one buffer per channel.
pub fn decode_channels(path: &Path) -> SonarGateResult<DecodedChannels> {
    let decoded = normalizer::decode_interleaved(path)?;
    let channel_count = decoded.channels.max(1);
    let frames = decoded.interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in decoded.interleaved.chunks(channel_count) {
        for (ch, sample) in frame.iter().enumerate() {
            channels[ch].push(*sample);
        }
    }
    Ok(DecodedChannels {
        channels,
        sample_rate: decoded.sample_rate,
    })
}

/// Average all channels down to mono by simple per-frame mean.
pub fn to_mono(channels: &[Vec<f32>]) -> Vec<f32> {
    let Some(len) = channels.iter().map(|c| c.len()).min() else {
        return Vec::new();
    };
    let count = channels.len().max(1) as f32;
    (0..len)
        .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() / count)
        .collect()
}

/// Amplitude (linear, `[0, 1]` for in-range PCM) to dBFS, floored at
/// [`SILENCE_DB`] rather than producing `-inf`.
pub fn to_db(amplitude: f64) -> f64 {
    if amplitude <= SILENCE_FLOOR {
        SILENCE_DB
    } else {
        20.0 * amplitude.log10()
    }
}

/// Root-mean-square of `samples`, linear scale.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|s| (*s as f64).powi(2)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Peak absolute amplitude of `samples`, linear scale.
pub fn peak_abs(samples: &[f32]) -> f64 {
    samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs() as f64))
}

/// Energy ratio of `mono` in each `(low_hz, high_hz]` band of `bands`,
/// relative to total broadband energy, estimated from overlapping
/// Hann-windowed FFT frames and averaged across the whole signal. Returns
/// all-zero if `mono` is shorter than one FFT window.
pub fn band_energy_ratios(mono: &[f32], sample_rate: u32, bands: &[(f64, f64)]) -> Vec<f64> {
    if mono.len() < FFT_WINDOW || sample_rate == 0 {
        return vec![0.0; bands.len()];
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_WINDOW);
    let bin_hz = sample_rate as f64 / FFT_WINDOW as f64;

    let mut band_totals = vec![0.0_f64; bands.len()];
    let mut grand_total = 0.0_f64;

    let mut pos = 0;
    while pos + FFT_WINDOW <= mono.len() {
        let mut buffer: Vec<Complex<f32>> = mono[pos..pos + FFT_WINDOW]
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let w = 0.5
                    - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / (FFT_WINDOW as f32 - 1.0)).cos();
                Complex::new(*s * w, 0.0)
            })
            .collect();
        fft.process(&mut buffer);

        for (bin, value) in buffer.iter().take(FFT_WINDOW / 2).enumerate() {
            let freq = bin as f64 * bin_hz;
            let magnitude_sq = (value.norm() as f64).powi(2);
            grand_total += magnitude_sq;
            if let Some(band_idx) = bands.iter().position(|(low, high)| freq >= *low && freq < *high) {
                band_totals[band_idx] += magnitude_sq;
            }
        }
        pos += WINDOW_HOP;
    }

    if grand_total <= 0.0 {
        return vec![0.0; bands.len()];
    }
    band_totals.iter().map(|t| (t / grand_total).clamp(0.0, 1.0)).collect()
}

/// Pearson correlation coefficient between two equal-length channels, in
/// `[-1, 1]`. `0.0` if either channel has zero variance.
pub fn correlation(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let mean_a: f64 = a[..n].iter().map(|s| *s as f64).sum::<f64>() / n as f64;
    let mean_b: f64 = b[..n].iter().map(|s| *s as f64).sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] as f64 - mean_a;
        let db = b[i] as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a <= SILENCE_FLOOR || var_b <= SILENCE_FLOOR {
        return 0.0;
    }
    (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
}

/// Fraction of `mono` samples at or beyond `ceiling` (linear amplitude),
/// and how many of those clipped samples fall in each third of the
/// timeline (for temporal-distribution classification).
pub fn clip_density_and_thirds(mono: &[f32], ceiling: f32) -> (f64, [u64; 3]) {
    if mono.is_empty() {
        return (0.0, [0, 0, 0]);
    }
    let third_len = (mono.len() / 3).max(1);
    let mut thirds = [0u64; 3];
    let mut clipped = 0u64;
    for (i, sample) in mono.iter().enumerate() {
        if sample.abs() >= ceiling {
            clipped += 1;
            let third = (i / third_len).min(2);
            thirds[third] += 1;
        }
    }
    (clipped as f64 / mono.len() as f64, thirds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_db_floors_silence() {
        assert_eq!(to_db(0.0), SILENCE_DB);
    }

    #[test]
    fn to_mono_averages_channels() {
        let channels = vec![vec![1.0, 1.0], vec![-1.0, -1.0]];
        assert_eq!(to_mono(&channels), vec![0.0, 0.0]);
    }

    #[test]
    fn clip_density_counts_samples_at_ceiling() {
        let mono = vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let (density, thirds) = clip_density_and_thirds(&mono, 0.99);
        assert_eq!(density, 0.2);
        assert_eq!(thirds[0], 2);
        assert_eq!(thirds[1] + thirds[2], 0);
    }

    #[test]
    fn band_energy_ratios_short_signal_is_zero() {
        let mono = vec![0.0; 10];
        let ratios = band_energy_ratios(&mono, 48_000, &[(0.0, 100.0)]);
        assert_eq!(ratios, vec![0.0]);
    }
}
