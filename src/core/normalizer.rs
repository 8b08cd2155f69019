//! Pre-analysis normalizer.
//!
//! Decides whether an asset is already in the canonical analysis format
//! (48 kHz / 24-bit PCM / uncompressed) and, if not, decodes it with
//! `symphonia`, resamples with `rubato`, and writes a 24-bit PCM WAV copy
//! via `hound` into a dedicated temp directory. `with_normalization` is the
//! scope guard that guarantees the temp copy is deleted on every exit path,
//! including an early return or a panic unwinding through it — a `Drop`
//! impl rather than a manual cleanup call at each return site.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use symphonia::core::audio::Signal;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::config::NormalizerConfig;
use crate::core::types::AudioAsset;
use crate::error::{SonarGateError, SonarGateResult};

/// Canonical analysis sample rates that never trigger normalization.
const ACCEPTABLE_SAMPLE_RATES: [u32; 4] = [44_100, 48_000, 88_200, 96_000];
/// Canonical analysis bit depths that never trigger normalization.
const ACCEPTABLE_BIT_DEPTHS: [u16; 3] = [16, 24, 32];
/// Lossy codec families that always trigger normalization.
const LOSSY_CODECS: [&str; 4] = ["mp3", "aac", "vorbis", "opus"];
/// The sample rate every normalized copy is produced at.
pub const TARGET_SAMPLE_RATE: u32 = 48_000;
/// The bit depth every normalized copy is produced at.
pub const TARGET_BIT_DEPTH: u16 = 24;

/// Probe `path` for its container/codec, sample rate, bit depth, channel
/// count, duration and file size, without fully decoding it.
pub fn probe(path: &Path) -> SonarGateResult<AudioAsset> {
    let file = std::fs::File::open(path)?;
    let file_size = file.metadata()?.len();
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(SonarGateError::from)?;

    let format = probed.format;
    let track = format
        .default_track()
        .or_else(|| format.tracks().iter().find(|t| t.codec_params.codec != CODEC_TYPE_NULL))
        .ok_or_else(|| SonarGateError::audio_processing("no decodable audio track found"))?;

    let params = &track.codec_params;
    let sample_rate = params.sample_rate.unwrap_or(0);
    let channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
    let bit_depth = params.bits_per_sample.unwrap_or(0) as u16;
    let duration = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => frames as f64 / rate as f64,
        _ => 0.0,
    };
    let format_name = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_lowercase();

    Ok(AudioAsset {
        path: path.to_path_buf(),
        format: format_name,
        sample_rate,
        bit_depth,
        channels,
        file_size,
        duration,
        loudness: None,
    })
}

/// Decide whether `asset` requires normalization before analysis.
pub fn needs_normalization(asset: &AudioAsset) -> bool {
    let lossy = LOSSY_CODECS.iter().any(|c| asset.format.contains(c));
    let dsd = asset.format.contains("dsd") || asset.format.contains("dsf");
    lossy
        || dsd
        || !ACCEPTABLE_SAMPLE_RATES.contains(&asset.sample_rate)
        || (asset.bit_depth != 0 && !ACCEPTABLE_BIT_DEPTHS.contains(&asset.bit_depth))
        || asset.sample_rate > 96_000
}

/// Fully decoded, still-interleaved PCM, as produced by [`decode_interleaved`].
pub struct DecodedAudio {
    /// Interleaved `f32` samples, frame-major (`frame * channels + channel`).
    pub interleaved: Vec<f32>,
    /// The track's native sample rate, as reported by its codec params.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: usize,
}

/// Decode every packet in `path`'s default audio track to interleaved `f32`
/// PCM at its native sample rate, with no resampling or file output. Shared
/// by [`normalize`] and by the analyzers that need in-process sample access
/// (club-system stress, spectral balance, channel topology, clipping's
/// temporal distribution) rather than the external tool's aggregate stats.
pub fn decode_interleaved(path: &Path) -> SonarGateResult<DecodedAudio> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(SonarGateError::from)?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SonarGateError::audio_processing("no decodable audio track found"))?
        .clone();

    let source_rate = track.codec_params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(2)
        .max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(SonarGateError::from)?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::ResetRequired) => continue,
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(SonarGateError::from(e)),
        };
        match decoder.decode(&packet) {
            Ok(buf) => {
                let spec = *buf.spec();
                let mut sample_buf =
                    symphonia::core::audio::SampleBuffer::<f32>::new(buf.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(buf);
                interleaved.extend_from_slice(sample_buf.samples());
            }
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(SonarGateError::from(e)),
        }
    }

    Ok(DecodedAudio {
        interleaved,
        sample_rate: source_rate,
        channels,
    })
}

/// Decode `path`, resample to [`TARGET_SAMPLE_RATE`] if needed, and write a
/// [`TARGET_BIT_DEPTH`]-bit PCM WAV copy under `cfg.temp_dir`. Returns the
/// new path; the caller is responsible for deletion (use
/// [`with_normalization`] instead of calling this directly in application
/// code).
pub fn normalize(path: &Path, cfg: &NormalizerConfig) -> SonarGateResult<PathBuf> {
    std::fs::create_dir_all(&cfg.temp_dir)?;

    let decoded = decode_interleaved(path)?;
    let source_rate = decoded.sample_rate;
    let channels = decoded.channels;

    let resampled = if source_rate != TARGET_SAMPLE_RATE {
        resample_interleaved(&decoded.interleaved, channels, source_rate, TARGET_SAMPLE_RATE)?
    } else {
        decoded.interleaved
    };

    let out_path = cfg.temp_dir.join(format!(
        "sonargate-{}-{}.wav",
        uuid::Uuid::new_v4(),
        path.file_stem().and_then(|s| s.to_str()).unwrap_or("asset")
    ));

    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: TARGET_BIT_DEPTH as u16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&out_path, spec)
        .map_err(|e| SonarGateError::audio_processing(format!("failed to open WAV writer: {e}")))?;
    let scale = (1i32 << (TARGET_BIT_DEPTH - 1)) as f32 - 1.0;
    for sample in &resampled {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * scale) as i32)
            .map_err(|e| SonarGateError::audio_processing(format!("WAV write failed: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| SonarGateError::audio_processing(format!("WAV finalize failed: {e}")))?;

    Ok(out_path)
}

fn resample_interleaved(
    interleaved: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> SonarGateResult<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let channels = channels.max(1);
    let frames = interleaved.len() / channels;
    let mut deinterleaved: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            deinterleaved[ch].push(*sample);
        }
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, frames.max(1), channels)
        .map_err(|e| SonarGateError::audio_processing(format!("resampler init failed: {e}")))?;

    let output = resampler
        .process(&deinterleaved, None)
        .map_err(|e| SonarGateError::audio_processing(format!("resample failed: {e}")))?;

    let out_frames = output.first().map(|c| c.len()).unwrap_or(0);
    let mut result = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        for ch in output.iter().take(channels) {
            result.push(ch[i]);
        }
    }
    Ok(result)
}

/// RAII guard owning zero or one normalized temp path. Deletes the file on
/// drop, including when the scope is left via an early `?` return or an
/// unwinding panic.
pub struct NormalizationGuard {
    path: Option<PathBuf>,
}

impl NormalizationGuard {
    /// The effective analysis path: the normalized temp copy if one was
    /// produced, otherwise the original asset path.
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }
}

impl Drop for NormalizationGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Run `f` with the effective analysis path for `path`: normalized if
/// required, the original path otherwise. Any temp file created is deleted
/// when this function returns, on every exit path.
pub async fn with_normalization<F, Fut, T>(
    path: &Path,
    cfg: &NormalizerConfig,
    f: F,
) -> SonarGateResult<T>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: std::future::Future<Output = SonarGateResult<T>>,
{
    let asset = probe(path)?;
    let (effective_path, _guard) = if needs_normalization(&asset) {
        let cfg = cfg.clone();
        let source = path.to_path_buf();
        let normalized = tokio::task::spawn_blocking(move || normalize(&source, &cfg))
            .await
            .map_err(|e| SonarGateError::system(format!("normalization task panicked: {e}")))??;
        let guard = NormalizationGuard {
            path: Some(normalized.clone()),
        };
        (normalized, guard)
    } else {
        (path.to_path_buf(), NormalizationGuard { path: None })
    };

    f(effective_path).await
}

/// Delete temp files under `cfg.temp_dir` older than `cfg.max_temp_file_age_secs`.
/// Returns the number of files removed.
pub fn sweep_once(cfg: &NormalizerConfig) -> SonarGateResult<usize> {
    if !cfg.temp_dir.exists() {
        return Ok(0);
    }
    let max_age = Duration::from_secs(cfg.max_temp_file_age_secs);
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in std::fs::read_dir(&cfg.temp_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                if now.duration_since(modified).unwrap_or(Duration::ZERO) > max_age {
                    if std::fs::remove_file(&path).is_ok() {
                        removed += 1;
                    }
                }
            }
        }
    }
    Ok(removed)
}

/// Spawn the background sweeper loop; owned by whoever wires up the
/// application (the CLI entry point), not by any single analyzer call.
pub fn spawn_sweeper(cfg: NormalizerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_secs(cfg.sweep_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            if let Err(e) = sweep_once(&cfg) {
                log::warn!("temp sweep failed: {e}");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(sample_rate: u32, bit_depth: u16, format: &str) -> AudioAsset {
        AudioAsset {
            path: PathBuf::from("x"),
            format: format.to_string(),
            sample_rate,
            bit_depth,
            channels: 2,
            file_size: 0,
            duration: 0.0,
            loudness: None,
        }
    }

    #[test]
    fn canonical_asset_skips_normalization() {
        assert!(!needs_normalization(&asset(48_000, 24, "wav")));
        assert!(!needs_normalization(&asset(44_100, 16, "wav")));
    }

    #[test]
    fn lossy_codec_always_normalizes() {
        assert!(needs_normalization(&asset(44_100, 16, "mp3")));
    }

    #[test]
    fn unsupported_sample_rate_normalizes() {
        assert!(needs_normalization(&asset(22_050, 16, "wav")));
    }

    #[test]
    fn above_96k_always_normalizes() {
        assert!(needs_normalization(&asset(192_000, 24, "wav")));
    }

    #[test]
    fn guard_deletes_file_on_drop() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        tmp.persist(&path).unwrap();
        assert!(path.exists());
        {
            let _guard = NormalizationGuard {
                path: Some(path.clone()),
            };
        }
        assert!(!path.exists());
    }

    #[test]
    fn sweep_removes_only_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh.wav");
        std::fs::write(&fresh, b"x").unwrap();
        let cfg = NormalizerConfig {
            temp_dir: dir.path().to_path_buf(),
            sweep_interval_secs: 600,
            max_temp_file_age_secs: 3600,
        };
        let removed = sweep_once(&cfg).unwrap();
        assert_eq!(removed, 0);
        assert!(fresh.exists());
    }
}
