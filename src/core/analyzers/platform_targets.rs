//! Loudness target table shared by the loudness analyzer (4.C.1) and the
//! ReplayGain/platform-normalization predictor (4.C.8). Distinct from the
//! delivery orchestrator's per-platform technical contract
//! (`core::delivery::platforms`), which covers formats/bit depth/file size
//! rather than loudness targets alone.

/// Whether a platform only turns a track down to its target, or normalizes
/// both up and down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoudnessMode {
    /// Only attenuates tracks louder than the target; quieter tracks are
    /// left untouched.
    DownOnly,
    /// Normalizes toward the target in both directions.
    UpAndDown,
}

/// One platform's loudness target.
#[derive(Debug, Clone, Copy)]
pub struct PlatformLoudnessTarget {
    /// Platform identifier.
    pub name: &'static str,
    /// Target integrated loudness, in LUFS.
    pub target_lufs: f64,
    /// Normalization behavior.
    pub mode: LoudnessMode,
}

/// The built-in platform loudness table.
pub const TABLE: &[PlatformLoudnessTarget] = &[
    PlatformLoudnessTarget {
        name: "spotify",
        target_lufs: -14.0,
        mode: LoudnessMode::DownOnly,
    },
    PlatformLoudnessTarget {
        name: "apple_music",
        target_lufs: -16.0,
        mode: LoudnessMode::UpAndDown,
    },
    PlatformLoudnessTarget {
        name: "youtube",
        target_lufs: -14.0,
        mode: LoudnessMode::DownOnly,
    },
    PlatformLoudnessTarget {
        name: "tidal",
        target_lufs: -14.0,
        mode: LoudnessMode::UpAndDown,
    },
    PlatformLoudnessTarget {
        name: "ebu_r128",
        target_lufs: -23.0,
        mode: LoudnessMode::UpAndDown,
    },
];

/// Look up a platform by (case-insensitive) name.
pub fn find(name: &str) -> Option<&'static PlatformLoudnessTarget> {
    let name = name.to_lowercase();
    TABLE.iter().find(|p| p.name == name)
}

/// Predicted effective playback loudness once `platform` applies its own
/// normalization to a track measured at `integrated` LUFS.
pub fn predict_playback(integrated: f64, platform: &PlatformLoudnessTarget) -> f64 {
    match platform.mode {
        LoudnessMode::DownOnly => {
            if integrated > platform.target_lufs {
                platform.target_lufs
            } else {
                integrated
            }
        }
        LoudnessMode::UpAndDown => platform.target_lufs,
    }
}

/// The loudness that minimizes total predicted-playback deviation across
/// `candidates` when a track targets multiple platforms at once.
pub fn sweet_spot(integrated: f64, candidates: &[&'static PlatformLoudnessTarget]) -> f64 {
    if candidates.is_empty() {
        return integrated;
    }
    let sum: f64 = candidates.iter().map(|p| p.target_lufs).sum();
    sum / candidates.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_only_platform_attenuates_hot_track() {
        let spotify = find("spotify").unwrap();
        assert_eq!(predict_playback(-8.0, spotify), -14.0);
    }

    #[test]
    fn down_only_platform_leaves_quiet_track_alone() {
        let spotify = find("spotify").unwrap();
        assert_eq!(predict_playback(-20.0, spotify), -20.0);
    }

    #[test]
    fn up_and_down_platform_always_normalizes_to_target() {
        let apple = find("apple_music").unwrap();
        assert_eq!(predict_playback(-20.0, apple), -16.0);
        assert_eq!(predict_playback(-8.0, apple), -16.0);
    }
}
