//! Directory scan and optional random sampling.

use std::path::{Path, PathBuf};

use crate::error::SonarGateResult;

/// Extensions the catalog scan treats as audio assets, mirroring the
/// lossy/lossless families the pre-analysis normalizer already recognizes.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "flac", "aiff", "mp3", "aac", "m4a", "ogg"];

/// Recursively walk `root`, returning every file whose extension is in
/// [`SUPPORTED_EXTENSIONS`] (case-insensitive).
pub fn scan_directory(root: &Path) -> SonarGateResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_supported = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if is_supported {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

/// A small xorshift-style generator seeded from a fresh UUID, used only for
/// sampling order — no dedicated random crate is in the dependency stack,
/// and sampling does not need cryptographic quality (same reasoning as
/// `core::delivery::upload::pseudo_random_unit`).
struct SeedRng(u64);

impl SeedRng {
    fn new() -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        uuid::Uuid::new_v4().hash(&mut hasher);
        Self(hasher.finish().max(1))
    }

    fn next_below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % bound as u64) as usize
    }
}

/// Fisher-Yates partial shuffle of `files`, truncated to `n` entries. If
/// `n >= files.len()`, every file is kept (shuffle is still applied so
/// result order isn't meaningful either way).
pub fn sample(mut files: Vec<PathBuf>, n: usize) -> Vec<PathBuf> {
    let len = files.len();
    if n >= len {
        return files;
    }
    let mut rng = SeedRng::new();
    for i in (1..len).rev() {
        let j = rng.next_below(i + 1);
        files.swap(i, j);
    }
    files.truncate(n);
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_keeps_all_when_n_exceeds_length() {
        let files = vec![PathBuf::from("a"), PathBuf::from("b")];
        assert_eq!(sample(files.clone(), 10).len(), 2);
    }

    #[test]
    fn sample_truncates_to_requested_count() {
        let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("f{i}"))).collect();
        assert_eq!(sample(files, 5).len(), 5);
    }

    #[test]
    fn scan_finds_only_supported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"").unwrap();
        let found = scan_directory(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
    }
}
