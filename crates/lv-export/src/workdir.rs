use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Nom de base des fichiers frame dans le dossier de travail.
pub const FRAME_STEM: &str = "frame";

/// Dossier temporaire d'un job, supprimé au drop (succès, erreur ou panic).
///
/// # Example
/// ```
/// use lv_export::WorkDir;
/// let path = {
///     let work = WorkDir::new().unwrap();
///     assert!(work.path().is_dir());
///     work.path().to_path_buf()
/// };
/// assert!(!path.exists());
/// ```
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// # Errors
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("liftviz-")
            .tempdir()
            .context("Impossible de créer le dossier temporaire")?;
        log::debug!("Dossier de travail : {}", dir.path().display());
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Template the frame numbers are spliced into (`<dir>/frame.<ext>`).
    #[must_use]
    pub fn frame_template(&self, ext: &str) -> PathBuf {
        self.path().join(format!("{FRAME_STEM}.{ext}"))
    }

    /// Frame files currently in the directory, in ordinal order (past six
    /// digits, `frame1000000` still sorts after `frame999999`).
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed.
    pub fn frames(&self) -> Result<Vec<PathBuf>> {
        let mut frames = Vec::new();
        for entry in fs::read_dir(self.path())? {
            let path = entry?.path();
            let is_frame = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FRAME_STEM));
            if is_frame {
                frames.push(path);
            }
        }
        frames.sort_by_cached_key(|p| (frame_ordinal(p), p.clone()));
        Ok(frames)
    }

    /// Move `frames` into `target_dir` (created if missing). Returns how many
    /// files were moved.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or a file cannot be moved.
    pub fn persist(&self, frames: &[PathBuf], target_dir: &Path) -> Result<usize> {
        fs::create_dir_all(target_dir)
            .with_context(|| format!("Impossible de créer {}", target_dir.display()))?;

        for src in frames {
            let Some(name) = src.file_name() else {
                continue;
            };
            let dst = target_dir.join(name);
            if fs::rename(src, &dst).is_err() {
                // rename fails across file systems (tmpfs → disk).
                fs::copy(src, &dst).with_context(|| {
                    format!("Impossible de copier {} → {}", src.display(), dst.display())
                })?;
                fs::remove_file(src)?;
            }
        }

        log::info!("{} frames conservées dans {}", frames.len(), target_dir.display());
        Ok(frames.len())
    }
}

/// Number between the stem and the extension: `frame000042.png` → 42.
fn frame_ordinal(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix(FRAME_STEM)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_listed_in_order() {
        let work = WorkDir::new().unwrap();
        for n in [2, 0, 10, 1] {
            fs::write(lv_core::frame::frame_path(&work.frame_template("png"), n), b"x").unwrap();
        }
        fs::write(work.path().join("animation.gif"), b"x").unwrap();
        let names: Vec<_> = work
            .frames()
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        assert_eq!(
            names,
            [
                "frame000000.png",
                "frame000001.png",
                "frame000002.png",
                "frame000010.png"
            ]
        );
    }

    #[test]
    fn persist_moves_files() {
        let work = WorkDir::new().unwrap();
        let target = tempfile::tempdir().unwrap();
        let dest = target.path().join("saved");
        let frame = work.path().join("frame000000.png");
        fs::write(&frame, b"png").unwrap();

        let moved = work.persist(&[frame.clone()], &dest).unwrap();
        assert_eq!(moved, 1);
        assert!(!frame.exists());
        assert_eq!(fs::read(dest.join("frame000000.png")).unwrap(), b"png");
    }

    #[test]
    fn persist_creates_directory_even_without_frames() {
        let work = WorkDir::new().unwrap();
        let target = tempfile::tempdir().unwrap();
        let dest = target.path().join("empty");
        assert_eq!(work.persist(&[], &dest).unwrap(), 0);
        assert!(dest.is_dir());
    }

    #[test]
    fn frames_past_six_digits_keep_ordinal_order() {
        let work = WorkDir::new().unwrap();
        let template = work.frame_template("png");
        for n in [1_000_000, 999_999, 5] {
            fs::write(lv_core::frame::frame_path(&template, n), b"x").unwrap();
        }
        let ordinals: Vec<_> = work
            .frames()
            .unwrap()
            .iter()
            .map(|p| frame_ordinal(p.as_path()))
            .collect();
        assert_eq!(ordinals, [Some(5), Some(999_999), Some(1_000_000)]);
    }
}
