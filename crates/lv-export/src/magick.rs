use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use lv_core::frame::Timing;
use lv_core::traits::Animator;

/// Assemble les frames avec ImageMagick (`convert` ou `magick`) en sous-processus.
///
/// Runs `<program> -delay D -loop L <frames…> -alpha set +fuzz
/// -layers optimize-transparency <target>`. Long runs pass the frames as a
/// single wildcard pattern instead of one argument each.
///
/// # Example
/// ```no_run
/// use lv_export::MagickAnimator;
/// let im7 = MagickAnimator::with_program("magick");
/// ```
pub struct MagickAnimator {
    program: String,
}

impl Default for MagickAnimator {
    fn default() -> Self {
        Self::with_program("convert")
    }
}

impl MagickAnimator {
    #[must_use]
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Arguments passed to the program, target last.
    fn args(frames: &[PathBuf], target: &Path, timing: &Timing) -> Vec<String> {
        let mut args = vec![
            "-delay".to_string(),
            timing.delay_cs.to_string(),
            "-loop".to_string(),
            timing.loop_count().to_string(),
        ];
        args.extend(frame_args(frames));
        args.extend(
            ["-alpha", "set", "+fuzz", "-layers", "optimize-transparency"].map(String::from),
        );
        args.push(target.to_string_lossy().into_owned());
        args
    }
}

/// Au-delà, les frames sont passées par motif pour ne pas dépasser `ARG_MAX`.
const MAX_LISTED_FRAMES: usize = 512;

/// One argument per frame, or a single `<dir>/<prefix>*.<ext>` pattern that
/// ImageMagick expands itself when the list is long.
fn frame_args(frames: &[PathBuf]) -> Vec<String> {
    if frames.len() > MAX_LISTED_FRAMES
        && let Some(pattern) = shared_pattern(frames)
    {
        log::debug!("{} frames passées par motif {pattern}", frames.len());
        return vec![pattern];
    }
    frames.iter().map(|p| p.to_string_lossy().into_owned()).collect()
}

/// Pattern matching exactly `frames`, in the same order.
///
/// ImageMagick sorts wildcard matches by name, so the pattern is only used
/// when the frames are already in name order, share one directory, one
/// prefix and one extension, and nothing else in that directory matches.
fn shared_pattern(frames: &[PathBuf]) -> Option<String> {
    let first = frames.first()?;
    let dir = first.parent()?;
    let ext = first.extension()?.to_str()?;
    let name = first.file_name()?.to_str()?;
    let prefix = &name[..name.find(|c: char| c.is_ascii_digit())?];

    let matches = |path: &Path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix) && n.ends_with(&format!(".{ext}")))
    };

    let same_group = frames.iter().all(|p| p.parent() == Some(dir) && matches(p));
    let name_ordered = frames.windows(2).all(|w| w[0].file_name() < w[1].file_name());
    if !same_group || !name_ordered {
        return None;
    }

    let on_disk = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|e| matches(&e.path()))
        .count();
    (on_disk == frames.len())
        .then(|| dir.join(format!("{prefix}*.{ext}")).to_string_lossy().into_owned())
}

impl Animator for MagickAnimator {
    fn animate(&self, frames: &[PathBuf], target: &Path, timing: &Timing) -> Result<()> {
        if frames.is_empty() {
            anyhow::bail!("Aucune frame à animer");
        }

        let output = Command::new(&self.program)
            .args(Self::args(frames, target, timing))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| {
                format!(
                    "Échec du lancement de {} (ImageMagick est-il dans PATH ?)",
                    self.program
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} error: {stderr}", self.program);
        }

        log::info!("{} frames → {} via {}", frames.len(), target.display(), self.program);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "magick"
    }
}
