use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::board::Board;
use crate::frame::Timing;

/// Transforme un plateau en image sur disque.
///
/// Implémenté par : `TilePainter` (lv-render).
///
/// The board is only borrowed for the duration of the call: whatever is
/// written must reflect its content at that instant.
///
/// # Example
/// ```
/// use lv_core::traits::TileRenderer;
/// use lv_core::board::Board;
/// use std::path::Path;
///
/// struct DummyRenderer;
/// impl TileRenderer for DummyRenderer {
///     fn render(&self, _board: &Board, _path: &Path) -> anyhow::Result<()> { Ok(()) }
/// }
/// ```
pub trait TileRenderer {
    /// Compose `board` and write one bitmap at `path`.
    ///
    /// # Errors
    /// Any failure (missing tile, I/O, encoding) is returned unchanged to the caller.
    fn render(&self, board: &Board, path: &Path) -> Result<()>;
}

/// Assemble des frames ordonnées en une image animée.
///
/// Implémenté par : `GifAnimator`, `MagickAnimator` (lv-export).
///
/// # Example
/// ```
/// use lv_core::traits::Animator;
/// use lv_core::frame::Timing;
/// use std::path::{Path, PathBuf};
///
/// struct DummyAnimator;
/// impl Animator for DummyAnimator {
///     fn animate(&self, _frames: &[PathBuf], _target: &Path, _timing: &Timing) -> anyhow::Result<()> {
///         Ok(())
///     }
///     fn name(&self) -> &'static str { "dummy" }
/// }
/// ```
pub trait Animator {
    /// Write one animated image at `target` from `frames`, in slice order.
    ///
    /// # Errors
    /// Returns an error if a frame cannot be read or the output cannot be produced.
    fn animate(&self, frames: &[PathBuf], target: &Path, timing: &Timing) -> Result<()>;

    /// Nom lisible pour les logs.
    fn name(&self) -> &'static str;
}

/// User-facing progress markers, separate from the log facade.
pub trait ProgressSink {
    /// One frame export (written or skipped by the cap).
    fn frame(&mut self);

    /// Frames are about to be assembled.
    fn animating(&mut self);

    /// The input held no board.
    fn no_frames(&mut self);
}

/// Marqueurs de progression sur un flux texte : `.` par frame, `♡` avant l'animation.
///
/// # Example
/// ```
/// use lv_core::traits::{ProgressSink, TextProgress};
/// let mut out = Vec::new();
/// {
///     let mut progress = TextProgress::new(&mut out);
///     progress.frame();
///     progress.frame();
///     progress.animating();
/// }
/// assert_eq!(String::from_utf8(out).unwrap(), "..♡\n");
/// ```
pub struct TextProgress<W: Write> {
    out: W,
}

impl<W: Write> TextProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, marker: &str) {
        // Progress output is best-effort: a closed stderr must not abort a render.
        if let Err(e) = self.out.write_all(marker.as_bytes()).and_then(|()| self.out.flush()) {
            log::debug!("Marqueur de progression perdu : {e}");
        }
    }
}

impl TextProgress<std::io::Stderr> {
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> ProgressSink for TextProgress<W> {
    fn frame(&mut self) {
        self.emit(".");
    }

    fn animating(&mut self) {
        self.emit("♡\n");
    }

    fn no_frames(&mut self) {
        self.emit("! no frames\n");
    }
}

/// Silent mode.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn frame(&mut self) {}
    fn animating(&mut self) {}
    fn no_frames(&mut self) {}
}
