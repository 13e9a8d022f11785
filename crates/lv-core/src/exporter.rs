use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::board::Board;
use crate::frame::frame_path;
use crate::traits::{ProgressSink, TileRenderer};

/// Result of one export request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// A frame file was rendered.
    Written {
        /// Frame number.
        ordinal: u64,
        /// File written by the renderer.
        path: PathBuf,
    },
    /// The cap was reached: the ordinal is consumed, nothing is written.
    Skipped {
        /// Frame number.
        ordinal: u64,
    },
}

/// Numérote les frames et délègue leur rendu.
///
/// The counter counts export *attempts*: once the cap is reached it keeps
/// advancing while no file is written, so ordinals are never reused.
///
/// # Example
/// ```
/// use lv_core::board::Board;
/// use lv_core::exporter::{ExportOutcome, FrameExporter};
/// use lv_core::traits::{NoProgress, TileRenderer};
/// use std::path::Path;
///
/// struct Discard;
/// impl TileRenderer for Discard {
///     fn render(&self, _: &Board, _: &Path) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// let mut progress = NoProgress;
/// let mut exporter = FrameExporter::new(&Discard, &mut progress, Path::new("frame.png"), Some(1));
/// let board = Board::from_rows(&["#"]);
/// assert!(matches!(exporter.export(&board).unwrap(), ExportOutcome::Written { ordinal: 0, .. }));
/// assert_eq!(exporter.export(&board).unwrap(), ExportOutcome::Skipped { ordinal: 1 });
/// assert_eq!((exporter.count(), exporter.written()), (2, 1));
/// ```
pub struct FrameExporter<'a> {
    renderer: &'a dyn TileRenderer,
    progress: &'a mut dyn ProgressSink,
    template: PathBuf,
    max_frames: Option<u64>,
    count: u64,
    written: u64,
}

impl<'a> FrameExporter<'a> {
    /// `template` is the path frame numbers are spliced into
    /// (`dir/frame.png` → `dir/frame000000.png`).
    pub fn new(
        renderer: &'a dyn TileRenderer,
        progress: &'a mut dyn ProgressSink,
        template: &Path,
        max_frames: Option<u64>,
    ) -> Self {
        Self {
            renderer,
            progress,
            template: template.to_path_buf(),
            max_frames,
            count: 0,
            written: 0,
        }
    }

    /// Export the board as it is right now.
    ///
    /// # Errors
    /// Renderer errors are returned unchanged. The ordinal stays consumed.
    pub fn export(&mut self, board: &Board) -> Result<ExportOutcome> {
        let ordinal = self.count;
        self.count += 1;
        self.progress.frame();

        if self.max_frames.is_some_and(|cap| ordinal >= cap) {
            log::trace!("Frame {ordinal} ignorée (plafond atteint)");
            return Ok(ExportOutcome::Skipped { ordinal });
        }

        let path = frame_path(&self.template, ordinal);
        log::trace!("Frame {ordinal} : {board} → {}", path.display());
        self.renderer.render(board, &path)?;
        self.written += 1;
        Ok(ExportOutcome::Written { ordinal, path })
    }

    /// Exports attempted so far, capped or not.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Frame files actually written.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
    }

    impl TileRenderer for Recorder {
        fn render(&self, board: &Board, path: &Path) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((path.to_path_buf(), board.lines().to_vec()));
            Ok(())
        }
    }

    struct Failing;

    impl TileRenderer for Failing {
        fn render(&self, _board: &Board, _path: &Path) -> Result<()> {
            anyhow::bail!("tuile manquante")
        }
    }

    #[derive(Default)]
    struct Ticks(usize);

    impl ProgressSink for Ticks {
        fn frame(&mut self) {
            self.0 += 1;
        }
        fn animating(&mut self) {}
        fn no_frames(&mut self) {}
    }

    #[test]
    fn uncapped_exports_write_sequential_files() {
        let renderer = Recorder::default();
        let mut ticks = Ticks::default();
        let board = Board::from_rows(&["#R#"]);
        {
            let mut exporter =
                FrameExporter::new(&renderer, &mut ticks, Path::new("out/frame.png"), None);
            for _ in 0..3 {
                exporter.export(&board).unwrap();
            }
            assert_eq!(exporter.written(), 3);
        }
        let calls = renderer.calls.borrow();
        let paths: Vec<_> = calls.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/frame000000.png"),
                PathBuf::from("out/frame000001.png"),
                PathBuf::from("out/frame000002.png"),
            ]
        );
        assert!(calls.iter().all(|(_, lines)| lines == &["#R#"]));
        assert_eq!(ticks.0, 3);
    }

    #[test]
    fn cap_stops_writing_but_keeps_counting() {
        let renderer = Recorder::default();
        let mut ticks = Ticks::default();
        let board = Board::from_rows(&["#"]);
        let mut exporter = FrameExporter::new(&renderer, &mut ticks, Path::new("f.png"), Some(2));
        let outcomes: Vec<_> = (0..5).map(|_| exporter.export(&board).unwrap()).collect();
        assert_eq!(exporter.count(), 5);
        assert_eq!(exporter.written(), 2);
        assert_eq!(outcomes[2], ExportOutcome::Skipped { ordinal: 2 });
        assert_eq!(outcomes[4], ExportOutcome::Skipped { ordinal: 4 });
        drop(exporter);
        assert_eq!(renderer.calls.borrow().len(), 2);
        assert_eq!(ticks.0, 5);
    }

    #[test]
    fn renderer_error_propagates() {
        let mut ticks = Ticks::default();
        let mut exporter = FrameExporter::new(&Failing, &mut ticks, Path::new("f.png"), None);
        let err = exporter.export(&Board::from_rows(&["#"])).unwrap_err();
        assert_eq!(err.to_string(), "tuile manquante");
        assert_eq!(exporter.written(), 0);
    }
}
