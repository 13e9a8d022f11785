use std::io::BufRead;

use anyhow::{Context, Result};

use crate::board::{Board, LineEvent};
use crate::exporter::FrameExporter;

/// Extra copies of the very first frame (pause at start).
pub const START_PAUSE: u32 = 3;

/// Extra copies of the last buffered board (pause at end).
pub const END_PAUSE: u32 = 3;

/// Bilan d'un passage sur le log.
#[derive(Clone, Debug)]
pub struct SequenceReport {
    /// Exports attempted, pauses and capped frames included.
    pub frames: u64,
    /// Frame files written.
    pub written: u64,
    /// Boards closed by a separator line.
    pub boards: u64,
    /// Board state when the stream ended.
    pub final_board: Board,
}

/// Découpe le flux de lignes en plateaux et exporte chaque plateau terminé.
///
/// A board is exported when the separator that ends it arrives, with the
/// rows it had before that separator. The first export of the run is held
/// for `START_PAUSE` extra frames; when the stream ends, the last buffered
/// board is held for `END_PAUSE` extra frames if anything was exported.
pub struct Sequencer<'a> {
    board: Board,
    exporter: FrameExporter<'a>,
    boards: u64,
    line_no: u64,
}

impl<'a> Sequencer<'a> {
    #[must_use]
    pub fn new(board: Board, exporter: FrameExporter<'a>) -> Self {
        Self {
            board,
            exporter,
            boards: 0,
            line_no: 0,
        }
    }

    /// Feed one line, trailing newline stripped.
    ///
    /// # Errors
    /// Propagates renderer failures.
    pub fn feed(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;
        if self.board.accept(line) != LineEvent::Finished {
            return Ok(());
        }

        self.boards += 1;
        log::debug!(
            "{} terminé ligne {} (plateau #{})",
            self.board,
            self.line_no,
            self.boards
        );

        if self.exporter.count() == 0 {
            for _ in 0..START_PAUSE {
                self.exporter.export(&self.board)?;
            }
        }
        self.exporter.export(&self.board)?;
        Ok(())
    }

    /// Close the stream: apply the end pause and report.
    ///
    /// # Errors
    /// Propagates renderer failures.
    pub fn finish(mut self) -> Result<SequenceReport> {
        if self.exporter.count() > 0 {
            for _ in 0..END_PAUSE {
                self.exporter.export(&self.board)?;
            }
        } else {
            log::warn!("Aucune frame : pas de plateau terminé en {} lignes", self.line_no);
        }

        log::info!(
            "{} plateaux, {} frames ({} écrites)",
            self.boards,
            self.exporter.count(),
            self.exporter.written()
        );

        Ok(SequenceReport {
            frames: self.exporter.count(),
            written: self.exporter.written(),
            boards: self.boards,
            final_board: self.board,
        })
    }

    /// Run over an in-memory sequence of lines.
    ///
    /// # Errors
    /// Propagates renderer failures.
    ///
    /// # Example
    /// ```
    /// use lv_core::board::Board;
    /// use lv_core::exporter::FrameExporter;
    /// use lv_core::sequencer::Sequencer;
    /// use lv_core::traits::{NoProgress, TileRenderer};
    /// use std::path::Path;
    ///
    /// struct Discard;
    /// impl TileRenderer for Discard {
    ///     fn render(&self, _: &Board, _: &Path) -> anyhow::Result<()> { Ok(()) }
    /// }
    ///
    /// let mut progress = NoProgress;
    /// let exporter = FrameExporter::new(&Discard, &mut progress, Path::new("frame.png"), None);
    /// let report = Sequencer::new(Board::new(), exporter)
    ///     .run(["#####", "#...#", "#####", "---"])
    ///     .unwrap();
    /// assert_eq!(report.frames, 7);
    /// ```
    pub fn run<I, S>(mut self, lines: I) -> Result<SequenceReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.feed(line.as_ref())?;
        }
        self.finish()
    }

    /// Run over a reader, one line at a time. `\n` and `\r\n` are stripped.
    ///
    /// Bytes that are not UTF-8 are decoded lossily: U+FFFD is outside the
    /// alphabet, so such a line acts as a separator.
    ///
    /// # Errors
    /// Returns read errors and renderer failures.
    pub fn run_reader<R: BufRead>(mut self, mut reader: R) -> Result<SequenceReport> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .with_context(|| format!("Lecture du log, ligne {}", self.line_no + 1))?;
            if read == 0 {
                break;
            }
            let line = strip_line_ending(&buf);
            self.feed(&String::from_utf8_lossy(line))?;
        }
        self.finish()
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::board::WidthPolicy;
    use crate::traits::{NoProgress, TileRenderer};

    #[derive(Default)]
    struct Recorder {
        frames: RefCell<Vec<(PathBuf, Vec<String>)>>,
    }

    impl TileRenderer for Recorder {
        fn render(&self, board: &Board, path: &Path) -> Result<()> {
            self.frames
                .borrow_mut()
                .push((path.to_path_buf(), board.lines().to_vec()));
            Ok(())
        }
    }

    fn run_lines(lines: &[&str], cap: Option<u64>) -> (SequenceReport, Vec<(PathBuf, Vec<String>)>) {
        let renderer = Recorder::default();
        let mut progress = NoProgress;
        let exporter = FrameExporter::new(&renderer, &mut progress, Path::new("frame.png"), cap);
        let report = Sequencer::new(Board::new(), exporter)
            .run(lines.iter().copied())
            .unwrap();
        (report, renderer.frames.into_inner())
    }

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn no_board_rows_means_no_frames() {
        let (report, frames) = run_lines(&["Score: 0", "moves: LLRR", "---"], None);
        assert_eq!(report.frames, 0);
        assert_eq!(report.boards, 0);
        assert!(frames.is_empty());
    }

    #[test]
    fn empty_stream_means_no_frames() {
        let (report, frames) = run_lines(&[], None);
        assert_eq!(report.frames, 0);
        assert!(frames.is_empty());
        assert_eq!(report.final_board.height(), 0);
    }

    #[test]
    fn unterminated_single_board_is_never_exported() {
        let (report, frames) = run_lines(&["#####", "#R.L#", "#####"], None);
        assert_eq!(report.frames, 0);
        assert!(frames.is_empty());
        assert_eq!(report.final_board.height(), 3);
    }

    #[test]
    fn single_board_gets_start_and_end_pause() {
        let (report, frames) = run_lines(&["#####", "#...#", "#####", "---"], None);
        assert_eq!(report.frames, 7);
        assert_eq!(report.written, 7);
        assert_eq!(report.boards, 1);
        let expected = rows(&["#####", "#...#", "#####"]);
        assert!(frames.iter().all(|(_, lines)| *lines == expected));
        assert_eq!(frames[0].0, PathBuf::from("frame000000.png"));
        assert_eq!(frames[6].0, PathBuf::from("frame000006.png"));
    }

    #[test]
    fn later_boards_are_exported_once() {
        let input = [
            "###", "#R#", "###", "", // board 1
            "###", "#.#", "###", "score 1", // board 2
            "###", "#L#", "###", "score 2", // board 3
        ];
        let (report, frames) = run_lines(&input, None);
        // 4 (first + pause) + 1 + 1 + 3 (end pause)
        assert_eq!(report.frames, 9);
        assert_eq!(report.boards, 3);
        let contents: Vec<_> = frames.iter().map(|(_, l)| l[1].clone()).collect();
        assert_eq!(
            contents,
            vec!["#R#", "#R#", "#R#", "#R#", "#.#", "#L#", "#L#", "#L#", "#L#"]
        );
    }

    #[test]
    fn end_pause_uses_board_still_in_progress() {
        let input = ["##", "#R", "--", "##", "R#"];
        let (report, frames) = run_lines(&input, None);
        assert_eq!(report.frames, 7);
        assert_eq!(frames[3].1, rows(&["##", "#R"]));
        assert_eq!(frames[4].1, rows(&["##", "R#"]));
        assert!(!report.final_board.is_complete());
    }

    #[test]
    fn ordinals_are_contiguous_from_zero() {
        let input = ["#", "-", "*", "-", "R", "-", "L"];
        let (report, frames) = run_lines(&input, None);
        let names: Vec<_> = frames.iter().map(|(p, _)| p.clone()).collect();
        let expected: Vec<_> = (0..report.frames)
            .map(|n| crate::frame::frame_path(Path::new("frame.png"), n))
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn cap_limits_files_not_the_count() {
        let input = ["#", "-", "*", "-", "R", "-"];
        let (report, frames) = run_lines(&input, Some(3));
        // 4 + 1 + 1 + 3
        assert_eq!(report.frames, 9);
        assert_eq!(report.written, 3);
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn wrong_width_row_closes_the_board() {
        let (report, frames) = run_lines(&["#####", "#R..#", "###"], None);
        assert_eq!(report.boards, 1);
        assert_eq!(frames.len(), 7);
        assert_eq!(frames[0].1, rows(&["#####", "#R..#"]));
    }

    #[test]
    fn per_board_width_accepts_resized_boards() {
        let renderer = Recorder::default();
        let mut progress = NoProgress;
        let exporter = FrameExporter::new(&renderer, &mut progress, Path::new("f.png"), None);
        let report = Sequencer::new(Board::with_policy(WidthPolicy::PerBoard), exporter)
            .run(["###", "-", "#####", "-"])
            .unwrap();
        assert_eq!(report.boards, 2);
        let frames = renderer.frames.into_inner();
        assert_eq!(frames.last().map(|(_, l)| l.clone()), Some(rows(&["#####"])));
    }

    #[test]
    fn reader_strips_line_endings() {
        let renderer = Recorder::default();
        let mut progress = NoProgress;
        let exporter = FrameExporter::new(&renderer, &mut progress, Path::new("f.png"), None);
        let input = "###\r\n#R#\r\n###\r\nend\r\n";
        let report = Sequencer::new(Board::new(), exporter)
            .run_reader(input.as_bytes())
            .unwrap();
        assert_eq!(report.boards, 1);
        assert_eq!(report.final_board.lines(), ["###", "#R#", "###"]);
    }

    #[test]
    fn invalid_utf8_line_is_a_separator() {
        let renderer = Recorder::default();
        let mut progress = NoProgress;
        let exporter = FrameExporter::new(&renderer, &mut progress, Path::new("f.png"), None);
        let input: &[u8] = b"###\n#R#\n###\nScore \xe9t\xe9\n###\n#.#\n###\n";
        let report = Sequencer::new(Board::new(), exporter)
            .run_reader(input)
            .unwrap();
        // 4 + 3: the second board is never closed
        assert_eq!(report.boards, 1);
        assert_eq!(report.frames, 7);
        let frames = renderer.frames.into_inner();
        assert_eq!(frames[0].1, rows(&["###", "#R#", "###"]));
        assert_eq!(frames[6].1, rows(&["###", "#.#", "###"]));
    }

    #[test]
    fn last_line_without_newline_is_read() {
        let renderer = Recorder::default();
        let mut progress = NoProgress;
        let exporter = FrameExporter::new(&renderer, &mut progress, Path::new("f.png"), None);
        let report = Sequencer::new(Board::new(), exporter)
            .run_reader("#\n#\nend".as_bytes())
            .unwrap();
        assert_eq!(report.boards, 1);
    }
}
