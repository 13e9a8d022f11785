use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lv_core::board::Board;
use lv_core::config::AnimConfig;
use lv_core::exporter::FrameExporter;
use lv_core::frame::Timing;
use lv_core::sequencer::Sequencer;
use lv_core::traits::{Animator, NoProgress, ProgressSink, TextProgress, TileRenderer};
use serde::Serialize;

use crate::workdir::WorkDir;

/// Source du log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

/// Destination de l'animation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Input {
    /// `-` is standard input.
    #[must_use]
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(p) if p != Path::new("-") => Self::File(p.to_path_buf()),
            _ => Self::Stdin,
        }
    }
}

impl Output {
    /// `-` is standard output.
    #[must_use]
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(p) if p != Path::new("-") => Self::File(p.to_path_buf()),
            _ => Self::Stdout,
        }
    }
}

/// Bilan d'un job, sérialisable pour `--report`.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct JobReport {
    /// Exports attempted, pauses and capped frames included.
    pub frames: u64,
    /// Frame files written.
    pub frames_written: u64,
    /// Boards closed by a separator line.
    pub boards: u64,
    /// Columns of the last buffered board.
    pub board_width: usize,
    /// Rows of the last buffered board.
    pub board_height: usize,
    /// An animated image was produced.
    pub animated: bool,
    /// Frame files moved to the save directory.
    pub frames_saved: usize,
}

/// Un log → une animation.
///
/// Owns nothing but borrowed collaborators: the same renderer and animator
/// can serve several jobs (watch mode).
pub struct AnimationJob<'a> {
    config: &'a AnimConfig,
    renderer: &'a dyn TileRenderer,
    animator: &'a dyn Animator,
}

impl<'a> AnimationJob<'a> {
    #[must_use]
    pub fn new(
        config: &'a AnimConfig,
        renderer: &'a dyn TileRenderer,
        animator: &'a dyn Animator,
    ) -> Self {
        Self {
            config,
            renderer,
            animator,
        }
    }

    /// Open `input` and run.
    ///
    /// # Errors
    /// Returns an error if the input cannot be opened, or any step fails.
    pub fn run(&self, input: &Input, output: &Output) -> Result<JobReport> {
        match input {
            Input::Stdin => self.run_reader(io::stdin().lock(), output),
            Input::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Impossible d'ouvrir {}", path.display()))?;
                self.run_reader(BufReader::new(file), output)
            }
        }
    }

    /// Segment `reader`, render frames into a temporary directory, animate
    /// them, optionally keep them. The temporary directory is removed on
    /// every exit path.
    ///
    /// # Errors
    /// Renderer and animator failures are returned unchanged.
    pub fn run_reader<R: BufRead>(&self, reader: R, output: &Output) -> Result<JobReport> {
        let timing = Timing::from_fps(self.config.fps, self.config.looping)?;
        let work = WorkDir::new()?;

        let mut progress: Box<dyn ProgressSink> = if self.config.silent {
            Box::new(NoProgress)
        } else {
            Box::new(TextProgress::stderr())
        };

        let template = work.frame_template(&self.config.frame_format);
        let exporter = FrameExporter::new(
            self.renderer,
            progress.as_mut(),
            &template,
            self.config.max_frames(),
        );
        let board = Board::with_policy(self.config.width_policy);
        let seq = Sequencer::new(board, exporter).run_reader(reader)?;

        let mut report = JobReport {
            frames: seq.frames,
            frames_written: seq.written,
            boards: seq.boards,
            board_width: seq.final_board.columns(),
            board_height: seq.final_board.height(),
            ..JobReport::default()
        };

        let frames = work.frames()?;
        if seq.frames > 0 {
            progress.animating();
            self.animate(&work, &frames, output, &timing)?;
            report.animated = true;
        } else {
            progress.no_frames();
        }

        if let Some(dir) = &self.config.save_frames {
            report.frames_saved = work.persist(&frames, dir)?;
        }

        Ok(report)
    }

    fn animate(
        &self,
        work: &WorkDir,
        frames: &[PathBuf],
        output: &Output,
        timing: &Timing,
    ) -> Result<()> {
        log::info!("Animation de {} frames ({})", frames.len(), self.animator.name());
        match output {
            Output::File(target) => self.animator.animate(frames, target, timing),
            Output::Stdout => {
                let target = work.path().join("animation.gif");
                self.animator.animate(frames, &target, timing)?;
                let mut src = File::open(&target)
                    .with_context(|| format!("Animation introuvable : {}", target.display()))?;
                let mut stdout = io::stdout().lock();
                io::copy(&mut src, &mut stdout).context("Écriture sur stdout")?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}
