use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Chiffres du numéro de frame dans les noms de fichiers.
pub const FRAME_DIGITS: usize = 6;

/// Path of frame `ordinal`: the zero-padded number is spliced between the
/// template's stem and its extension.
///
/// # Example
/// ```
/// use lv_core::frame::frame_path;
/// use std::path::Path;
/// let p = frame_path(Path::new("/tmp/job/frame.png"), 42);
/// assert_eq!(p, Path::new("/tmp/job/frame000042.png"));
/// ```
#[must_use]
pub fn frame_path(template: &Path, ordinal: u64) -> PathBuf {
    let mut name = OsString::new();
    if let Some(stem) = template.file_stem() {
        name.push(stem);
    }
    name.push(format!("{ordinal:0width$}", width = FRAME_DIGITS));
    if let Some(ext) = template.extension() {
        name.push(".");
        name.push(ext);
    }
    template.with_file_name(name)
}

/// Paramètres de lecture de l'animation.
///
/// # Example
/// ```
/// use lv_core::frame::Timing;
/// let t = Timing::from_fps(5.0, false).unwrap();
/// assert!((t.delay_cs - 20.0).abs() < 1e-9);
/// assert_eq!(t.delay_ms(), 200);
/// assert_eq!(t.loop_count(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    /// Delay per frame in centiseconds, kept to two decimals.
    pub delay_cs: f64,
    /// Repeat forever instead of playing once.
    pub looping: bool,
}

impl Timing {
    /// Derive the frame delay from a frame rate: `round(10000 / fps) / 100`.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidFps` if `fps` is not finite and positive.
    pub fn from_fps(fps: f64, looping: bool) -> Result<Self, CoreError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(CoreError::InvalidFps(fps));
        }
        Ok(Self {
            delay_cs: (10_000.0 / fps).round() / 100.0,
            looping,
        })
    }

    /// Delay per frame in whole milliseconds.
    #[must_use]
    pub fn delay_ms(&self) -> u32 {
        (self.delay_cs * 10.0).round() as u32
    }

    /// Loop count in the GIF / ImageMagick sense: 0 repeats forever, 1 plays once.
    #[must_use]
    pub fn loop_count(&self) -> u32 {
        u32::from(!self.looping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_path_pads_to_six_digits() {
        let template = Path::new("frames/frame.png");
        assert_eq!(frame_path(template, 0), Path::new("frames/frame000000.png"));
        assert_eq!(frame_path(template, 7), Path::new("frames/frame000007.png"));
        assert_eq!(
            frame_path(template, 1_234_567),
            Path::new("frames/frame1234567.png")
        );
    }

    #[test]
    fn frame_path_without_extension() {
        assert_eq!(frame_path(Path::new("out"), 3), Path::new("out000003"));
    }

    #[test]
    fn frame_paths_sort_in_ordinal_order() {
        let template = Path::new("frame.png");
        let mut paths: Vec<_> = [10, 2, 100, 0].iter().map(|&n| frame_path(template, n)).collect();
        paths.sort();
        let expected: Vec<_> = [0, 2, 10, 100].iter().map(|&n| frame_path(template, n)).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn delay_rounds_to_hundredths() {
        let t = Timing::from_fps(3.0, true).unwrap();
        assert!((t.delay_cs - 33.33).abs() < 1e-9);
        assert_eq!(t.delay_ms(), 333);
        assert_eq!(t.loop_count(), 0);
    }

    #[test]
    fn rejects_non_positive_fps() {
        assert!(Timing::from_fps(0.0, false).is_err());
        assert!(Timing::from_fps(-1.0, false).is_err());
        assert!(Timing::from_fps(f64::NAN, false).is_err());
    }
}
