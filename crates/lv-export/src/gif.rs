use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage, imageops};
use lv_core::frame::Timing;
use lv_core::traits::Animator;

/// Encodeur GIF natif (crate `image`), sans outil externe.
///
/// Frames of different sizes are anchored top-left on a canvas as large as
/// the largest frame.
///
/// # Example
/// ```no_run
/// use lv_core::frame::Timing;
/// use lv_core::traits::Animator;
/// use lv_export::GifAnimator;
/// use std::path::{Path, PathBuf};
///
/// let frames = vec![PathBuf::from("frame000000.png"), PathBuf::from("frame000001.png")];
/// let timing = Timing::from_fps(5.0, true).unwrap();
/// GifAnimator::default().animate(&frames, Path::new("out.gif"), &timing).unwrap();
/// ```
pub struct GifAnimator {
    /// NeuQuant speed [1, 30]: 1 = best palette, 30 = fastest.
    speed: i32,
}

impl Default for GifAnimator {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

impl GifAnimator {
    #[must_use]
    pub fn with_speed(speed: i32) -> Self {
        Self {
            speed: speed.clamp(1, 30),
        }
    }

    /// Largest width and height among `frames`, read from the file headers.
    fn canvas_size(frames: &[PathBuf]) -> Result<(u32, u32)> {
        frames.iter().try_fold((0, 0), |(w, h), path| {
            let (fw, fh) = image::image_dimensions(path)
                .with_context(|| format!("Frame illisible : {}", path.display()))?;
            Ok((w.max(fw), h.max(fh)))
        })
    }
}

impl Animator for GifAnimator {
    fn animate(&self, frames: &[PathBuf], target: &Path, timing: &Timing) -> Result<()> {
        if frames.is_empty() {
            anyhow::bail!("Aucune frame à animer");
        }
        let (width, height) = Self::canvas_size(frames)?;

        let file = File::create(target)
            .with_context(|| format!("Impossible de créer {}", target.display()))?;
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), self.speed);
        if timing.looping {
            encoder.set_repeat(Repeat::Infinite)?;
        }
        let delay = Delay::from_numer_denom_ms(timing.delay_ms(), 1);

        for path in frames {
            let img = image::open(path)
                .with_context(|| format!("Frame illisible : {}", path.display()))?
                .to_rgba8();
            let img = if img.dimensions() == (width, height) {
                img
            } else {
                let mut canvas = RgbaImage::new(width, height);
                imageops::replace(&mut canvas, &img, 0, 0);
                canvas
            };
            encoder
                .encode_frame(Frame::from_parts(img, 0, 0, delay))
                .with_context(|| format!("Encodage GIF de {}", path.display()))?;
        }

        log::info!(
            "{} frames → {} ({} cs/frame)",
            frames.len(),
            target.display(),
            timing.delay_cs
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gif"
    }
}
