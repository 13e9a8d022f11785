/// Frame assembly and job orchestration for liftviz (GIF, ImageMagick).

pub mod gif;
pub mod job;
pub mod magick;
pub mod workdir;

pub use gif::GifAnimator;
pub use job::{AnimationJob, Input, JobReport, Output};
pub use magick::MagickAnimator;
pub use workdir::WorkDir;
