/// Board segmentation, frame export and configuration for liftviz.
///
/// This crate contains the line-stream state machine, the frame pacing
/// logic and the collaborator traits used across the liftviz workspace.

pub mod board;
pub mod config;
pub mod error;
pub mod exporter;
pub mod frame;
pub mod sequencer;
pub mod traits;

pub use board::{Board, BoardState, LineEvent, Tile, WidthPolicy};
pub use config::AnimConfig;
pub use error::CoreError;
pub use exporter::{ExportOutcome, FrameExporter};
pub use frame::Timing;
pub use sequencer::{SequenceReport, Sequencer};
