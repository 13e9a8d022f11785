use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Frames per second must be a finite, strictly positive number.
    #[error("FPS invalide : {0}")]
    InvalidFps(f64),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// A board with no column or no row cannot be rasterised.
    #[error("Plateau vide ({columns}×{rows}) : aucune image possible")]
    EmptyBoard {
        /// Columns of the board.
        columns: usize,
        /// Rows of the board.
        rows: usize,
    },

    /// Tile images of one set must all share the same size.
    #[error("Tuile {name} : {width}×{height}, attendu {expected_width}×{expected_height}")]
    TileSizeMismatch {
        /// Tile name (`wall`, `rock`, ...).
        name: &'static str,
        /// Actual width.
        width: u32,
        /// Actual height.
        height: u32,
        /// Width of the reference tile.
        expected_width: u32,
        /// Height of the reference tile.
        expected_height: u32,
    },
}
