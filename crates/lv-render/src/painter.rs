use std::io::{Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage, imageops};
use lv_core::board::Board;
use lv_core::error::CoreError;
use lv_core::traits::TileRenderer;

use crate::tileset::TileSet;

/// Compose un plateau en image RGBA à partir d'un jeu de tuiles.
///
/// Tiles are pasted row-major with no gap or overlap; the output is
/// `(columns × tile_width, rows × tile_height)`. Painting is deterministic
/// for a fixed tile set.
///
/// # Example
/// ```
/// use lv_core::board::Board;
/// use lv_render::{TilePainter, TileSet};
/// let painter = TilePainter::new(TileSet::builtin(4));
/// let img = painter.compose(&Board::from_rows(&["###", "#R#"])).unwrap();
/// assert_eq!(img.dimensions(), (12, 8));
/// ```
pub struct TilePainter {
    tiles: TileSet,
    /// Used when the target path has no recognised extension.
    default_format: ImageFormat,
}

impl TilePainter {
    #[must_use]
    pub fn new(tiles: TileSet) -> Self {
        Self::with_format(tiles, ImageFormat::Png)
    }

    #[must_use]
    pub fn with_format(tiles: TileSet, default_format: ImageFormat) -> Self {
        Self {
            tiles,
            default_format,
        }
    }

    /// Dimensions prévues de l'image pour une grille donnée.
    #[must_use]
    pub fn target_dimensions(&self, columns: u32, rows: u32) -> (u32, u32) {
        let (tw, th) = self.tiles.tile_size();
        (columns * tw, rows * th)
    }

    /// Paint the board's buffered rows.
    ///
    /// # Errors
    /// Returns `CoreError::EmptyBoard` for a board without columns or rows,
    /// or an error if the board is too large for a bitmap.
    pub fn compose(&self, board: &Board) -> Result<RgbaImage> {
        if board.columns() == 0 || board.height() == 0 {
            return Err(CoreError::EmptyBoard {
                columns: board.columns(),
                rows: board.height(),
            }
            .into());
        }
        let columns = u32::try_from(board.columns()).context("Plateau trop large")?;
        let rows = u32::try_from(board.height()).context("Plateau trop haut")?;
        let (width, height) = self.target_dimensions(columns, rows);
        let (tw, th) = self.tiles.tile_size();

        let mut img = RgbaImage::new(width, height);
        for (x, y, tile) in board.tiles() {
            let px = i64::from(tw) * x as i64;
            let py = i64::from(th) * y as i64;
            imageops::replace(&mut img, self.tiles.get(tile), px, py);
        }
        Ok(img)
    }

    /// Paint into any seekable writer (file, in-memory cursor, ...).
    ///
    /// # Errors
    /// Returns an error if composing or encoding fails.
    pub fn paint_to<W: Write + Seek>(
        &self,
        board: &Board,
        out: &mut W,
        format: ImageFormat,
    ) -> Result<()> {
        self.compose(board)?
            .write_to(out, format)
            .with_context(|| format!("Encodage {format:?} impossible"))
    }
}

impl TileRenderer for TilePainter {
    fn render(&self, board: &Board, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer {}", parent.display()))?;
        }
        let format = ImageFormat::from_path(path).unwrap_or(self.default_format);
        self.compose(board)?
            .save_with_format(path, format)
            .with_context(|| format!("Impossible d'écrire {}", path.display()))
    }
}
