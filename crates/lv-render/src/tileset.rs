use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use lv_core::board::Tile;
use lv_core::error::CoreError;

/// Extension par défaut des fichiers de tuiles.
pub const TILE_EXT: &str = "png";

/// Built-in palette: (background, foreground, margin divisor). 0 = background only.
const BUILTIN: [([u8; 3], [u8; 3], u32); 8] = [
    ([16, 16, 20], [16, 16, 20], 0),    // empty
    ([120, 82, 46], [139, 94, 52], 1),  // earth
    ([72, 72, 80], [112, 112, 122], 1), // wall
    ([16, 16, 20], [168, 168, 156], 4), // rock
    ([16, 16, 20], [250, 210, 60], 3),  // lambda
    ([72, 72, 80], [160, 40, 40], 3),   // lift
    ([72, 72, 80], [60, 200, 90], 3),   // openlift
    ([16, 16, 20], [70, 140, 230], 4),  // robot
];

/// Une image par symbole, toutes de la même taille.
///
/// # Example
/// ```
/// use lv_render::tileset::TileSet;
/// use lv_core::board::Tile;
/// let tiles = TileSet::builtin(8);
/// assert_eq!(tiles.tile_size(), (8, 8));
/// assert_eq!(tiles.get(Tile::Robot).dimensions(), (8, 8));
/// ```
#[derive(Clone, Debug)]
pub struct TileSet {
    /// Indexed by `Tile::index()`.
    tiles: Vec<RgbaImage>,
    tile_width: u32,
    tile_height: u32,
}

impl TileSet {
    /// Load `<dir>/<tile-name>.<ext>` for the 8 tiles.
    ///
    /// The `wall` tile sets the reference size; every other tile must match it.
    ///
    /// # Errors
    /// Returns an error if a tile file is missing, cannot be decoded, or has
    /// a different size.
    ///
    /// # Example
    /// ```no_run
    /// use lv_render::tileset::TileSet;
    /// use std::path::Path;
    /// let tiles = TileSet::load(Path::new("tiles"), "png").unwrap();
    /// ```
    pub fn load(dir: &Path, ext: &str) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CoreError::FileNotFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        let mut tiles = Vec::with_capacity(Tile::ALL.len());
        for tile in Tile::ALL {
            let path = dir.join(format!("{}.{ext}", tile.name()));
            if !path.is_file() {
                return Err(CoreError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            let img = image::open(&path)
                .with_context(|| format!("Impossible de charger la tuile {}", path.display()))?;
            tiles.push(img.to_rgba8());
        }

        let (tile_width, tile_height) = tiles[Tile::Wall.index()].dimensions();
        for tile in Tile::ALL {
            let (width, height) = tiles[tile.index()].dimensions();
            if (width, height) != (tile_width, tile_height) {
                return Err(CoreError::TileSizeMismatch {
                    name: tile.name(),
                    width,
                    height,
                    expected_width: tile_width,
                    expected_height: tile_height,
                }
                .into());
            }
        }

        log::info!(
            "Tuiles chargées depuis {} ({tile_width}×{tile_height})",
            dir.display()
        );
        Ok(Self {
            tiles,
            tile_width,
            tile_height,
        })
    }

    /// Flat-colour tiles of `size`×`size` pixels, generated in memory.
    #[must_use]
    pub fn builtin(size: u32) -> Self {
        let size = size.max(1);
        let tiles = BUILTIN
            .iter()
            .map(|&(bg, fg, divisor)| {
                let margin = if divisor == 0 { size } else { size / divisor.max(2) / 2 };
                RgbaImage::from_fn(size, size, |x, y| {
                    let inside = x >= margin
                        && y >= margin
                        && x < size.saturating_sub(margin)
                        && y < size.saturating_sub(margin);
                    let [r, g, b] = if inside { fg } else { bg };
                    Rgba([r, g, b, 255])
                })
            })
            .collect();
        Self {
            tiles,
            tile_width: size,
            tile_height: size,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, tile: Tile) -> &RgbaImage {
        &self.tiles[tile.index()]
    }

    /// (width, height) of every tile.
    #[must_use]
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tiles(dir: &Path, size: u32) {
        for (i, tile) in Tile::ALL.iter().enumerate() {
            let img = RgbaImage::from_pixel(size, size, Rgba([i as u8 * 30, 0, 0, 255]));
            img.save(dir.join(format!("{}.png", tile.name()))).unwrap();
        }
    }

    #[test]
    fn load_reads_all_tiles() {
        let dir = tempfile::tempdir().unwrap();
        write_tiles(dir.path(), 4);
        let tiles = TileSet::load(dir.path(), TILE_EXT).unwrap();
        assert_eq!(tiles.tile_size(), (4, 4));
        assert_eq!(tiles.get(Tile::Rock).get_pixel(0, 0), &Rgba([90, 0, 0, 255]));
    }

    #[test]
    fn missing_tile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_tiles(dir.path(), 4);
        std::fs::remove_file(dir.path().join("openlift.png")).unwrap();
        let err = TileSet::load(dir.path(), TILE_EXT).unwrap_err();
        assert!(err.to_string().contains("openlift.png"));
    }

    #[test]
    fn mismatched_tile_size_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_tiles(dir.path(), 4);
        RgbaImage::new(5, 4).save(dir.path().join("robot.png")).unwrap();
        let err = TileSet::load(dir.path(), TILE_EXT).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::TileSizeMismatch { name: "robot", .. })
        ));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TileSet::load(&dir.path().join("nope"), TILE_EXT).is_err());
    }

    #[test]
    fn builtin_tiles_are_distinct() {
        let tiles = TileSet::builtin(16);
        let centre = |t: Tile| *tiles.get(t).get_pixel(8, 8);
        assert_ne!(centre(Tile::Wall), centre(Tile::Robot));
        assert_ne!(centre(Tile::Lift), centre(Tile::OpenLift));
        assert_eq!(centre(Tile::Empty), Rgba([16, 16, 20, 255]));
    }
}
