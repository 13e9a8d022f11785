/// Tile sets and board painting for liftviz.

pub mod painter;
pub mod tileset;

pub use painter::TilePainter;
pub use tileset::TileSet;
