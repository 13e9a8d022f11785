use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::board::WidthPolicy;

/// Configuration complète d'un job d'animation.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine ;
/// la CLI surcharge ensuite champ par champ.
///
/// # Example
/// ```
/// use lv_core::config::AnimConfig;
/// let config = AnimConfig::default();
/// assert!((config.fps - 5.0).abs() < f64::EPSILON);
/// assert_eq!(config.max_frames(), None);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AnimConfig {
    // === Animation ===
    /// Frames par seconde de l'animation finale.
    pub fps: f64,
    /// Boucler indéfiniment au lieu de jouer une fois.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Plafond de fichiers frame écrits. 0 = illimité.
    pub max_frames: u64,
    /// Supprimer les marqueurs de progression.
    pub silent: bool,
    /// Backend d'assemblage.
    pub animator: AnimatorKind,
    /// Largeur de plateau apprise une fois pour tout le log, ou par plateau.
    pub width_policy: WidthPolicy,

    // === Tuiles ===
    /// Tile set. `None` = auto (`tiles/` next to the executable, else built-in).
    pub tiles: Option<TileSource>,
    /// Side of a built-in tile, in pixels [1, 256].
    pub builtin_tile_size: u32,
    /// Extension (and so raster format) of the frame files.
    pub frame_format: String,

    // === Sortie ===
    /// Dossier où conserver les frames après l'animation.
    pub save_frames: Option<PathBuf>,
}

/// Animated image backend.
///
/// # Example
/// ```
/// use lv_core::config::AnimatorKind;
/// assert_eq!(AnimatorKind::default(), AnimatorKind::Gif);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum AnimatorKind {
    /// Native GIF encoder.
    #[default]
    Gif,
    /// ImageMagick `convert` subprocess.
    Magick,
}

/// Where tile images come from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum TileSource {
    /// Flat-colour tiles generated in memory.
    Builtin,
    /// One image per tile, `<name>.png`, in this directory.
    Dir(PathBuf),
}

impl TileSource {
    /// `"builtin"` selects the generated set, anything else is a directory.
    ///
    /// # Example
    /// ```
    /// use lv_core::config::TileSource;
    /// assert_eq!(TileSource::parse("builtin"), TileSource::Builtin);
    /// assert!(matches!(TileSource::parse("assets/tiles"), TileSource::Dir(_)));
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "builtin" {
            Self::Builtin
        } else {
            Self::Dir(PathBuf::from(value))
        }
    }
}

impl Default for AnimConfig {
    fn default() -> Self {
        Self {
            fps: 5.0,
            looping: false,
            max_frames: 0,
            silent: false,
            animator: AnimatorKind::Gif,
            width_policy: WidthPolicy::Retain,
            tiles: None,
            builtin_tile_size: 16,
            frame_format: "png".to_string(),
            save_frames: None,
        }
    }
}

impl AnimConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization and CLI overrides.
    pub fn clamp_all(&mut self) {
        if !self.fps.is_finite() {
            self.fps = Self::default().fps;
        }
        self.fps = self.fps.clamp(0.1, 100.0);
        self.builtin_tile_size = self.builtin_tile_size.clamp(1, 256);
        if self.frame_format.is_empty() {
            self.frame_format = Self::default().frame_format;
        }
    }

    /// Frame cap, `None` when unlimited.
    #[must_use]
    pub fn max_frames(&self) -> Option<u64> {
        (self.max_frames > 0).then_some(self.max_frames)
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    animation: Option<AnimationSection>,
    tiles: Option<TilesSection>,
}

/// Animation section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct AnimationSection {
    fps: Option<f64>,
    #[serde(rename = "loop")]
    looping: Option<bool>,
    max_frames: Option<u64>,
    silent: Option<bool>,
    animator: Option<AnimatorKind>,
    width_policy: Option<WidthPolicy>,
    save_frames: Option<PathBuf>,
}

/// Tiles section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct TilesSection {
    dir: Option<String>,
    builtin_size: Option<u32>,
    frame_format: Option<String>,
}

/// Parse a TOML document and merge it over the defaults.
///
/// # Errors
/// Returns an error if the document is not valid TOML for this schema.
///
/// # Example
/// ```
/// use lv_core::config::parse_config;
/// let config = parse_config("[animation]\nfps = 10.0\nloop = true\n").unwrap();
/// assert!(config.looping);
/// assert_eq!(config.max_frames, 0);
/// ```
pub fn parse_config(content: &str) -> Result<AnimConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = AnimConfig::default();

    if let Some(a) = file.animation {
        if let Some(v) = a.fps {
            config.fps = v;
        }
        if let Some(v) = a.looping {
            config.looping = v;
        }
        if let Some(v) = a.max_frames {
            config.max_frames = v;
        }
        if let Some(v) = a.silent {
            config.silent = v;
        }
        if let Some(v) = a.animator {
            config.animator = v;
        }
        if let Some(v) = a.width_policy {
            config.width_policy = v;
        }
        if let Some(v) = a.save_frames {
            config.save_frames = Some(v);
        }
    }

    if let Some(t) = file.tiles {
        if let Some(v) = t.dir {
            config.tiles = Some(TileSource::parse(&v));
        }
        if let Some(v) = t.builtin_size {
            config.builtin_tile_size = v;
        }
        if let Some(v) = t.frame_format {
            config.frame_format = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use lv_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AnimConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.animator, AnimatorKind::Gif);
        assert_eq!(config.width_policy, WidthPolicy::Retain);
        assert_eq!(config.tiles, None);
        assert_eq!(config.frame_format, "png");
    }

    #[test]
    fn partial_override() {
        let config = parse_config(
            r#"
[animation]
max_frames = 12
animator = "Magick"
width_policy = "PerBoard"

[tiles]
dir = "builtin"
builtin_size = 8
"#,
        )
        .unwrap();
        assert_eq!(config.max_frames(), Some(12));
        assert_eq!(config.animator, AnimatorKind::Magick);
        assert_eq!(config.width_policy, WidthPolicy::PerBoard);
        assert_eq!(config.tiles, Some(TileSource::Builtin));
        assert_eq!(config.builtin_tile_size, 8);
        assert!(!config.looping);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config("[animation]\nfps = 1000.0\n[tiles]\nbuiltin_size = 0\n").unwrap();
        assert!((config.fps - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.builtin_tile_size, 1);
    }

    #[test]
    fn unknown_animator_is_rejected() {
        assert!(parse_config("[animation]\nanimator = \"ffmpeg\"\n").is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("liftviz.toml");
        std::fs::write(&path, "[animation]\nsilent = true\n").unwrap();
        assert!(load_config(&path).unwrap().silent);
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn shipped_default_config_matches_defaults() {
        let config = parse_config(include_str!("../../../config/default.toml")).unwrap();
        let defaults = AnimConfig::default();
        assert!((config.fps - defaults.fps).abs() < f64::EPSILON);
        assert_eq!(config.max_frames, defaults.max_frames);
        assert_eq!(config.animator, defaults.animator);
        assert_eq!(config.width_policy, defaults.width_policy);
        assert_eq!(config.tiles, defaults.tiles);
        assert_eq!(config.builtin_tile_size, defaults.builtin_tile_size);
    }
}
