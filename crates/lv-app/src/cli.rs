use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lv_core::board::WidthPolicy;
use lv_core::config::{AnimConfig, AnimatorKind, TileSource};

/// liftviz — Log Animator : transforme un log de plateaux en GIF animé.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log source. Défaut : stdin (`-`).
    pub logfile: Option<PathBuf>,

    /// GIF cible. Défaut : stdout (`-`).
    pub target: Option<PathBuf>,

    /// Frames par seconde de l'animation.
    #[arg(short, long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Boucler l'animation.
    #[arg(short = 'l', long = "loop", default_value_t = false)]
    pub looping: bool,

    /// Arrêter d'écrire des frames après N (0 = illimité).
    #[arg(short = 'n', long, value_name = "LIMIT")]
    pub max_frames: Option<u64>,

    /// Dossier où conserver les images des frames.
    #[arg(short = 'p', long, value_name = "DIR")]
    pub save_frames: Option<PathBuf>,

    /// Pas de marqueurs de progression.
    #[arg(short, long, default_value_t = false)]
    pub silent: bool,

    /// Dossier des tuiles, ou "builtin".
    #[arg(short, long, value_name = "TILES")]
    pub tiles: Option<String>,

    /// Backend d'assemblage.
    #[arg(long, value_enum)]
    pub animator: Option<AnimatorArg>,

    /// Largeur apprise une fois pour tout le log, ou par plateau.
    #[arg(long, value_enum)]
    pub width_policy: Option<WidthPolicyArg>,

    /// Fichier de configuration TOML. Défaut : config/default.toml s'il existe.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Régénérer l'animation à chaque modification du log.
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// Écrire un bilan JSON du job dans ce fichier.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AnimatorArg {
    Gif,
    Magick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WidthPolicyArg {
    Retain,
    PerBoard,
}

impl Cli {
    /// Watch mode needs a file on both ends.
    ///
    /// # Errors
    /// Returns an error if `--watch` is combined with stdin or stdout.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.watch {
            let is_std = |p: Option<&std::path::Path>| p.is_none_or(|p| p.as_os_str() == "-");
            if is_std(self.logfile.as_deref()) {
                anyhow::bail!("--watch requiert un fichier log (pas stdin).");
            }
            if is_std(self.target.as_deref()) {
                anyhow::bail!("--watch requiert un fichier cible (pas stdout).");
            }
        }
        Ok(())
    }

    /// Flags given on the command line win over the config file.
    pub fn apply_overrides(&self, config: &mut AnimConfig) {
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if self.looping {
            config.looping = true;
        }
        if let Some(n) = self.max_frames {
            config.max_frames = n;
        }
        if let Some(ref dir) = self.save_frames {
            config.save_frames = Some(dir.clone());
        }
        if self.silent {
            config.silent = true;
        }
        if let Some(ref tiles) = self.tiles {
            config.tiles = Some(TileSource::parse(tiles));
        }
        if let Some(animator) = self.animator {
            config.animator = match animator {
                AnimatorArg::Gif => AnimatorKind::Gif,
                AnimatorArg::Magick => AnimatorKind::Magick,
            };
        }
        if let Some(policy) = self.width_policy {
            config.width_policy = match policy {
                WidthPolicyArg::Retain => WidthPolicy::Retain,
                WidthPolicyArg::PerBoard => WidthPolicy::PerBoard,
            };
        }
        config.clamp_all();
    }
}
