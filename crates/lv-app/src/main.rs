use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::ImageFormat;
use lv_core::config::{AnimConfig, AnimatorKind, TileSource};
use lv_core::error::CoreError;
use lv_core::traits::Animator;
use lv_export::{AnimationJob, GifAnimator, Input, JobReport, MagickAnimator, Output};
use lv_render::tileset::TILE_EXT;
use lv_render::{TilePainter, TileSet};

pub mod cli;
pub mod watch;

/// Config lue quand `--config` n'est pas donné.
const DEFAULT_CONFIG: &str = "config/default.toml";

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider les arguments
    cli.validate()?;

    // 4. Charger la config, puis appliquer les overrides CLI
    let mut config = resolve_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    // 5. Collaborateurs
    let painter = build_painter(&config)?;
    let animator = build_animator(config.animator);
    let job = AnimationJob::new(&config, &painter, animator.as_ref());

    let input = Input::from_arg(cli.logfile.as_deref());
    let output = Output::from_arg(cli.target.as_deref());

    // 6. Boucle de surveillance, ou job unique
    if cli.watch
        && let Input::File(ref path) = input
    {
        return watch::run_watch(&job, path, &output, cli.report.as_deref());
    }

    let report = job.run(&input, &output)?;
    write_report(cli.report.as_deref(), &report)
}

/// Resolve config: explicit `--config` must exist, the default one is optional.
fn resolve_config(path: Option<&Path>) -> Result<AnimConfig> {
    if let Some(path) = path {
        return lv_core::config::load_config(path);
    }
    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        lv_core::config::load_config(default)
    } else {
        log::info!("Config introuvable : {DEFAULT_CONFIG}. Utilisation des défauts.");
        Ok(AnimConfig::default())
    }
}

/// `tiles/` next to the executable, if present.
fn default_tiles_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.join("tiles");
    dir.is_dir().then_some(dir)
}

fn build_painter(config: &AnimConfig) -> Result<TilePainter> {
    let format = ImageFormat::from_extension(&config.frame_format).ok_or_else(|| {
        CoreError::Config(format!("format de frame inconnu : {}", config.frame_format))
    })?;

    let source = config.tiles.clone().or_else(|| default_tiles_dir().map(TileSource::Dir));
    let tiles = match source {
        Some(TileSource::Dir(dir)) => TileSet::load(&dir, TILE_EXT)?,
        Some(TileSource::Builtin) | None => {
            log::info!("Tuiles intégrées ({} px)", config.builtin_tile_size);
            TileSet::builtin(config.builtin_tile_size)
        }
    };
    Ok(TilePainter::with_format(tiles, format))
}

fn build_animator(kind: AnimatorKind) -> Box<dyn Animator> {
    match kind {
        AnimatorKind::Gif => Box::new(GifAnimator::default()),
        AnimatorKind::Magick => Box::new(MagickAnimator::default()),
    }
}

/// Write the JSON report when `--report` is given.
pub(crate) fn write_report(path: Option<&Path>, report: &JobReport) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire le bilan {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_config(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn unknown_frame_format_is_rejected() {
        let config = AnimConfig {
            frame_format: "xyz".into(),
            tiles: Some(TileSource::Builtin),
            ..AnimConfig::default()
        };
        let err = build_painter(&config).err().unwrap();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::Config(_))));
    }

    #[test]
    fn report_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = JobReport {
            frames: 7,
            boards: 1,
            ..JobReport::default()
        };
        write_report(Some(&path), &report).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["frames"], 7);
        assert_eq!(value["animated"], false);
    }
}
