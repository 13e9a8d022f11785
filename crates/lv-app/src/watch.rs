use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use lv_export::{AnimationJob, Input, Output};
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Rafale d'événements d'écriture regroupés en une seule régénération.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Surveille le fichier log et signale chaque modification sur un canal.
///
/// Retourne le Watcher (doit rester vivant tant que la surveillance tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_log_watcher(
    log_path: &Path,
) -> Result<(impl Watcher + use<>, flume::Receiver<()>)> {
    let (tx, rx) = flume::unbounded();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                // Receiver gone means the watch loop has ended.
                let _ = tx.send(());
            }
        }
        Err(e) => log::warn!("Erreur de surveillance : {e}"),
    })?;

    watcher.watch(log_path, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

enum Wake {
    Changed,
    Stop,
}

/// Régénère l'animation à chaque modification du log, jusqu'à Ctrl-C.
///
/// A failing run (half-written log, missing tile) is logged and the loop
/// keeps waiting for the next change.
///
/// # Errors
/// Returns an error if the watcher or the Ctrl-C handler cannot be installed.
pub fn run_watch(
    job: &AnimationJob<'_>,
    log_path: &Path,
    output: &Output,
    report_path: Option<&Path>,
) -> Result<()> {
    let (_watcher, changes) = spawn_log_watcher(log_path)?;

    let (stop_tx, stop_rx) = flume::bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })?;

    let input = Input::File(log_path.to_path_buf());
    log::info!("Surveillance de {}", log_path.display());

    loop {
        match job.run(&input, output) {
            Ok(report) => {
                if let Err(e) = crate::write_report(report_path, &report) {
                    log::error!("{e:#}");
                }
            }
            Err(e) => log::error!("Échec de la régénération : {e:#}"),
        }

        let wake = flume::Selector::new()
            .recv(&changes, |r| if r.is_ok() { Wake::Changed } else { Wake::Stop })
            .recv(&stop_rx, |_| Wake::Stop)
            .wait();
        if matches!(wake, Wake::Stop) {
            log::info!("Arrêt de la surveillance");
            return Ok(());
        }

        while changes.recv_timeout(DEBOUNCE).is_ok() {}
        log::info!("{} modifié, régénération", log_path.display());
    }
}
