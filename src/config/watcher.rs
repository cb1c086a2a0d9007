//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::MonitorConfig;

/// Watches the config file and forwards every config that validates.
///
/// Dropping the returned [`RecommendedWatcher`] stops the watch.
pub fn watch_config(
    path: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<MonitorConfig>), notify::Error> {
    let (tx, rx) = mpsc::unbounded_channel();
    let target: PathBuf = path.to_path_buf();
    let reload_path = target.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                match load_config(&reload_path) {
                    Ok(config) => {
                        tracing::info!(
                            path = %reload_path.display(),
                            endpoints = config.endpoints.len(),
                            "Config reloaded"
                        );
                        let _ = tx.send(config);
                    }
                    Err(e) => {
                        tracing::error!(
                            path = %reload_path.display(),
                            error = %e,
                            "Config reload rejected, keeping current configuration"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Config watch error"),
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;

    watcher.watch(&target, RecursiveMode::NonRecursive)?;
    tracing::info!(path = %target.display(), "Config watcher started");

    Ok((watcher, rx))
}
