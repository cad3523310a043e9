//! File watch on the user stylesheet

use std::ffi::OsString;
use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Calls back whenever the watched file is created, modified or removed.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by replacing the file keep triggering. Dropping the value stops
/// the watch.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    pub fn spawn<F>(path: &Path, mut on_change: F) -> notify::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let name: OsString = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| notify::Error::generic("watched path has no file name"))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }
                if event.paths.iter().any(|p| p.file_name() == Some(name.as_os_str())) {
                    on_change();
                }
            }
            Err(e) => log::warn!("user stylesheet watch error: {}", e),
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        log::debug!("watching {}", path.display());

        Ok(Self { _watcher: watcher })
    }
}
