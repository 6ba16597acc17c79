use notify_debouncer_full::{
    new_debouncer, notify::RecursiveMode, DebounceEventResult, Debouncer, RecommendedCache,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Failed to send watcher command")]
    CommandFailed,
    #[error("Failed to watch {}: {message}", .path.display())]
    WatchFailed { path: PathBuf, message: String },
}

type WatcherResult<T> = Result<T, WatcherError>;

/// Watch counts per file, shared between the command loop and the debouncer
type WatchedFiles = Arc<Mutex<HashMap<PathBuf, usize>>>;

/// Reports changes of open documents' files.
///
/// Changed paths arrive on the receiver returned by [`FileWatcher::spawn`].
pub struct FileWatcher {
    command_tx: Sender<FileWatcherCommand>,
    /// Paths successfully watched through [`FileWatcher::sync`]
    synced: tokio::sync::Mutex<HashSet<PathBuf>>,
}

enum FileWatcherCommand {
    Watch(PathBuf, oneshot::Sender<WatcherResult<()>>),
    Unwatch(PathBuf),
}

impl FileWatcher {
    pub fn spawn(debounce: Duration) -> (Self, Receiver<PathBuf>) {
        let (command_tx, mut command_rx) = mpsc::channel::<FileWatcherCommand>(100);
        let (changed_tx, changed_rx) = mpsc::channel::<PathBuf>(100);

        // Spawn a dedicated thread for the file watcher
        std::thread::spawn(move || {
            let watched: WatchedFiles = Arc::new(Mutex::new(HashMap::new()));
            let watched_clone = watched.clone();

            let mut debouncer: Debouncer<
                notify_debouncer_full::notify::RecommendedWatcher,
                RecommendedCache,
            > = match new_debouncer(debounce, None, move |result: DebounceEventResult| {
                match result {
                    Ok(events) => {
                        let paths = events.iter().flat_map(|event| event.paths.iter());
                        for path in changed_watched_paths(paths, &watched_clone.lock()) {
                            tracing::debug!(?path, "File changed");
                            if changed_tx.blocking_send(path).is_err() {
                                tracing::debug!("File change receiver dropped");
                                return;
                            }
                        }
                    }
                    Err(errors) => {
                        for error in errors {
                            tracing::error!(?error, "File watcher error");
                        }
                    }
                }
            }) {
                Ok(d) => d,
                Err(e) => {
                    tracing::error!(?e, "Failed to create file watcher");
                    return;
                }
            };

            tracing::info!(?debounce, "File watcher started");

            // Process commands
            while let Some(command) = command_rx.blocking_recv() {
                match command {
                    FileWatcherCommand::Watch(path, reply) => {
                        let mut watched = watched.lock();
                        let count = watched.entry(path.clone()).or_insert(0);
                        *count += 1;

                        // Only start watching for the first request on this file
                        let result = if *count == 1 {
                            match debouncer.watch(&path, RecursiveMode::NonRecursive) {
                                Ok(()) => {
                                    tracing::info!(?path, "Started watching file");
                                    Ok(())
                                }
                                Err(e) => {
                                    tracing::error!(?path, ?e, "Failed to watch file");
                                    watched.remove(&path);
                                    Err(WatcherError::WatchFailed {
                                        path,
                                        message: e.to_string(),
                                    })
                                }
                            }
                        } else {
                            Ok(())
                        };
                        let _ = reply.send(result);
                    }
                    FileWatcherCommand::Unwatch(path) => {
                        let mut watched = watched.lock();
                        let Some(count) = watched.get_mut(&path) else {
                            continue;
                        };
                        *count -= 1;
                        if *count == 0 {
                            watched.remove(&path);
                            if let Err(e) = debouncer.unwatch(&path) {
                                tracing::error!(?path, ?e, "Failed to unwatch file");
                            } else {
                                tracing::info!(?path, "Stopped watching file");
                            }
                        }
                    }
                }
            }
            tracing::info!("File watcher command channel closed");
        });

        (Self::with_commands(command_tx), changed_rx)
    }

    fn with_commands(command_tx: Sender<FileWatcherCommand>) -> Self {
        Self {
            command_tx,
            synced: tokio::sync::Mutex::new(HashSet::new()),
        }
    }

    /// Watch a file, waiting until the watch is in place
    pub async fn watch(&self, path: impl Into<PathBuf>) -> WatcherResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(FileWatcherCommand::Watch(path.into(), reply_tx))
            .await
            .map_err(|_| WatcherError::CommandFailed)?;
        reply_rx.await.map_err(|_| WatcherError::CommandFailed)?
    }

    /// Stop watching a file
    pub async fn unwatch(&self, path: impl Into<PathBuf>) -> WatcherResult<()> {
        self.command_tx
            .send(FileWatcherCommand::Unwatch(path.into()))
            .await
            .map_err(|_| WatcherError::CommandFailed)
    }

    /// Watch exactly `paths`, starting and stopping watches as needed.
    ///
    /// Paths whose watch failed are retried by the next call; the first
    /// failure is returned after every path has been tried.
    pub async fn sync(&self, paths: &[PathBuf]) -> WatcherResult<()> {
        // Held across the commands so concurrent syncs apply one at a time
        let mut synced = self.synced.lock().await;
        let (added, removed) = diff_paths(&synced, paths);

        let mut first_error = None;
        for path in added {
            match self.watch(path.clone()).await {
                Ok(()) => {
                    synced.insert(path);
                }
                Err(e) => {
                    tracing::warn!(%e, "Watch will be retried on the next sync");
                    first_error.get_or_insert(e);
                }
            }
        }
        for path in removed {
            self.unwatch(path.clone()).await?;
            synced.remove(&path);
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Paths to start and stop watching to go from `current` to `desired`
fn diff_paths(current: &HashSet<PathBuf>, desired: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let desired: HashSet<&PathBuf> = desired.iter().collect();
    let mut added: Vec<PathBuf> = desired
        .iter()
        .filter(|path| !current.contains(**path))
        .map(|path| (*path).clone())
        .collect();
    let mut removed: Vec<PathBuf> = current
        .iter()
        .filter(|path| !desired.contains(path))
        .cloned()
        .collect();
    added.sort();
    removed.sort();
    (added, removed)
}

/// Unique watched paths among `changed`, in first-seen order
fn changed_watched_paths<'a>(
    changed: impl IntoIterator<Item = &'a PathBuf>,
    watched: &HashMap<PathBuf, usize>,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    changed
        .into_iter()
        .filter(|path| watched.contains_key(*path) && seen.insert(*path))
        .cloned()
        .collect()
}
