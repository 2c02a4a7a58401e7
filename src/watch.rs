//! Change notification for the file-backed store.
//!
//! A background thread watches `.taskdesk/` with `notify`, folds bursts of
//! file events into one [`ChangeToken`] per quiet period and pushes it to the
//! subscriber.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{Error, Result};
use crate::provider::{ChangeNotifier, ChangeTable, ChangeToken, Subscription};
use crate::storage::{Storage, PROFILES_FILE, TASKS_LOG, TASKS_SNAPSHOT};

/// How often an idle watcher thread checks whether it was cancelled.
const CANCEL_POLL_MS: u64 = 200;

/// [`ChangeNotifier`] over a `.taskdesk/` directory.
#[derive(Debug, Clone)]
pub struct FileWatcher {
    data_dir: PathBuf,
    debounce: Duration,
}

impl FileWatcher {
    pub fn new(storage: &Storage, debounce_ms: u64) -> Self {
        Self {
            data_dir: storage.data_dir(),
            debounce: Duration::from_millis(debounce_ms),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Tables a changed file belongs to. Lock and temp files map to nothing.
pub fn tables_for_path(path: &Path) -> Vec<ChangeTable> {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return Vec::new();
    };
    match name {
        TASKS_LOG | TASKS_SNAPSHOT => vec![ChangeTable::Tasks, ChangeTable::ChecklistItems],
        PROFILES_FILE => vec![ChangeTable::Profiles],
        _ => Vec::new(),
    }
}

impl ChangeNotifier for FileWatcher {
    fn subscribe(&self) -> Result<Subscription> {
        if !self.data_dir.exists() {
            return Err(Error::DataAccess(format!(
                "nothing to watch at {} (run `taskdesk init`)",
                self.data_dir.display()
            )));
        }

        let (event_tx, event_rx) = mpsc::channel();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
            let _ = event_tx.send(res);
        })?;
        watcher.watch(&self.data_dir, RecursiveMode::NonRecursive)?;

        let (token_tx, cancel, subscription) = Subscription::channel();
        let debounce = self.debounce;
        let data_dir = self.data_dir.clone();
        tracing::debug!(dir = %data_dir.display(), ?debounce, "watching for changes");

        thread::spawn(move || {
            // Keep the watcher alive for as long as this thread runs.
            let _watcher = watcher;
            let mut sequence = 0u64;
            let mut pending: BTreeSet<ChangeTable> = BTreeSet::new();
            let mut deadline: Option<Instant> = None;

            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let timeout = deadline
                    .map(|at| at.saturating_duration_since(Instant::now()))
                    .unwrap_or(Duration::from_millis(CANCEL_POLL_MS))
                    .min(Duration::from_millis(CANCEL_POLL_MS));

                match event_rx.recv_timeout(timeout) {
                    Ok(Ok(event)) => {
                        let tables: Vec<ChangeTable> = event
                            .paths
                            .iter()
                            .flat_map(|path| tables_for_path(path))
                            .collect();
                        if !tables.is_empty() {
                            pending.extend(tables);
                            deadline = Some(Instant::now() + debounce);
                        }
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "watch error");
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                let due = deadline.is_some_and(|at| Instant::now() >= at);
                if due && !pending.is_empty() {
                    sequence += 1;
                    let token = ChangeToken {
                        sequence,
                        tables: std::mem::take(&mut pending).into_iter().collect(),
                    };
                    deadline = None;
                    tracing::debug!(sequence, tables = ?token.tables, "change detected");
                    if token_tx.send(token).is_err() {
                        break;
                    }
                }
            }
            tracing::debug!(dir = %data_dir.display(), "watcher stopped");
        });

        Ok(subscription)
    }
}
