use pipeline_core::agenda::ReadMarks;
use pipeline_core::invalidation::InvalidationHub;
use pipeline_core::paths;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::task::AbortHandle;

const WATCH_INTERVAL: Duration = Duration::from_millis(800);

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub hub: InvalidationHub,
    /// Bell read marks for the single user this server hosts.
    pub read_marks: Arc<Mutex<ReadMarks>>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            hub: InvalidationHub::new(),
            read_marks: Arc::new(Mutex::new(ReadMarks::new())),
        }
    }

    /// Tell every open board the record set changed.
    pub fn invalidate(&self) {
        let reached = self.hub.signal();
        tracing::debug!(reached, "invalidation broadcast");
    }

    /// Poll the store's mtime so writes made outside this server (a CLI
    /// `move` against the file store) reach every subscriber too.
    ///
    /// The poller runs until the returned handle is aborted.
    pub fn spawn_store_watcher(&self) -> AbortHandle {
        self.watch_store_every(WATCH_INTERVAL)
    }

    fn watch_store_every(&self, interval: Duration) -> AbortHandle {
        let store_file = paths::store_path(&self.root);
        let hub = self.hub.clone();
        let task = tokio::spawn(async move {
            let mut last_mtime = modified(&store_file).await;
            loop {
                tokio::time::sleep(interval).await;
                let mtime = modified(&store_file).await;
                if mtime.is_some() && mtime != last_mtime {
                    last_mtime = mtime;
                    let reached = hub.signal();
                    tracing::debug!(reached, "store changed on disk");
                }
            }
        });
        task.abort_handle()
    }
}

async fn modified(path: &std::path::Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}
