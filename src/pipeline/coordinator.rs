// バックグラウンドエクスポート: キャンセル、同一キーの二重実行拒否

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use tracing::{debug, info};

use crate::error::MarkupError;

/// Cooperative cancellation flag shared between a caller and a running export.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type InFlight = Arc<Mutex<HashSet<String>>>;

fn lock(set: &InFlight) -> MutexGuard<'_, HashSet<String>> {
    // 中断されたワーカーがあっても集合自体は壊れない
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes the key when the worker finishes, panics or is never started.
struct InFlightGuard {
    set: InFlight,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.key);
        debug!(key = %self.key, "export slot released");
    }
}

/// Runs exports on worker threads, at most one per document key.
#[derive(Debug, Clone, Default)]
pub struct ExportCoordinator {
    in_flight: InFlight,
}

/// A submitted export. Reports its outcome exactly once, via [`ExportHandle::wait`].
pub struct ExportHandle<T> {
    key: String,
    cancel: CancelToken,
    handle: JoinHandle<crate::error::Result<T>>,
}

impl<T> ExportHandle<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn wait(self) -> crate::error::Result<T> {
        self.handle
            .join()
            .map_err(|_| MarkupError::encode(format!("export worker for '{}' panicked", self.key)))?
    }
}

impl ExportCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        lock(&self.in_flight).contains(key)
    }

    /// Starts `work` on a new thread.
    ///
    /// Fails with [`MarkupError::Busy`] while another export with the same
    /// key is still running.
    pub fn submit<T, F>(&self, key: impl Into<String>, work: F) -> crate::error::Result<ExportHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&CancelToken) -> crate::error::Result<T> + Send + 'static,
    {
        let key = key.into();
        if !lock(&self.in_flight).insert(key.clone()) {
            return Err(MarkupError::busy(format!("export of '{key}' is already running")));
        }
        let guard = InFlightGuard {
            set: Arc::clone(&self.in_flight),
            key: key.clone(),
        };

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let handle = std::thread::Builder::new()
            .name("export-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                work(&worker_cancel)
            })?;
        info!(key = %key, "export started");
        Ok(ExportHandle {
            key,
            cancel,
            handle,
        })
    }
}
