//! Page-ready notifications.
//!
//! When a page object becomes ready the lifecycle emits a fire-and-forget
//! event. [`NotificationPool`] fans it out to listeners on a small fixed pool
//! of blocking workers, so slow collaborators (screenshot capture, report
//! decoration) never hold up the test.
//!
//! - **Bounded workers**: at most `workers` listener calls run at once
//! - **Listener errors are logged**: they never reach the page lifecycle
//! - **Bounded drain**: [`NotificationPool::drain`] waits for the backlog up to
//!   a timeout, then logs and gives up

use crate::result::{PageError, PageResult};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default number of notification workers
pub const DEFAULT_WORKERS: usize = 4;

/// Default time [`NotificationPool::drain`] waits for the backlog (2 minutes)
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 120_000;

/// Receives page-ready events on a worker thread
pub trait PageReadyListener: Send + Sync {
    /// Called once per ready page
    fn on_page_ready(&self, page: &str) -> PageResult<()>;
}

impl<F> PageReadyListener for F
where
    F: Fn(&str) -> PageResult<()> + Send + Sync,
{
    fn on_page_ready(&self, page: &str) -> PageResult<()> {
        self(page)
    }
}

/// Emits page-ready events; used by the page lifecycle
pub trait PageReadyNotifier: Send + Sync + fmt::Debug {
    /// Dispatch without waiting for listeners.
    ///
    /// # Errors
    ///
    /// Only when the event cannot be dispatched at all.
    fn notify_page_ready(&self, page: &str) -> PageResult<()>;
}

/// Logs every ready page at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl PageReadyListener for LogListener {
    fn on_page_ready(&self, page: &str) -> PageResult<()> {
        info!(page, "Page '{page}' successfully loaded");
        Ok(())
    }
}

/// Notification pool configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum concurrent listener calls
    pub workers: usize,
    /// How long `drain` waits for the backlog, in milliseconds
    pub drain_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Fixed-size worker pool dispatching page-ready events to listeners.
///
/// Owns its own tokio runtime; call it from synchronous code only.
pub struct NotificationPool {
    runtime: Option<Runtime>,
    listeners: Vec<Arc<dyn PageReadyListener>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
    config: PoolConfig,
}

impl fmt::Debug for NotificationPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationPool")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending().len())
            .field("closed", &self.is_closed())
            .field("config", &self.config)
            .finish()
    }
}

impl NotificationPool {
    /// Start a pool with no listeners
    ///
    /// # Errors
    ///
    /// Fails if the worker runtime cannot be started.
    pub fn new(config: PoolConfig) -> PageResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.workers.max(1))
            .thread_name("pagebind-notify")
            .enable_time()
            .build()?;
        info!(workers = config.workers, "notification pool started");
        Ok(Self {
            runtime: Some(runtime),
            listeners: Vec::new(),
            pending: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            config,
        })
    }

    /// Add a listener
    #[must_use]
    pub fn with_listener(mut self, listener: impl PageReadyListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of dispatched listener calls not yet finished
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.pending().iter().filter(|h| !h.is_finished()).count()
    }

    /// Stop accepting events and wait for the backlog.
    ///
    /// Returns `false`, after logging, if the backlog did not finish within the
    /// configured drain timeout.
    pub fn drain(&self) -> bool {
        self.drain_within(self.config.drain_timeout())
    }

    /// [`drain`](Self::drain) with an explicit timeout
    pub fn drain_within(&self, timeout: Duration) -> bool {
        self.closed.store(true, Ordering::SeqCst);
        let handles: Vec<JoinHandle<()>> = self.pending().drain(..).collect();
        let Some(runtime) = self.runtime.as_ref() else {
            return true;
        };
        let count = handles.len();

        let finished = runtime.block_on(async {
            tokio::time::timeout(timeout, join_all(handles)).await
        });
        match finished {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        warn!(error = %e, "notification worker panicked");
                    }
                }
                info!(count, "notification backlog drained");
                true
            }
            Err(_) => {
                error!(
                    count,
                    timeout_ms = timeout.as_millis() as u64,
                    "notification backlog did not finish in time"
                );
                false
            }
        }
    }
}

impl PageReadyNotifier for NotificationPool {
    fn notify_page_ready(&self, page: &str) -> PageResult<()> {
        let runtime = match (&self.runtime, self.is_closed()) {
            (Some(runtime), false) => runtime,
            _ => {
                return Err(PageError::NotificationRejected {
                    message: format!("pool closed, dropping ready event for '{page}'"),
                })
            }
        };

        let mut pending = self.pending();
        pending.retain(|h| !h.is_finished());
        for listener in &self.listeners {
            let listener = Arc::clone(listener);
            let page = page.to_string();
            pending.push(runtime.spawn_blocking(move || {
                if let Err(e) = listener.on_page_ready(&page) {
                    warn!(page = %page, error = %e, "page ready listener failed");
                }
            }));
        }
        debug!(page, listeners = self.listeners.len(), "page ready dispatched");
        Ok(())
    }
}

impl Drop for NotificationPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(counter: &Arc<AtomicUsize>) -> impl PageReadyListener + 'static {
        let counter = Arc::clone(counter);
        move |_page: &str| -> PageResult<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_drain_completes_queued_work() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = NotificationPool::new(PoolConfig::default())
            .unwrap()
            .with_listener(counting(&counter))
            .with_listener(LogListener);

        for i in 0..10 {
            pool.notify_page_ready(&format!("page {i}")).unwrap();
        }
        assert!(pool.drain());
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(pool.backlog(), 0);
    }

    #[test]
    fn test_closed_pool_rejects_events() {
        let pool = NotificationPool::new(PoolConfig::default()).unwrap();
        assert!(pool.drain());
        assert!(pool.is_closed());
        assert!(matches!(
            pool.notify_page_ready("late"),
            Err(PageError::NotificationRejected { .. })
        ));
    }

    #[test]
    fn test_listener_errors_are_contained() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = NotificationPool::new(PoolConfig::default())
            .unwrap()
            .with_listener(|_page: &str| -> PageResult<()> {
                Err(PageError::Driver {
                    message: "screenshot service unavailable".into(),
                })
            })
            .with_listener(counting(&counter));

        pool.notify_page_ready("home").unwrap();
        assert!(pool.drain());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drain_timeout_is_reported() {
        let pool = NotificationPool::new(PoolConfig::default())
            .unwrap()
            .with_listener(|_page: &str| -> PageResult<()> {
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            });
        pool.notify_page_ready("slow").unwrap();
        assert!(!pool.drain_within(Duration::from_millis(20)));
    }

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.drain_timeout(), Duration::from_secs(120));
    }
}
