//! The single background thread that drives all connection I/O.
//!
//! # Perpetual Mode
//!
//! The thread runs a current-thread tokio runtime parked on a work-guard
//! channel. The loop holds one guard itself and every spawned task holds
//! another, so the runtime keeps running while idle and only returns once
//! [`EventLoop::request_stop`] dropped the loop's guard **and** every task
//! has finished.
//!
//! ```text
//! command thread                      event loop thread
//! ──────────────                      ─────────────────
//! EventLoop::start ──────────────────► block_on(wait for guards)
//! spawn(task + guard) ───────────────► poll task ... task done, guard dropped
//! request_stop (drop own guard) ─────► last guard gone → block_on returns
//! join ◄───────────────────────────── thread exits
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default name of the event loop thread.
pub const DEFAULT_THREAD_NAME: &str = "ws-event-loop";

// ============================================================================
// WorkGuard
// ============================================================================

/// Keeps the event loop alive while held.
struct WorkGuard(mpsc::Sender<()>);

// ============================================================================
// EventLoop
// ============================================================================

/// Owner of the event loop thread.
///
/// Tasks are scheduled from any thread with [`spawn`](Self::spawn) and are
/// always polled on the loop thread.
pub struct EventLoop {
    /// Runtime handle used to schedule tasks from other threads.
    handle: Handle,
    /// The loop's own work guard; `None` once stop was requested.
    work: Mutex<Option<WorkGuard>>,
    /// Stop signal observed by connection tasks.
    stop_tx: watch::Sender<bool>,
    /// Loop thread, taken by `join`.
    thread: Mutex<Option<JoinHandle<()>>>,
    /// Id of the loop thread.
    thread_id: ThreadId,
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("thread_id", &self.thread_id)
            .field("stopping", &self.is_stopping())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EventLoop - Lifecycle
// ============================================================================

impl EventLoop {
    /// Starts the event loop on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the runtime or the thread cannot be created.
    pub fn start(thread_name: impl Into<String>) -> Result<Self> {
        let thread_name = thread_name.into();
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let handle = runtime.handle().clone();

        let (work_tx, mut work_rx) = mpsc::channel::<()>(1);
        let (stop_tx, _) = watch::channel(false);

        let thread = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!("Event loop running");
                // Nothing is ever sent; recv returns None once every guard is gone
                runtime.block_on(async move { while work_rx.recv().await.is_some() {} });
                debug!("Event loop terminated");
            })?;

        let thread_id = thread.thread().id();
        info!(thread = %thread_name, "Event loop started");

        Ok(Self {
            handle,
            work: Mutex::new(Some(WorkGuard(work_tx))),
            stop_tx,
            thread: Mutex::new(Some(thread)),
            thread_id,
        })
    }

    /// Signals the loop that it may exit once all tasks have finished.
    ///
    /// Does not abort in-flight I/O. Connection tasks see the signal through
    /// [`stop_signal`](Self::stop_signal). Calling it again is a no-op.
    pub fn request_stop(&self) {
        if self.work.lock().take().is_some() {
            self.stop_tx.send_replace(true);
            info!("Event loop stop requested");
        }
    }

    /// Blocks until the loop thread has exited.
    ///
    /// Returns immediately if the thread was already joined.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventLoopPanicked`] if the loop thread panicked.
    pub fn join(&self) -> Result<()> {
        let thread = self.thread.lock().take();

        if let Some(thread) = thread {
            thread.join().map_err(|_| Error::EventLoopPanicked)?;
            info!("Event loop joined");
        }

        Ok(())
    }
}

// ============================================================================
// EventLoop - Public API
// ============================================================================

impl EventLoop {
    /// Schedules a task on the loop thread.
    ///
    /// The task keeps the loop alive until it completes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventLoopStopped`] after [`request_stop`](Self::request_stop).
    pub fn spawn<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = {
            let work = self.work.lock();
            let own = work.as_ref().ok_or(Error::EventLoopStopped)?;
            WorkGuard(own.0.clone())
        };

        self.handle.spawn(async move {
            task.await;
            drop(guard);
        });

        Ok(())
    }

    /// Returns a receiver that flips to `true` when stop is requested.
    #[inline]
    #[must_use]
    pub fn stop_signal(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Returns `true` once stop was requested.
    #[inline]
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Returns the id of the loop thread.
    #[inline]
    #[must_use]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        if self.thread.lock().is_none() {
            return;
        }

        self.request_stop();
        if let Err(e) = self.join() {
            warn!(error = %e, "Event loop did not exit cleanly");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
