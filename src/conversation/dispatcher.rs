//! Background routing for a front-end
//!
//! The dispatcher owns one session and runs each routing call on a tokio task
//! so the caller stays responsive. At most one call is in flight. A new
//! submission is rejected with [`AppError::Busy`] unless it supersedes the
//! pending one, in which case the old call is aborted and its result dropped.

use crate::agents::{RouteOutcome, Router};
use crate::conversation::Session;
use crate::types::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::AbortHandle;

#[derive(Debug, Default)]
struct InFlight {
    generation: u64,
    handle: Option<AbortHandle>,
}

impl InFlight {
    fn is_busy(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn abort(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

/// Receiver side of a submitted message
#[derive(Debug)]
pub struct PendingReply {
    rx: oneshot::Receiver<Result<RouteOutcome>>,
}

impl PendingReply {
    /// Wait for the outcome. A cancelled or superseded call yields `Cancelled`.
    pub async fn wait(self) -> Result<RouteOutcome> {
        self.rx.await.unwrap_or(Err(AppError::Cancelled))
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    session: Arc<AsyncMutex<Session>>,
    state: Arc<Mutex<InFlight>>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, session: Session) -> Self {
        Self {
            router,
            session: Arc::new(AsyncMutex::new(session)),
            state: Arc::new(Mutex::new(InFlight::default())),
        }
    }

    /// Shared handle to the session, e.g. for rendering or selecting a tab
    pub fn session(&self) -> &Arc<AsyncMutex<Session>> {
        &self.session
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().is_busy()
    }

    /// Start routing `text`. Blank input returns `None` without a call.
    pub async fn submit(&self, text: &str) -> Result<Option<PendingReply>> {
        if self.is_busy() {
            return Err(AppError::Busy);
        }
        self.start(text, false).await
    }

    /// Like [`submit`](Self::submit), abandoning any call still in flight
    pub async fn supersede(&self, text: &str) -> Result<Option<PendingReply>> {
        self.start(text, true).await
    }

    /// Abandon the pending call. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        state.generation += 1;
        let cancelled = state.abort();
        if cancelled {
            tracing::info!(generation = state.generation, "Pending reply cancelled");
        }
        cancelled
    }

    async fn start(&self, text: &str, supersede: bool) -> Result<Option<PendingReply>> {
        let Some(exchange) = self.session.lock().await.prepare(text) else {
            return Ok(None);
        };

        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        if state.is_busy() {
            if !supersede {
                return Err(AppError::Busy);
            }
            state.abort();
            tracing::info!(generation = state.generation, "Pending reply superseded");
        }
        state.generation += 1;
        let generation = state.generation;

        let router = Arc::clone(&self.router);
        let session = Arc::clone(&self.session);
        let shared = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            let result = router.resolve(&exchange).await;

            let mut session = session.lock().await;
            // Cancel must not interleave between the check and the commit.
            let mut state = shared.lock();
            if state.generation != generation {
                tracing::debug!(generation, "Discarding stale reply");
                let _ = tx.send(Err(AppError::Cancelled));
                return;
            }
            let outcome = session.commit(exchange, result);
            state.handle = None;
            let _ = tx.send(outcome);
        });
        state.handle = Some(task.abort_handle());

        Ok(Some(PendingReply { rx }))
    }
}
