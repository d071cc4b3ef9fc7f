//! In-flight network calls.
//!
//! Each call runs as a tokio task wrapped in [`Abortable`]; its outcome comes
//! back over a oneshot channel that [`crate::App::tick`] polls without
//! blocking. Aborting drops the sender, so an aborted call can never deliver
//! a late result.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use inksolve_types::{FlowError, SolutionView};

/// Which call is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Recognition,
    Solution,
}

impl CallKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CallKind::Recognition => "Recognizing",
            CallKind::Solution => "Solving",
        }
    }
}

#[derive(Debug)]
pub(crate) enum CallOutcome {
    Recognized(Result<String, FlowError>),
    Solved(Result<SolutionView, FlowError>),
}

pub(crate) enum CallPoll {
    Pending,
    Finished(CallOutcome),
    /// The task ended without reporting (panic or abort).
    Lost,
}

#[derive(Debug)]
pub(crate) struct PendingCall {
    kind: CallKind,
    abort_handle: AbortHandle,
    receiver: oneshot::Receiver<CallOutcome>,
    started_at: Instant,
}

impl PendingCall {
    pub(crate) fn spawn<F>(kind: CallKind, future: F) -> Self
    where
        F: Future<Output = CallOutcome> + Send + 'static,
    {
        let (tx, receiver) = oneshot::channel();
        let (abort_handle, abort_registration) = AbortHandle::new_pair();

        let task = async move {
            let outcome = future.await;
            // Receiver gone means the app stopped caring.
            let _ = tx.send(outcome);
        };
        tokio::spawn(Abortable::new(task, abort_registration));

        Self {
            kind,
            abort_handle,
            receiver,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn kind(&self) -> CallKind {
        self.kind
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn poll(&mut self) -> CallPoll {
        match self.receiver.try_recv() {
            Ok(outcome) => CallPoll::Finished(outcome),
            Err(TryRecvError::Empty) => CallPoll::Pending,
            Err(TryRecvError::Closed) => CallPoll::Lost,
        }
    }

    pub(crate) fn abort(self) {
        tracing::debug!(kind = ?self.kind, "Aborting pending call");
        self.abort_handle.abort();
    }
}
