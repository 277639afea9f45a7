use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::attachment::MAX_ATTACHMENT_BYTES;
use crate::config::Config;
use crate::dispatch::HttpDispatch;
use crate::error::ParleyError;
use crate::event::GenerationEvent;
use crate::request::GenerationRequest;
use crate::worker::GenerationWorker;

struct ActiveCall {
    cancel: CancellationToken,
    finished: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveCall {
    /// Over once the worker has settled its terminal event, or its task exited.
    fn is_running(&self) -> bool {
        !self.finished.is_cancelled() && !self.task.is_finished()
    }
}

/// Controller-side entry point: submit a request, read its events, cancel it.
///
/// Serves one in-flight call at a time. Must be used inside a Tokio runtime.
/// Dropping the handle cancels a call that is still running.
pub struct WorkerHandle {
    dispatch: HttpDispatch,
    max_attachment_bytes: u64,
    span: Span,
    active: Option<ActiveCall>,
}

impl Default for WorkerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerHandle {
    pub fn new() -> Self {
        Self {
            dispatch: HttpDispatch::new(),
            max_attachment_bytes: MAX_ATTACHMENT_BYTES,
            span: tracing::info_span!("generation"),
            active: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            dispatch: HttpDispatch::from_settings(&config.http),
            max_attachment_bytes: config.attachments.max_bytes,
            span: tracing::info_span!("generation"),
            active: None,
        }
    }

    /// Log every call made through this handle inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Start a call on a new worker task.
    ///
    /// Fails with `Busy` while the previous call has not finished.
    pub fn submit(&mut self, request: GenerationRequest) -> Result<EventStream, ParleyError> {
        if self.is_active() {
            return Err(ParleyError::Busy);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();
        tracing::info!(parent: &self.span, request = ?request, "submitting generation");

        let worker = GenerationWorker::new(
            self.dispatch.clone(),
            request,
            tx,
            cancel.clone(),
            finished.clone(),
            self.max_attachment_bytes,
        );
        let task = worker.spawn(self.span.clone());
        self.active = Some(ActiveCall {
            cancel,
            finished,
            task,
        });

        Ok(EventStream { rx })
    }

    /// Request cancellation of the in-flight call.
    ///
    /// Idempotent. A no-op when nothing was submitted or the call already ended.
    pub fn cancel(&self) {
        if let Some(call) = &self.active
            && call.is_running()
        {
            call.cancel.cancel();
        }
    }

    /// True until the last submitted call has produced its terminal event.
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveCall::is_running)
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Ordered events of one call, ending with its terminal event.
pub struct EventStream {
    rx: UnboundedReceiver<GenerationEvent>,
}

impl EventStream {
    /// Next event, or `None` once the terminal event has been delivered.
    pub async fn recv(&mut self) -> Option<GenerationEvent> {
        self.rx.recv().await
    }

    /// Wait for every remaining event of the call, up to its terminal event.
    pub async fn collect_all(mut self) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }
}

impl Stream for EventStream {
    type Item = GenerationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
