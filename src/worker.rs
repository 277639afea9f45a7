use futures_util::StreamExt;
use reqwest::Response;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::dispatch::HttpDispatch;
use crate::error::ParleyError;
use crate::event::GenerationEvent;
use crate::parsers::{Answer, JsonObjectStream, parse_document};
use crate::request::{self, GenerationRequest};

/// Lifecycle of one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Dispatched,
    Streaming,
    Awaiting,
    Terminal,
}

/// Runs exactly one generation call on its own task.
///
/// Owns the transport response and the parse state for the whole call. Talks
/// to the controller only through the event sender and the cancellation token.
pub struct GenerationWorker {
    dispatch: HttpDispatch,
    request: GenerationRequest,
    events: UnboundedSender<GenerationEvent>,
    cancel: CancellationToken,
    /// Set right before the terminal event is sent.
    finished: CancellationToken,
    max_attachment_bytes: u64,
    state: WorkerState,
}

impl GenerationWorker {
    pub fn new(
        dispatch: HttpDispatch,
        request: GenerationRequest,
        events: UnboundedSender<GenerationEvent>,
        cancel: CancellationToken,
        finished: CancellationToken,
        max_attachment_bytes: u64,
    ) -> Self {
        Self {
            dispatch,
            request,
            events,
            cancel,
            finished,
            max_attachment_bytes,
            state: WorkerState::Idle,
        }
    }

    /// Start the call on a new task. Every record it logs is inside `span`.
    pub fn spawn(self, span: Span) -> JoinHandle<()> {
        tokio::spawn(self.run().instrument(span))
    }

    /// Drive the call to its single terminal event.
    pub async fn run(mut self) {
        let cancel = self.cancel.clone();

        // Dropping the drive future on cancel closes the connection mid-flight
        // and discards parse state; nothing else is emitted afterwards.
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ParleyError::Cancelled),
            result = self.drive() => result,
        };

        let terminal = match outcome {
            Ok(()) => {
                tracing::info!("generation finished");
                GenerationEvent::Done
            }
            Err(ParleyError::Cancelled) => {
                tracing::info!(state = ?self.state, "generation cancelled");
                GenerationEvent::Cancelled
            }
            Err(e) => {
                tracing::warn!(state = ?self.state, "generation failed: {e}");
                GenerationEvent::Failed {
                    kind: e.kind(),
                    detail: e.detail(),
                }
            }
        };

        self.transition(WorkerState::Terminal);
        // The handle must already see the call as over when the receiver gets
        // the terminal event.
        self.finished.cancel();
        if self.events.send(terminal).is_err() {
            tracing::debug!("event receiver dropped before terminal event");
        }
    }

    async fn drive(&mut self) -> Result<(), ParleyError> {
        self.transition(WorkerState::Dispatched);
        let payload = request::build(&self.request, self.max_attachment_bytes).await?;
        let response = self.dispatch.send(&self.request, &payload).await?;

        if self.request.streaming {
            self.transition(WorkerState::Streaming);
            self.read_stream(response).await
        } else {
            self.transition(WorkerState::Awaiting);
            self.read_document(response).await
        }
    }

    async fn read_stream(&mut self, response: Response) -> Result<(), ParleyError> {
        let mut parser = JsonObjectStream::new();
        let mut answer = Answer::default();
        let mut objects = 0usize;
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| ParleyError::NetworkUnavailable(format!("stream interrupted: {e}")))?;
            tracing::trace!(bytes = chunk.len(), "stream chunk");

            for object in parser.feed(&chunk) {
                objects += 1;
                if answer.absorb(object)? && !answer.is_empty() {
                    self.emit(answer.to_event())?;
                }
            }
        }

        if parser.has_pending() {
            tracing::warn!("stream ended inside an unterminated object");
        }
        if objects == 0 {
            return Err(ParleyError::MalformedResponse(
                "stream ended without a complete response object".to_string(),
            ));
        }
        tracing::debug!(objects, "stream complete");
        Ok(())
    }

    async fn read_document(&mut self, response: Response) -> Result<(), ParleyError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| ParleyError::NetworkUnavailable(format!("failed to read response body: {e}")))?;
        let answer = parse_document(&body)?;
        self.emit(answer.to_event())
    }

    /// A closed receiver means nobody is listening: stop as if cancelled.
    fn emit(&self, event: GenerationEvent) -> Result<(), ParleyError> {
        self.events.send(event).map_err(|_| ParleyError::Cancelled)
    }

    fn transition(&mut self, next: WorkerState) {
        tracing::debug!(from = ?self.state, to = ?next, "worker state");
        self.state = next;
    }
}
