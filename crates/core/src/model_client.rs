use std::fmt::{self, Debug};
use std::future::poll_fn;
use std::pin::pin;
use std::sync::Arc;

use agent_land_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, ToolCallRequest,
};
use futures_util::future::BoxFuture;
use tracing::Instrument;

use crate::retry::{RetryConfig, retry_if};

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type TranscriptFn = Arc<dyn Fn(String) + Send + Sync>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, TranscriptFn) -> BoxFuture<'static, SendRequestResult>
        + Send + Sync
>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the other modules.
///
/// The client is cheap to clone, clones share the same provider.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Wraps a provider.
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_transcript| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_transcript).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the response.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_transcript: impl Fn(String) + Send + Sync + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Arc::new(on_transcript)).await
    }

    /// Like [`ModelClient::send_request`], but retries rate-limited
    /// requests with exponential backoff.
    ///
    /// Deltas of a failed attempt may already have been forwarded to
    /// `on_transcript` when the retry starts.
    pub async fn send_request_with_retry(
        &self,
        req: ModelRequest,
        retry: &RetryConfig,
        on_transcript: impl Fn(String) + Send + Sync + 'static,
    ) -> SendRequestResult {
        let on_transcript: TranscriptFn = Arc::new(on_transcript);
        retry_if(
            retry,
            |err: &Box<dyn ModelProviderError>| {
                err.kind() == ErrorKind::RateLimitExceeded
            },
            || (self.handler_fn)(req.clone(), Arc::clone(&on_transcript)),
        )
        .await
    }
}

impl Debug for ModelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClient").finish_non_exhaustive()
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelClientResponse {
    /// The concatenated message deltas.
    pub transcript: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_transcript: TranscriptFn,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err}");
            return Err(Box::new(err));
        }
    };

    let mut transcript = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                transcript.push_str(&msg);
                on_transcript(msg);
            }
            ModelResponseEvent::ToolCall(req) => {
                tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        transcript,
        tool_calls,
        finish_reason,
    })
}
