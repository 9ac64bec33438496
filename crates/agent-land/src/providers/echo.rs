use std::collections::VecDeque;
use std::future::ready;
use std::pin::Pin;
use std::task::{Context, Poll};

use agent_land_model::{
    ModelFinishReason, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent,
};

use super::ProviderError;

/// An offline provider that repeats the last user message.
///
/// Handy for trying the playground without an API key: set
/// `DEFAULT_MODEL=echo:local`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoProvider;

impl EchoProvider {
    /// Creates the provider.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl ModelProvider for EchoProvider {
    type Error = ProviderError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let reply = format!("You said: {}", req.last_user_text().unwrap_or(""));
        let mut events: VecDeque<_> = reply
            .split_inclusive(' ')
            .map(|word| ModelResponseEvent::MessageDelta(word.to_owned()))
            .collect();
        events.push_back(ModelResponseEvent::Completed(ModelFinishReason::Stop));
        ready(Ok(EchoResponse { events }))
    }
}

/// The response of [`EchoProvider`], one word per delta.
#[derive(Debug)]
pub struct EchoResponse {
    events: VecDeque<ModelResponseEvent>,
}

impl ModelResponse for EchoResponse {
    type Error = ProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().events.pop_front()))
    }
}
