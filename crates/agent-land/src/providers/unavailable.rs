use std::future::ready;
use std::pin::Pin;
use std::task::{Context, Poll};

use agent_land_model::{
    ErrorKind, ModelProvider, ModelRequest, ModelResponse, ModelResponseEvent,
};

use super::ProviderError;

/// A provider whose requests always fail with [`ErrorKind::Unavailable`].
#[derive(Clone, Debug)]
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    /// Creates the provider with the reason reported by every request.
    #[inline]
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ModelProvider for UnavailableProvider {
    type Error = ProviderError;
    type Response = NoResponse;

    fn send_request(
        &self,
        _req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(Err(ProviderError::new(
            self.reason.clone(),
            ErrorKind::Unavailable,
        )))
    }
}

/// The response of [`UnavailableProvider`], which is never produced.
#[derive(Debug)]
pub enum NoResponse {}

impl ModelResponse for NoResponse {
    type Error = ProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        match *self.get_mut() {}
    }
}
