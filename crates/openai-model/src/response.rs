use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use agent_land_model::{
    ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use futures_util::future::BoxFuture;
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCall};

struct StreamState {
    sse: Sse,
    id: Option<String>,
    // Tool calls are streamed in fragments and only emitted once the choice
    // finishes, since their arguments are incomplete before that.
    tool_calls: Vec<ToolCall>,
    queue: VecDeque<ModelResponseEvent>,
    done: bool,
}

impl StreamState {
    async fn pump(&mut self) -> Result<(), Error> {
        let sse_event = self
            .sse
            .next_event()
            .await
            .map_err(|err| Error::other(format!("{err:?}")))?;
        let Some(sse_event) = sse_event else {
            self.finish(None);
            return Ok(());
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            self.finish(None);
            return Ok(());
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| Error::other(err.to_string()))?;
        if self.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id {
            return Err(Error::other("chunk id mismatch"));
        }

        // Usage-only chunks carry no choices.
        let Some(choice) = chunk.choices.pop() else {
            return Ok(());
        };

        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            self.queue.push_back(ModelResponseEvent::MessageDelta(content));
        }
        for fragment in choice.delta.tool_calls.into_iter().flatten() {
            match self
                .tool_calls
                .iter_mut()
                .find(|t| t.index == fragment.index)
            {
                Some(partial) => partial.merge(fragment),
                None => self.tool_calls.push(fragment),
            }
        }
        if let Some(finish_reason) = choice.finish_reason {
            self.finish(Some(&finish_reason));
        }
        Ok(())
    }

    fn finish(&mut self, finish_reason: Option<&str>) {
        if self.done {
            return;
        }
        self.done = true;

        let has_tool_calls = !self.tool_calls.is_empty();
        for tool_call in self.tool_calls.drain(..) {
            self.queue
                .push_back(ModelResponseEvent::ToolCall(tool_call.to_request()));
        }
        let reason = match finish_reason {
            Some("tool_calls") => ModelFinishReason::ToolCalls,
            Some("length") => ModelFinishReason::Length,
            None if has_tool_calls => ModelFinishReason::ToolCalls,
            _ => ModelFinishReason::Stop,
        };
        self.queue.push_back(ModelResponseEvent::Completed(reason));
    }
}

type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        if let Some(event) = state.queue.pop_front() {
            return Ok((Some(event), state));
        }
        if state.done {
            return Ok((None, state));
        }
        state.pump().await?;
    }
}

pin_project! {
    /// A streamed response from an OpenAI-compatible endpoint.
    pub struct OpenAIResponse {
        next_event_fut: Option<BoxFuture<'static, NextEvent>>,
    }
}

impl OpenAIResponse {
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            id: None,
            tool_calls: vec![],
            queue: VecDeque::new(),
            done: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let result = ready!(next_event_fut.as_mut().poll(cx));
        match result {
            Ok((Some(event), state)) => {
                *this.next_event_fut = Some(Box::pin(next_event(state)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok((None, _)) => {
                *this.next_event_fut = None;
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::io::Chunks;

    const TOOL_CALL_STREAM: &[u8] = br#"data: {"id":"c1","choices":[{"delta":{"content":"Let me "},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"content":"check."},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_a","type":"function","function":{"name":"search","arguments":"{\"qu"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"tool_calls":[{"index":1,"id":"call_b","type":"function","function":{"name":"load_data","arguments":"{}"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"ery\":\"rust\"}"}}]},"finish_reason":null}]}

data: {"id":"c1","choices":[{"delta":{},"finish_reason":"tool_calls"}]}

data: {"id":"c1","choices":[],"usage":{"total_tokens":42}}

data: [DONE]

"#;

    async fn collect(chunks: Vec<&'static [u8]>) -> Result<Vec<ModelResponseEvent>, Error> {
        let chunks = Chunks::from_vec_deque(
            chunks.into_iter().map(Bytes::from_static).collect(),
        );
        let mut resp = pin!(OpenAIResponse::from_sse(Sse::new(chunks)));
        let mut events = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            events.push(event);
        }
        Ok(events)
    }

    #[tokio::test]
    async fn test_tool_call_events() {
        let events = collect(vec![TOOL_CALL_STREAM]).await.unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0],
            ModelResponseEvent::MessageDelta("Let me ".to_owned())
        );
        assert_eq!(
            events[1],
            ModelResponseEvent::MessageDelta("check.".to_owned())
        );
        let ModelResponseEvent::ToolCall(search) = &events[2] else {
            panic!("expected a tool call, got {:?}", events[2]);
        };
        assert_eq!(search.id, "call_a");
        assert_eq!(search.arguments, json!({ "query": "rust" }));
        let ModelResponseEvent::ToolCall(load) = &events[3] else {
            panic!("expected a tool call, got {:?}", events[3]);
        };
        assert_eq!(load.name, "load_data");
        assert_eq!(
            events[4],
            ModelResponseEvent::Completed(ModelFinishReason::ToolCalls)
        );
    }

    #[tokio::test]
    async fn test_split_chunks() {
        let events = collect(vec![
            b"data: {\"id\":\"c2\",\"choices\":[{\"delta\":{\"content\":\"Hi",
            b"\"},\"finish_reason\":null}]}\n\ndata: {\"id\":\"c2\",",
            b"\"choices\":[{\"delta\":{},\"finish_reason\":\"length\"}]}\n\n",
        ])
        .await
        .unwrap();
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("Hi".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Length),
            ]
        );
    }

    #[tokio::test]
    async fn test_chunk_id_mismatch() {
        let err = collect(vec![
            b"data: {\"id\":\"a\",\"choices\":[{\"delta\":{\"content\":\"x\"},\"finish_reason\":null}]}\n\n",
            b"data: {\"id\":\"b\",\"choices\":[{\"delta\":{\"content\":\"y\"},\"finish_reason\":null}]}\n\n",
        ])
        .await
        .unwrap_err();
        assert_eq!(err.message(), "chunk id mismatch");
    }
}
