use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use crate::core::{ChatRequest, LowLevelClient, RawByteStream};
use crate::error::AIError;

/// A scripted reply for the mock client.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Whole reply, delivered as a single fragment.
    Success(String),
    /// Reply delivered fragment by fragment.
    Chunks(Vec<String>),
    /// Fail the call with this message.
    Error(String),
}

/// Shared control surface for a `MockClient`: queue replies, inspect calls.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<ChatRequest>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Every request the client has received, in order.
    pub fn calls(&self) -> Vec<ChatRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn next(&self, request: ChatRequest) -> MockResponse {
        lock(&self.calls).push(request);
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Error("no mock response queued".to_string()))
    }
}

/// Encode one text fragment as an OpenAI-style SSE event.
pub fn sse_chunk(content: &str) -> Bytes {
    let payload = serde_json::json!({
        "choices": [ { "index": 0, "delta": { "content": content } } ]
    });
    Bytes::from(format!("data: {}\n\n", payload))
}

/// Mock client that replays queued responses over the streaming interface.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.add_response(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl LowLevelClient for MockClient {
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        match self.handle.next(request) {
            MockResponse::Success(text) => Ok(text),
            MockResponse::Chunks(chunks) => Ok(chunks.concat()),
            MockResponse::Error(message) => Err(AIError::Mock(message)),
        }
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }

    fn stream_raw(&self, request: ChatRequest) -> Option<RawByteStream> {
        let events: Vec<Result<Bytes, AIError>> = match self.handle.next(request) {
            MockResponse::Success(text) => vec![Ok(sse_chunk(&text))],
            MockResponse::Chunks(chunks) => chunks.iter().map(|c| Ok(sse_chunk(c))).collect(),
            MockResponse::Error(message) => vec![Err(AIError::Mock(message))],
        };
        let done = std::iter::once(Ok(Bytes::from_static(b"data: [DONE]\n\n")));
        Some(Box::pin(stream::iter(events.into_iter().chain(done))))
    }
}
