//! The seam between quiz logic and the hosted text-generation service.
//!
//! Implementors provide `ask_raw`, which executes a prompt and returns the full
//! model text. Clients that can stream override `stream_raw` and hand back the
//! raw Server-Sent Events bytes; `crate::streaming` turns those into text
//! fragments.

use std::fmt::{self, Debug};
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;

use crate::error::AIError;

/// Type alias for raw byte streams from AI providers
pub type RawByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, AIError>> + Send>>;

/// One outbound generation call: the instruction plus the caller's credential.
///
/// Model identifier, temperature and length cap belong to the client's settings.
#[derive(Clone)]
pub struct ChatRequest {
    pub api_key: String,
    pub prompt: String,
}

impl ChatRequest {
    pub fn new(api_key: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), prompt: prompt.into() }
    }
}

// Keep the credential out of logs.
impl Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("api_key", &"***")
            .field("prompt_len", &self.prompt.len())
            .finish()
    }
}

/// Low-level model client abstraction.
#[async_trait]
pub trait LowLevelClient: Send + Sync + Debug {
    /// The only method that implementations must provide
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError>;

    /// Clone this client into a boxed trait object
    fn clone_box(&self) -> Box<dyn LowLevelClient>;

    /// Optional: provide a streaming raw response as SSE bytes.
    /// Default is None; providers override to implement true streaming.
    fn stream_raw(&self, _request: ChatRequest) -> Option<RawByteStream> {
        None
    }
}

impl Clone for Box<dyn LowLevelClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl LowLevelClient for Box<dyn LowLevelClient> {
    async fn ask_raw(&self, request: ChatRequest) -> Result<String, AIError> {
        self.as_ref().ask_raw(request).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        self.as_ref().clone_box()
    }

    fn stream_raw(&self, request: ChatRequest) -> Option<RawByteStream> {
        self.as_ref().stream_raw(request)
    }
}
