//! One-shot MCQ generation: credential check, prompt, streamed call, decode.

use std::fmt;

use tracing::{info, instrument, warn};

use crate::core::{ChatRequest, LowLevelClient};
use crate::error::QuizError;
use crate::json_utils::decode_questions;
use crate::prompt::QuizRequest;
use crate::question::Question;
use crate::streaming::{collect_text, text_fragments};

/// Everything the setup form collects, including the credential.
#[derive(Clone)]
pub struct GenerationForm {
    pub api_key: String,
    pub request: QuizRequest,
}

impl GenerationForm {
    pub fn new(api_key: impl Into<String>, request: QuizRequest) -> Self {
        Self { api_key: api_key.into(), request }
    }
}

impl fmt::Debug for GenerationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationForm")
            .field("api_key", &"***")
            .field("request", &self.request)
            .finish()
    }
}

/// Drives a single generation attempt against a `LowLevelClient`.
#[derive(Debug, Clone)]
pub struct QuizGenerator<C> {
    client: C,
}

impl<C: LowLevelClient> QuizGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Generate the questions for `form`. Exactly one remote call is made, and
    /// none at all when the credential is blank.
    #[instrument(target = "mcq_forge::generator", skip(self, form), fields(
        subject = %form.request.subject,
        topic = %form.request.topic,
        count = form.request.count.get(),
        difficulty = %form.request.difficulty,
    ))]
    pub async fn generate(&self, form: &GenerationForm) -> Result<Vec<Question>, QuizError> {
        let api_key = form.api_key.trim();
        if api_key.is_empty() {
            warn!(target = "mcq_forge::generator", "generation requested without an API key");
            return Err(QuizError::MissingCredential);
        }

        let request = ChatRequest::new(api_key, form.request.to_prompt());
        let content = match self.client.stream_raw(request.clone()) {
            Some(bytes) => collect_text(text_fragments(bytes)).await?,
            None => self.client.ask_raw(request).await?,
        };
        info!(target = "mcq_forge::generator", response_len = content.len(), "model response received");

        let questions = decode_questions(&content)?;
        let requested = form.request.count.get() as usize;
        if questions.len() != requested {
            warn!(
                target = "mcq_forge::generator",
                requested,
                received = questions.len(),
                "model returned a different number of questions than requested"
            );
        }
        Ok(questions)
    }
}
