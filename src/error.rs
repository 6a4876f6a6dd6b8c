use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Please enter your API key.")]
    MissingCredential,
    #[error("Question count must be between 1 and 20, got {0}")]
    InvalidQuestionCount(u32),
    #[error("Unknown topic '{topic}' for {subject}")]
    UnknownTopic { subject: String, topic: String },
    #[error("AI error: {0}")]
    Ai(#[from] AIError),
    #[error("Response stream interrupted: {source}")]
    StreamInterrupted { source: AIError, partial: String },
    #[error("Error parsing MCQ JSON: {reason}")]
    MalformedResponse { reason: String, raw: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl QuizError {
    /// Raw or partial model output attached to the error, for debugging display.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            QuizError::MalformedResponse { raw, .. } => Some(raw.as_str()),
            QuizError::StreamInterrupted { partial, .. } => Some(partial.as_str()),
            _ => None,
        }
    }
}

/// A fragment stream that failed part-way, with the text received so far.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct StreamFailure {
    pub source: AIError,
    pub partial: String,
}

impl From<StreamFailure> for QuizError {
    fn from(failure: StreamFailure) -> Self {
        if failure.partial.is_empty() {
            QuizError::Ai(failure.source)
        } else {
            QuizError::StreamInterrupted { source: failure.source, partial: failure.partial }
        }
    }
}

#[derive(Error, Debug)]
pub enum AIError {
    #[error("Groq API error: {0}")]
    Groq(#[from] GroqError),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("Mock error: {0}")]
    Mock(String),
}

#[derive(Error, Debug)]
pub enum GroqError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No quiz is active")]
    NoActiveQuiz,
    #[error("A quiz has already been generated for this session")]
    AlreadyStarted,
    #[error("Question {index} is out of range (quiz has {total} questions)")]
    QuestionOutOfRange { index: usize, total: usize },
    #[error("Cannot start a quiz without questions")]
    EmptyQuiz,
}
