pub mod catalog;
pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod generator;
pub mod json_utils;
pub mod prompt;
pub mod question;
pub mod session;
pub mod streaming;

// Convenient re-exports
pub use catalog::Subject;
pub use error::{QuizError, SessionError};
pub use generator::{GenerationForm, QuizGenerator};
pub use prompt::{Difficulty, QuestionCount, QuizRequest};
pub use question::{OptionId, Question};
pub use session::{QuizSession, Score};
