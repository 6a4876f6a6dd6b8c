//! Prompt construction for MCQ generation.

use std::fmt;
use std::str::FromStr;

use schemars::schema_for;
use serde::{Deserialize, Serialize};

use crate::catalog::Subject;
use crate::error::QuizError;
use crate::question::QuestionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Unknown difficulty: '{}'. Supported: Easy, Medium, Hard", s)),
        }
    }
}

/// Number of questions to request, bounded to `1..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCount(u32);

impl QuestionCount {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 20;
    pub const DEFAULT: u32 = 5;

    pub fn new(n: u32) -> Result<Self, QuizError> {
        if (Self::MIN..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(QuizError::InvalidQuestionCount(n))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for QuestionCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user's choices on the setup form, minus the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    pub subject: Subject,
    pub topic: String,
    pub count: QuestionCount,
    pub difficulty: Difficulty,
}

impl QuizRequest {
    /// Build a request, checking that `topic` belongs to `subject`.
    pub fn new(
        subject: Subject,
        topic: impl Into<String>,
        count: QuestionCount,
        difficulty: Difficulty,
    ) -> Result<Self, QuizError> {
        let topic = topic.into();
        if !subject.contains_topic(&topic) {
            return Err(QuizError::UnknownTopic { subject: subject.to_string(), topic });
        }
        Ok(Self { subject, topic, count, difficulty })
    }

    /// Render the instruction sent to the model.
    pub fn to_prompt(&self) -> String {
        let base = format!(
            r#"You are an expert IITJEE MCQ creator. Generate {count} MCQ questions for the topic '{topic}' from {subject} for class 11/12. The questions should be of '{difficulty}' level and strictly IITJEE standard.

Output a JSON list, each item with these keys: question, option1, option2, option3, option4, solution, hints, correct_answer.

Example:
[
  {{
    "question": "...",
    "option1": "...",
    "option2": "...",
    "option3": "...",
    "option4": "...",
    "solution": "...",
    "hints": "...",
    "correct_answer": "option2"
  }}, ...
]"#,
            count = self.count,
            topic = self.topic,
            subject = self.subject,
            difficulty = self.difficulty,
        );
        add_schema_guidance(base)
    }
}

fn add_schema_guidance(prompt: String) -> String {
    let schema = schema_for!(QuestionRecord);
    let schema_json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nRespond with only the JSON list. Each item must match this schema:\n```json\n{}\n```",
        prompt, schema_json
    )
}
