use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of one of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OptionId {
    Option1,
    Option2,
    Option3,
    Option4,
}

impl OptionId {
    pub const ALL: [OptionId; 4] = [OptionId::Option1, OptionId::Option2, OptionId::Option3, OptionId::Option4];

    /// Zero-based position of the option.
    pub fn index(&self) -> usize {
        match self {
            OptionId::Option1 => 0,
            OptionId::Option2 => 1,
            OptionId::Option3 => 2,
            OptionId::Option4 => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn key(&self) -> &'static str {
        match self {
            OptionId::Option1 => "option1",
            OptionId::Option2 => "option2",
            OptionId::Option3 => "option3",
            OptionId::Option4 => "option4",
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Wire shape of one question as the model is asked to emit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "MCQ", description = "One multiple-choice question with four options")]
pub struct QuestionRecord {
    /// The question prompt
    #[serde(deserialize_with = "scalar_text")]
    pub question: String,
    #[serde(deserialize_with = "scalar_text")]
    pub option1: String,
    #[serde(deserialize_with = "scalar_text")]
    pub option2: String,
    #[serde(deserialize_with = "scalar_text")]
    pub option3: String,
    #[serde(deserialize_with = "scalar_text")]
    pub option4: String,
    /// Worked solution explaining the correct option
    #[serde(default, deserialize_with = "optional_scalar_text")]
    pub solution: Option<String>,
    /// A hint that does not give the answer away
    #[serde(default, deserialize_with = "optional_scalar_text")]
    pub hints: Option<String>,
    /// Key of the correct option
    pub correct_answer: OptionId,
}

/// Text fields also accept bare numbers and booleans, since numeric answers
/// often come back unquoted.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(String::from)
}

fn optional_scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

/// A decoded multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub question: String,
    pub options: [String; 4],
    pub solution: Option<String>,
    pub hints: Option<String>,
    pub correct_answer: OptionId,
}

impl Question {
    pub fn option_text(&self, id: OptionId) -> &str {
        &self.options[id.index()]
    }

    pub fn correct_text(&self) -> &str {
        self.option_text(self.correct_answer)
    }

    /// An unanswered selection is never correct.
    pub fn is_correct(&self, selected: Option<OptionId>) -> bool {
        selected == Some(self.correct_answer)
    }
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        Self {
            question: record.question,
            options: [record.option1, record.option2, record.option3, record.option4],
            solution: record.solution.filter(|s| !s.trim().is_empty()),
            hints: record.hints.filter(|s| !s.trim().is_empty()),
            correct_answer: record.correct_answer,
        }
    }
}
