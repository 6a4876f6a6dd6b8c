use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::QuizError;
use crate::question::{Question, QuestionRecord};

/// Strip a surrounding Markdown code fence.
///
/// When the trimmed text starts with ```` ``` ````, the first line (fence plus
/// language tag) and the last line (closing fence) are dropped. Text without a
/// leading fence is returned unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return text;
    }

    let Some((_, body)) = trimmed.split_once('\n') else {
        // A lone fence line carries no payload.
        return "";
    };
    match body.rsplit_once('\n') {
        Some((inner, _closing)) => inner,
        None => body.strip_suffix("```").unwrap_or(body),
    }
}

/// Decode the model's answer into typed questions.
///
/// The text is fence-stripped, parsed as a JSON array, and every element is
/// checked for the required fields and a valid `correct_answer`. Any failure
/// rejects the whole response and carries the raw text along.
#[instrument(target = "mcq_forge::json", skip(text), fields(text_len = text.len()))]
pub fn decode_questions(text: &str) -> Result<Vec<Question>, QuizError> {
    let malformed = |reason: String| QuizError::MalformedResponse { reason, raw: text.to_string() };

    let payload = strip_code_fence(text);
    let elements: Vec<Value> = serde_json::from_str(payload).map_err(|e| {
        warn!(target = "mcq_forge::json", error = %e, "response is not a JSON array");
        malformed(e.to_string())
    })?;

    if elements.is_empty() {
        return Err(malformed("response contained no questions".to_string()));
    }

    let mut questions = Vec::with_capacity(elements.len());
    for (i, element) in elements.into_iter().enumerate() {
        if !element.is_object() {
            return Err(malformed(format!("question {} is not a JSON object", i + 1)));
        }
        let record: QuestionRecord = serde_json::from_value(element)
            .map_err(|e| malformed(format!("question {}: {}", i + 1, e)))?;
        questions.push(Question::from(record));
    }

    debug!(target = "mcq_forge::json", count = questions.len(), "decoded questions");
    Ok(questions)
}
