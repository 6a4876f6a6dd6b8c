use async_stream::stream;
use futures_core::stream::Stream;
use futures_util::{pin_mut, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;
use tracing::{debug, trace, warn};

use crate::core::RawByteStream;
use crate::error::{AIError, StreamFailure};

/// Pull the text delta out of one chat-completion chunk.
fn delta_content(payload: &Value) -> Option<&str> {
    payload
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c0| c0.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
}

/// Turn an SSE bytes stream into the sequence of text fragments it carries.
///
/// Each `data:` event holding `choices[0].delta.content` yields that string;
/// `[DONE]` ends the sequence. Events without content (role headers, finish
/// markers) are skipped. Transport errors and `error` events sent by the
/// service are yielded and end the stream.
pub fn text_fragments(byte_stream: RawByteStream) -> impl Stream<Item = Result<String, AIError>> {
    stream! {
        let io_stream = byte_stream.map(|res| match res {
            Ok(bytes) => Ok::<_, std::io::Error>(bytes),
            Err(e) => Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())),
        });
        let reader = StreamReader::new(io_stream);
        let mut lines = BufReader::new(reader).lines();
        let mut sse_event = String::new();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => Some(line),
                Ok(None) => None,
                Err(e) => {
                    warn!(target = "mcq_forge::stream", error = %e, "stream read failed");
                    yield Err(AIError::Stream(e.to_string()));
                    break;
                }
            };

            // End of input flushes a final event that lacks its blank line.
            let Some(line) = line else {
                match event_content(&sse_event) {
                    Ok(Some(fragment)) => yield Ok(fragment),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
                break;
            };

            if !line.is_empty() {
                if !sse_event.is_empty() { sse_event.push('\n'); }
                sse_event.push_str(&line);
                continue;
            }

            if is_done(&sse_event) {
                debug!(target = "mcq_forge::stream", "received [DONE]");
                break;
            }
            match event_content(&sse_event) {
                Ok(Some(fragment)) => {
                    trace!(target = "mcq_forge::stream", len = fragment.len(), "fragment");
                    yield Ok(fragment);
                }
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
            sse_event.clear();
        }
    }
}

fn event_data(event: &str) -> Option<&str> {
    event
        .strip_prefix("data: ")
        .or_else(|| event.strip_prefix("data:"))
        .map(str::trim)
}

fn is_done(event: &str) -> bool {
    event_data(event) == Some("[DONE]")
}

/// Message of an in-band `{"error": ...}` event.
fn error_message(payload: &Value) -> Option<String> {
    let error = payload.get("error")?;
    let message = match error.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()),
    };
    Some(message)
}

fn event_content(event: &str) -> Result<Option<String>, AIError> {
    let Some(payload) = event_data(event) else {
        return Ok(None);
    };
    if payload == "[DONE]" {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(payload) {
        Ok(v) => {
            if let Some(message) = error_message(&v) {
                warn!(target = "mcq_forge::stream", error = %message, "service reported an error mid-stream");
                return Err(AIError::Stream(message));
            }
            Ok(delta_content(&v).filter(|s| !s.is_empty()).map(str::to_string))
        }
        Err(e) => {
            debug!(target = "mcq_forge::stream", error = %e, "skipping non-JSON event");
            Ok(None)
        }
    }
}

/// Consume a fragment stream and concatenate it in arrival order.
///
/// On failure the text received so far travels with the error.
pub async fn collect_text<S>(fragments: S) -> Result<String, StreamFailure>
where
    S: Stream<Item = Result<String, AIError>>,
{
    pin_mut!(fragments);
    let mut content = String::new();
    let mut count = 0usize;
    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(text) => content.push_str(&text),
            Err(source) => return Err(StreamFailure { source, partial: content }),
        }
        count += 1;
    }
    debug!(target = "mcq_forge::stream", fragments = count, len = content.len(), "stream collected");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_marker_is_recognised() {
        assert!(is_done("data: [DONE]"));
        assert!(!is_done("data: {}"));
    }

    #[test]
    fn role_only_delta_has_no_content() {
        let event = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(event_content(event).unwrap(), None);
        let event = r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#;
        assert_eq!(event_content(event).unwrap(), Some("hi".to_string()));
    }

    #[test]
    fn error_event_carries_service_message() {
        let event = r#"data: {"error":{"message":"model overloaded","type":"server_error"}}"#;
        match event_content(event) {
            Err(AIError::Stream(message)) => assert_eq!(message, "model overloaded"),
            other => panic!("expected stream error, got {:?}", other),
        }
        let bare = r#"data: {"error":"quota exhausted"}"#;
        assert!(matches!(event_content(bare), Err(AIError::Stream(m)) if m == "quota exhausted"));
    }
}
