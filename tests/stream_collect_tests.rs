use bytes::Bytes;
use futures_util::stream;
use futures_util::StreamExt;
use mcq_forge::clients::mock::sse_chunk;
use mcq_forge::core::RawByteStream;
use mcq_forge::error::AIError;
use mcq_forge::streaming::{collect_text, text_fragments};

fn byte_stream(chunks: Vec<Result<Bytes, AIError>>) -> RawByteStream {
    Box::pin(stream::iter(chunks))
}

#[tokio::test]
async fn fragments_concatenate_in_arrival_order() {
    let events = vec![
        Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n")),
        Ok(sse_chunk("[{\"question\":")),
        Ok(sse_chunk(" \"Q1\"")),
        Ok(sse_chunk("}]")),
        Ok(Bytes::from_static(b"data: [DONE]\n\n")),
    ];
    let text = collect_text(text_fragments(byte_stream(events))).await.unwrap();
    assert_eq!(text, "[{\"question\": \"Q1\"}]");
}

#[tokio::test]
async fn events_split_across_byte_chunks() {
    let whole = [sse_chunk("Hello, "), sse_chunk("world")].concat();
    let (a, b) = whole.split_at(17);
    let events = vec![Ok(Bytes::copy_from_slice(a)), Ok(Bytes::copy_from_slice(b))];

    let fragments: Vec<String> = text_fragments(byte_stream(events))
        .map(|r| r.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["Hello, ".to_string(), "world".to_string()]);
}

#[tokio::test]
async fn nothing_after_done_is_read() {
    let events = vec![
        Ok(sse_chunk("kept")),
        Ok(Bytes::from_static(b"data: [DONE]\n\n")),
        Ok(sse_chunk("ignored")),
    ];
    let text = collect_text(text_fragments(byte_stream(events))).await.unwrap();
    assert_eq!(text, "kept");
}

#[tokio::test]
async fn crlf_line_endings_are_accepted() {
    let events = vec![Ok(Bytes::from(
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\n\r\ndata: [DONE]\r\n\r\n",
    ))];
    let text = collect_text(text_fragments(byte_stream(events))).await.unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn transport_error_keeps_partial_text() {
    let events = vec![
        Ok(sse_chunk("[{\"question\":")),
        Err(AIError::Mock("connection reset".to_string())),
    ];
    let failure = collect_text(text_fragments(byte_stream(events))).await.unwrap_err();
    assert_eq!(failure.partial, "[{\"question\":");
    assert!(failure.source.to_string().contains("connection reset"));
}

#[tokio::test]
async fn service_error_event_fails_with_partial_text() {
    let events = vec![
        Ok(sse_chunk("[{\"question\":")),
        Ok(Bytes::from_static(b"data: {\"error\":{\"message\":\"rate limited mid-stream\"}}\n\n")),
        Ok(sse_chunk("never read")),
    ];
    let failure = collect_text(text_fragments(byte_stream(events))).await.unwrap_err();
    assert_eq!(failure.partial, "[{\"question\":");
    assert!(matches!(&failure.source, AIError::Stream(m) if m == "rate limited mid-stream"));
}
