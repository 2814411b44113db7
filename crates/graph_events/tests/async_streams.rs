#![cfg(feature = "async")]

use futures_util::{stream, StreamExt};
use graph_events::{Role, StreamEvent, StreamMode, StreamParser};
use serde_json::{json, Value};

fn hello_diff() -> Value {
    json!({"agent": {"messages": [{"type": "ai", "content": "Hello"}]}})
}

#[tokio::test]
async fn async_iteration_matches_blocking() {
    let items = vec![
        hello_diff(),
        json!({"agent": {"messages": [{
            "type": "ai",
            "content": "",
            "tool_calls": [{"id": "call_1", "name": "search", "args": {}}]
        }]}}),
    ];

    let blocking: Vec<_> = StreamParser::default().parse_values(items.clone()).collect();

    let mut parser = StreamParser::default();
    let source = stream::iter(items.into_iter().map(Ok::<Value, std::io::Error>));
    let streamed: Vec<_> = parser.parse_stream(source).collect().await;

    assert_eq!(streamed, blocking);
    assert_eq!(streamed.last(), Some(&StreamEvent::Complete));
}

#[tokio::test]
async fn async_fault_ends_with_error() {
    let mut parser = StreamParser::default();
    let source = stream::iter(vec![
        Ok(hello_diff()),
        Err("socket closed".to_string()),
        Ok(hello_diff()),
    ]);
    let events: Vec<_> = parser.parse_stream(source).collect().await;

    assert_eq!(
        events[0],
        StreamEvent::content("Hello", Role::Assistant, Some("agent"))
    );
    assert!(matches!(
        &events[1],
        StreamEvent::Error { fault: Some(fault), .. } if fault == "socket closed"
    ));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn empty_async_source_only_completes() {
    let mut parser = StreamParser::builder().stream_mode(StreamMode::Auto).build();
    let source = stream::iter(Vec::<Result<Value, String>>::new());
    let events: Vec<_> = parser.parse_stream(source).collect().await;
    assert_eq!(events, vec![StreamEvent::Complete]);
}

#[cfg(feature = "tokio")]
#[tokio::test]
async fn async_jsonl_reader_feeds_the_parser() {
    use graph_events::AsyncChunkJsonlReader;

    let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/dual_stream.jsonl");
    let file = tokio::fs::File::open(path).await.unwrap();
    let reader = AsyncChunkJsonlReader::new(tokio::io::BufReader::new(file));

    let mut parser = StreamParser::builder().stream_mode(StreamMode::dual()).build();
    let kinds: Vec<_> = parser
        .parse_stream(reader)
        .map(|event| event.kind())
        .collect()
        .await;
    assert_eq!(
        kinds,
        vec![
            "content",
            "content",
            "tool_call_start",
            "tool_call_end",
            "content",
            "usage",
            "complete",
        ]
    );
}

#[cfg(feature = "tokio")]
#[tokio::test]
async fn async_jsonl_reader_reports_line_numbers() {
    use graph_events::AsyncChunkJsonlReader;

    let input: &[u8] = b"{\"a\": 1}\n\n{broken\n";
    let items: Vec<_> = AsyncChunkJsonlReader::new(input).collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &json!({"a": 1}));
    assert_eq!(items[1].as_ref().unwrap_err().line_number(), 3);
}
