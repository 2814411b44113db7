use graph_events::{Role, StreamEvent, StreamMode, StreamParser};
use serde_json::{json, Value};

fn token(text: &str) -> Value {
    json!(["messages", [
        {"type": "AIMessageChunk", "content": text},
        {"langgraph_node": "agent"}
    ]])
}

fn dual_stream() -> Vec<Value> {
    vec![
        token("Hel"),
        token("lo"),
        json!(["messages", [
            {
                "type": "AIMessageChunk",
                "content": "",
                "tool_call_chunks": [{"index": 0, "id": "call_1", "name": "search", "args": "{}"}]
            },
            {"langgraph_node": "agent"}
        ]]),
        json!(["updates", {"agent": {"messages": [{
            "type": "ai",
            "content": "Hello",
            "tool_calls": [{"id": "call_1", "name": "search", "args": {"q": "x"}}]
        }]}}]),
        json!(["custom", {"progress": 0.5}]),
        json!(["updates", {"tools": {"messages": [{
            "type": "tool",
            "name": "search",
            "tool_call_id": "call_1",
            "content": "sunny"
        }]}}]),
    ]
}

fn expected_dual_kinds() -> Vec<&'static str> {
    vec![
        "content",
        "content",
        "tool_call_start",
        "tool_call_end",
        "complete",
    ]
}

#[test]
fn dual_mode_takes_text_from_messages_and_tools_from_updates() {
    let mut parser = StreamParser::builder().stream_mode(StreamMode::dual()).build();
    let events: Vec<_> = parser.parse_values(dual_stream()).collect();

    let kinds: Vec<_> = events.iter().map(StreamEvent::kind).collect();
    assert_eq!(kinds, expected_dual_kinds());
    assert_eq!(events[0], StreamEvent::content("Hel", Role::Assistant, Some("agent")));
    assert_eq!(events[1], StreamEvent::content("lo", Role::Assistant, Some("agent")));
    assert_eq!(
        events[2],
        StreamEvent::ToolCallStart {
            id: "call_1".to_string(),
            name: "search".to_string(),
            args: json!({"q": "x"}),
            node: Some("agent".to_string()),
        }
    );
}

#[test]
fn auto_mode_detects_tagged_stream() {
    let mut parser = StreamParser::builder().stream_mode(StreamMode::Auto).build();
    let kinds: Vec<_> = parser
        .parse_values(dual_stream())
        .map(|event| event.kind())
        .collect();
    assert_eq!(kinds, expected_dual_kinds());
}

#[test]
fn unrequested_channel_is_dropped() {
    let mut parser = StreamParser::builder()
        .stream_mode(StreamMode::from_names(&["updates"]).unwrap())
        .build();
    let events: Vec<_> = parser.parse_values([token("ignored")]).collect();
    assert_eq!(events, vec![StreamEvent::Complete]);
}

#[test]
fn malformed_items_are_skipped() {
    let mut parser = StreamParser::builder().stream_mode(StreamMode::dual()).build();
    let events: Vec<_> = parser
        .parse_values([
            token("a"),
            json!({"agent": {"messages": [{"type": "ai", "content": "bare diff"}]}}),
            json!(42),
            token("b"),
        ])
        .collect();
    assert_eq!(
        events,
        vec![
            StreamEvent::content("a", Role::Assistant, Some("agent")),
            StreamEvent::content("b", Role::Assistant, Some("agent")),
            StreamEvent::Complete,
        ]
    );
}

#[test]
fn messages_only_stream_assembles_tool_calls() {
    let chunk = |fragments: Value| {
        json!([
            {"type": "AIMessageChunk", "content": "", "tool_call_chunks": fragments},
            {"langgraph_node": "agent"}
        ])
    };
    let items = vec![
        json!([{"type": "AIMessageChunk", "content": "Let me check. "}, {"langgraph_node": "agent"}]),
        chunk(json!([{"index": 0, "id": "call_1", "name": "search", "args": ""}])),
        chunk(json!([{"index": 0, "args": "{\"q\": \"ru"}])),
        chunk(json!([{"index": 0, "args": "st\"}"}])),
        chunk(json!([{"index": 1, "id": "call_2", "name": "ls", "args": ""}])),
        json!([{"type": "human", "content": "ignored"}, {"langgraph_node": "agent"}]),
    ];

    for mode in [StreamMode::messages(), StreamMode::Auto] {
        let mut parser = StreamParser::builder().stream_mode(mode).build();
        let events: Vec<_> = parser.parse_values(items.clone()).collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::content("Let me check. ", Role::Assistant, Some("agent")),
                StreamEvent::ToolCallStart {
                    id: "call_1".to_string(),
                    name: "search".to_string(),
                    args: json!({"q": "rust"}),
                    node: Some("agent".to_string()),
                },
                StreamEvent::ToolCallStart {
                    id: "call_2".to_string(),
                    name: "ls".to_string(),
                    args: json!({}),
                    node: Some("agent".to_string()),
                },
                StreamEvent::Complete,
            ]
        );
    }
}

#[test]
fn parse_chunk_routes_single_items() {
    let mut parser = StreamParser::builder().stream_mode(StreamMode::dual()).build();
    let events = parser.parse_chunk(&token("hi")).unwrap();
    assert_eq!(
        events,
        vec![StreamEvent::content("hi", Role::Assistant, Some("agent"))]
    );
}
