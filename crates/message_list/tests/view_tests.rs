//! Tests for view projections

use message_core::{
    ContentPart, Message, MessageV1Type, ProtocolContent, ProtocolMessage, Role, V1Content,
    WireRole,
};
use message_list::{MessageList, Provenance};
use serde_json::json;

fn seeded() -> MessageList {
    let mut list = MessageList::for_thread("t1");
    list.add(
        json!({
            "id": "old",
            "role": "user",
            "createdAt": "2024-05-01T09:00:00Z",
            "threadId": "t1",
            "content": "remember me"
        }),
        Provenance::Memory,
    )
    .unwrap();
    list.add("what is 2+2?", Provenance::User).unwrap();
    list.add(
        json!({
            "id": "a1",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "computing"},
                {"type": "tool-call", "toolCallId": "c1", "toolName": "calc", "input": {"expr": "2+2"}},
                {"type": "tool-result", "toolCallId": "c1", "toolName": "calc", "output": 4}
            ]
        }),
        Provenance::Response,
    )
    .unwrap();
    list
}

#[test]
fn test_views_filter_by_provenance() {
    let list = seeded();
    let views = list.get();

    assert_eq!(views.all.len(), 3);
    assert_eq!(views.remembered.current_gen()[0].id, "old");
    assert_eq!(views.input.len(), 1);
    assert_eq!(views.response.current_gen()[0].id, "a1");
}

#[test]
fn test_model_input_splits_tool_results() {
    let list = seeded();
    let input = list.get().all.external_model_input();

    let roles: Vec<_> = input.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [WireRole::User, WireRole::User, WireRole::Assistant, WireRole::Tool]
    );

    let value = serde_json::to_value(&input[3]).unwrap();
    assert_eq!(value["content"][0]["type"], json!("tool-result"));
    assert_eq!(value["content"][0]["output"], json!(4));
}

#[test]
fn test_streaming_only_message_is_sanitized_away() {
    let mut list = MessageList::new();
    list.add("hi", Provenance::User).unwrap();
    list.add(
        json!({
            "id": "a1",
            "role": "assistant",
            "createdAt": "2024-05-01T10:00:00Z",
            "content": {
                "format": 3,
                "parts": [{
                    "type": "tool-invocation",
                    "toolCallId": "c1",
                    "toolName": "search",
                    "state": "input-streaming"
                }]
            }
        }),
        Provenance::Response,
    )
    .unwrap();

    assert_eq!(list.len(), 2);
    let input = list.get().all.external_model_input();
    assert_eq!(input, vec![ProtocolMessage::text(WireRole::User, "hi")]);
}

#[test]
fn test_round_trip_through_prior_generation() {
    let original = Message::assistant(
        "a1",
        vec![
            ContentPart::text("see below"),
            ContentPart::tool_result("c1", "calc", Some(json!({"a": 1})), json!(2)),
            ContentPart::StepBoundary,
            ContentPart::reasoning("because"),
        ],
    )
    .with_thread("t1");

    let mut first = MessageList::for_thread("t1");
    first.add(original.clone(), Provenance::Memory).unwrap();
    let prior = first.get().all.prior_gen();

    let mut second = MessageList::for_thread("t1");
    second.add(prior, Provenance::Memory).unwrap();

    assert_eq!(second.get().all.current_gen(), vec![original]);
}

#[test]
fn test_round_trip_drops_file_names() {
    let mut file = ContentPart::file("https://x/report.pdf", "application/pdf");
    if let ContentPart::File { filename, .. } = &mut file {
        *filename = Some("report.pdf".to_string());
    }
    let original = Message::new("u1", Role::User, vec![file]);

    let mut first = MessageList::new();
    first.add(original, Provenance::Memory).unwrap();
    let mut second = MessageList::new();
    second.add(first.get().all.prior_gen(), Provenance::Memory).unwrap();

    assert_eq!(
        second.get().all.current_gen()[0].parts(),
        &[ContentPart::file("https://x/report.pdf", "application/pdf")]
    );
}

#[test]
fn test_oldest_generation_view() {
    let list = seeded();
    let oldest = list.get().response.oldest_gen();

    assert_eq!(oldest.len(), 2);
    assert_eq!(oldest[0].kind, MessageV1Type::ToolCall);
    assert_eq!(oldest[1].role, WireRole::Tool);
    assert_eq!(oldest[1].kind, MessageV1Type::ToolResult);

    let remembered = list.get().remembered.oldest_gen();
    assert_eq!(remembered[0].content, V1Content::Text("remember me".to_string()));
}

#[test]
fn test_ui_view() {
    let list = seeded();
    let ui = list.get().response.external_ui();
    let value = serde_json::to_value(&ui).unwrap();

    assert_eq!(value[0]["parts"][1]["type"], json!("tool-calc"));
    assert_eq!(value[0]["parts"][1]["output"], json!(4));
}

#[test]
fn test_ui_message_input() {
    let mut list = MessageList::new();
    list.add(
        json!({
            "id": "ui1",
            "role": "assistant",
            "parts": [
                {"type": "text", "text": "weather:"},
                {"type": "tool-weather", "toolCallId": "w1", "state": "output-available", "input": {"city": "Oslo"}, "output": {"temp": 3}}
            ]
        }),
        Provenance::Response,
    )
    .unwrap();

    let input = list.get().all.external_model_input();
    assert_eq!(input.len(), 2);
    match &input[0].content {
        ProtocolContent::Parts(parts) => assert_eq!(parts[1].type_tag(), "tool-call"),
        other => panic!("unexpected content {other:?}"),
    }
}

#[test]
fn test_views_do_not_mutate() {
    let list = seeded();
    let before = list.get().all.current_gen();
    let _ = list.get().all.external_model_input();
    let _ = list.get().all.oldest_gen();
    let _ = list.get().all.external_ui();
    assert_eq!(list.get().all.current_gen(), before);
}
