//! Tests for rejected input and system messages

use message_core::{ProtocolMessage, WireRole};
use message_list::{MessageList, MessageListConfig, MessageListError, Provenance};
use serde_json::json;

#[test]
fn test_unhandled_shape() {
    let mut list = MessageList::new();
    let err = list.add(json!({"text": "no role or content"}), Provenance::User).unwrap_err();
    assert!(matches!(err, MessageListError::UnhandledShape(_)));

    let err = list.add(json!(42), Provenance::User).unwrap_err();
    assert!(err.to_string().starts_with("unhandled message shape"));
}

#[test]
fn test_unrecognized_role() {
    let mut list = MessageList::new();
    let err = list
        .add(json!({"role": "function", "content": "x"}), Provenance::User)
        .unwrap_err();
    assert!(matches!(err, MessageListError::UnrecognizedRole(role) if role == "function"));
}

#[test]
fn test_system_role_in_add_is_rejected() {
    let mut list = MessageList::new();
    let err = list
        .add(json!({"role": "system", "content": "be terse"}), Provenance::Context)
        .unwrap_err();
    assert!(matches!(err, MessageListError::SystemRoleRejected));
    assert!(list.is_empty());
}

#[test]
fn test_incompatible_content_names_part_and_role() {
    let mut list = MessageList::new();
    let err = list
        .add(
            json!({
                "role": "tool",
                "content": [{"type": "file", "data": "aGk=", "mediaType": "text/plain"}]
            }),
            Provenance::Response,
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "file content is not allowed in a tool message");
}

#[test]
fn test_tool_text_is_rejected_in_string_and_array_form() {
    let inputs = [
        json!({"role": "tool", "content": "x"}),
        json!({"role": "tool", "content": [{"type": "text", "text": "x"}]}),
        json!({
            "id": "m1",
            "role": "tool",
            "createdAt": "2024-05-01T10:00:00Z",
            "threadId": "t1",
            "content": "x"
        }),
    ];

    for input in inputs {
        let mut list = MessageList::new();
        let err = list.add(input, Provenance::Response).unwrap_err();
        assert_eq!(err.to_string(), "text content is not allowed in a tool message");
        assert!(list.is_empty());
    }
}

#[test]
fn test_malformed_batch_stores_nothing() {
    let mut list = MessageList::new();
    let err = list
        .add(
            json!([
                {"role": "user", "content": "fine"},
                {"id": "x", "role": "user", "content": {"format": 3}}
            ]),
            Provenance::User,
        )
        .unwrap_err();
    assert!(matches!(err, MessageListError::Malformed { .. }));
    assert!(list.is_empty());
}

#[test]
fn test_context_mismatch_message() {
    let mut list = MessageList::with_config(MessageListConfig::for_thread("t1"));
    let err = list
        .add(
            json!({
                "id": "m9",
                "role": "user",
                "createdAt": "2024-05-01T10:00:00Z",
                "threadId": "other",
                "content": "hi"
            }),
            Provenance::User,
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "message m9 declares threadId other, but this list is bound to threadId t1"
    );
}

#[test]
fn test_system_messages_and_prompt() {
    let mut list = MessageList::new();
    list.add_system("You are a helpful assistant.", None)
        .unwrap()
        .add_system("You are a helpful assistant.", None)
        .unwrap()
        .add_system(
            json!({"role": "system", "content": [{"type": "text", "text": "Use tools sparingly."}]}),
            Some("tools"),
        )
        .unwrap();
    list.add("hi", Provenance::User).unwrap();

    assert_eq!(list.get_system_messages(None).len(), 1);
    assert_eq!(list.get_system_messages(Some("tools"))[0].content, "Use tools sparingly.");

    let prompt = list.prompt(Some("tools"));
    assert_eq!(
        prompt,
        vec![
            ProtocolMessage::text(WireRole::System, "You are a helpful assistant."),
            ProtocolMessage::text(WireRole::System, "Use tools sparingly."),
            ProtocolMessage::text(WireRole::User, "hi"),
        ]
    );
    assert_eq!(list.prompt(None).len(), 2);
}

#[test]
fn test_add_system_rejects_other_roles() {
    let mut list = MessageList::new();
    let err = list
        .add_system(ProtocolMessage::text(WireRole::User, "not a system message"), None)
        .unwrap_err();
    assert!(matches!(err, MessageListError::ExpectedSystemRole(role) if role == "user"));
}

#[test]
fn test_unknown_parts_are_dropped_not_rejected() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut list = MessageList::with_config(MessageListConfig {
        warn_on_dropped_parts: true,
        ..MessageListConfig::default()
    });
    list.add(
        json!({
            "role": "assistant",
            "content": [
                {"type": "text", "text": "ok"},
                {"type": "hologram", "data": 1}
            ]
        }),
        Provenance::Response,
    )
    .unwrap();

    let messages = list.get().all.current_gen();
    assert_eq!(messages[0].parts().len(), 1);
}
