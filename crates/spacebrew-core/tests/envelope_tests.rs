//! Envelope Tests
//!
//! Tests for inbound classification and outbound wire shapes:
//! - Data messages and typed value coercion
//! - Admin, remove and route envelopes
//! - Single and batched client announcements
//! - Malformed frames

use serde_json::json;
use spacebrew_core::{
    codec, ChannelDeclaration, ChannelType, ClientConfig, DataMessage, Endpoint, Envelope,
    Outbound, Route, RouteOp, TypedValue,
};

fn classify(frame: serde_json::Value) -> Envelope {
    Envelope::classify(frame)
}

// ============================================================================
// Data Messages
// ============================================================================

#[test]
fn test_boolean_message_true() {
    let env = classify(json!({"message": {"name": "x", "type": "boolean", "value": "true"}}));
    match env {
        Envelope::Message(msg) => {
            assert_eq!(msg.name, "x");
            assert_eq!(msg.typed_value(), TypedValue::Boolean(true));
        }
        other => panic!("Expected message, got {:?}", other),
    }
}

#[test]
fn test_boolean_message_false() {
    let env = classify(json!({"message": {"name": "x", "type": "boolean", "value": "false"}}));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(msg.typed_value(), TypedValue::Boolean(false));
}

#[test]
fn test_boolean_json_literal_is_false() {
    let env = classify(json!({"message": {"name": "x", "type": "boolean", "value": true}}));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(msg.typed_value(), TypedValue::Boolean(false));
}

#[test]
fn test_mistyped_message_type_is_custom() {
    let env = classify(json!({"message": {"name": "x", "type": 3, "value": "v"}}));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(msg.name, "x");
    assert_eq!(
        msg.typed_value(),
        TypedValue::Custom {
            value: "v".to_string(),
            channel_type: String::new(),
        }
    );
}

#[test]
fn test_range_message_numeric() {
    let env = classify(json!({"message": {"name": "dial", "type": "range", "value": "3.5"}}));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(msg.typed_value(), TypedValue::Range(3.5));
}

#[test]
fn test_string_message_passthrough() {
    let env = classify(json!({"message": {"name": "text", "type": "string", "value": "hello"}}));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(msg.typed_value(), TypedValue::String("hello".to_string()));
}

#[test]
fn test_unknown_type_is_custom() {
    let env = classify(json!({"message": {"name": "b", "type": "blob", "value": "raw"}}));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(
        msg.typed_value(),
        TypedValue::Custom {
            value: "raw".to_string(),
            channel_type: "blob".to_string(),
        }
    );
}

#[test]
fn test_message_with_client_name_still_data() {
    let env = classify(json!({
        "message": {"clientName": "other", "name": "x", "type": "string", "value": "v"}
    }));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(msg.client_name.as_deref(), Some("other"));
}

#[test]
fn test_message_missing_fields() {
    let env = classify(json!({"message": {"name": "x"}}));
    let Envelope::Message(msg) = env else {
        panic!("Expected message");
    };
    assert_eq!(
        msg.typed_value(),
        TypedValue::Custom {
            value: String::new(),
            channel_type: String::new(),
        }
    );
}

#[test]
fn test_message_takes_precedence_over_admin_keys() {
    let env = classify(json!({
        "message": {"name": "x", "type": "string", "value": "v"},
        "config": {"name": "ignored"}
    }));
    assert_eq!(env.kind(), "message");
}

// ============================================================================
// Admin Envelopes
// ============================================================================

#[test]
fn test_admin_ack() {
    let env = classify(json!({"admin": [{"admin": true}]}));
    assert_eq!(env.kind(), "admin");
}

#[test]
fn test_remove_envelope() {
    let env = classify(json!({"remove": [
        {"name": "a", "remoteAddress": "10.0.0.1"},
        {"name": "b", "remoteAddress": "10.0.0.2"}
    ]}));
    let Envelope::Remove(removed) = env else {
        panic!("Expected remove");
    };
    assert_eq!(removed.len(), 2);
    assert_eq!(removed[1].name, "b");
    assert_eq!(removed[1].remote_address, "10.0.0.2");
}

#[test]
fn test_route_envelope_publish_keys() {
    let env = classify(json!({"route": {
        "type": "add",
        "publish": {"clientName": "a", "remoteAddress": "1", "name": "out", "type": "range"},
        "subscribe": {"clientName": "b", "remoteAddress": "2", "name": "in", "type": "range"}
    }}));
    let Envelope::Route(update) = env else {
        panic!("Expected route");
    };
    assert_eq!(update.kind, "add");
    assert_eq!(update.publish.unwrap().client_name, "a");
    assert_eq!(update.subscribe.unwrap().name, "in");
}

#[test]
fn test_route_envelope_publisher_keys() {
    let env = classify(json!({"route": {
        "type": "remove",
        "publisher": {"clientName": "a", "remoteAddress": "1", "name": "out", "type": "string"},
        "subscriber": {"clientName": "b", "remoteAddress": "2", "name": "in", "type": "string"}
    }}));
    let Envelope::Route(update) = env else {
        panic!("Expected route");
    };
    assert_eq!(update.kind, "remove");
    assert!(update.publish.is_some());
    assert!(update.subscribe.is_some());
}

#[test]
fn test_route_mistyped_side_keeps_others() {
    let env = classify(json!({"route": {
        "type": "add",
        "publish": "oops",
        "subscribe": {"clientName": "b", "remoteAddress": "2", "name": "y", "type": "range"}
    }}));
    let Envelope::Route(update) = env else {
        panic!("Expected route");
    };
    assert_eq!(update.kind, "add");
    assert_eq!(update.publish, None);
    assert_eq!(
        update.subscribe,
        Some(Endpoint::new("b", "2", "y", Some(ChannelType::Range)))
    );
}

#[test]
fn test_remove_entry_with_mistyped_address() {
    let env = classify(json!({"remove": [{"name": "gone", "remoteAddress": 5}]}));
    let Envelope::Remove(removed) = env else {
        panic!("Expected remove");
    };
    assert_eq!(removed[0].name, "gone");
    assert_eq!(removed[0].remote_address, "");
}

// ============================================================================
// Client Announcements
// ============================================================================

#[test]
fn test_bare_config_is_single_announcement() {
    let env = classify(json!({"config": {
        "name": "sensor",
        "remoteAddress": "192.168.1.4",
        "description": "a sensor",
        "publish": {"messages": [{"name": "level", "type": "range", "default": "0"}]},
        "subscribe": {"messages": []}
    }}));
    let Envelope::Configs(clients) = env else {
        panic!("Expected configs");
    };
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "sensor");
    assert_eq!(clients[0].remote_address, "192.168.1.4");
    assert_eq!(clients[0].publish.messages[0].channel_type, ChannelType::Range);
    assert_eq!(clients[0].publish.messages[0].default.as_deref(), Some("0"));
}

#[test]
fn test_config_array_skips_non_config_entries() {
    let env = classify(json!([
        {"config": {"name": "a", "remoteAddress": "1"}},
        {"something": "else"},
        42,
        {"config": {"name": "b", "remoteAddress": "2"}}
    ]));
    let Envelope::Configs(clients) = env else {
        panic!("Expected configs");
    };
    let names: Vec<_> = clients.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_numeric_default_is_tolerated() {
    let env = classify(json!({"config": {
        "name": "a",
        "remoteAddress": "1",
        "publish": {"messages": [{"name": "n", "type": "range", "default": 500}]}
    }}));
    let Envelope::Configs(clients) = env else {
        panic!("Expected configs");
    };
    assert_eq!(clients[0].publish.messages[0].default.as_deref(), Some("500"));
}

#[test]
fn test_channel_missing_type_keeps_announcement() {
    let env = classify(json!({"config": {
        "name": "lamp",
        "remoteAddress": "10.0.0.2",
        "publish": {"messages": [{"name": "x"}, {"name": "y", "type": "boolean"}]}
    }}));
    let Envelope::Configs(clients) = env else {
        panic!("Expected configs");
    };
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "lamp");

    let messages = &clients[0].publish.messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].channel_type, ChannelType::Custom(String::new()));
    assert_eq!(messages[1].channel_type, ChannelType::Boolean);
}

#[test]
fn test_mistyped_config_fields_decode_independently() {
    let env = classify(json!({"config": {
        "name": "lamp",
        "remoteAddress": 42,
        "description": ["not", "text"],
        "publish": {"messages": [7, {"name": "on", "type": "boolean"}]},
        "subscribe": "nothing"
    }}));
    let Envelope::Configs(clients) = env else {
        panic!("Expected configs");
    };
    let client = &clients[0];
    assert_eq!(client.name, "lamp");
    assert_eq!(client.remote_address, "");
    assert_eq!(client.description, "");
    assert_eq!(client.publish.len(), 1);
    assert_eq!(client.publish.messages[0].name, "on");
    assert!(client.subscribe.is_empty());
}

#[test]
fn test_unrecognized_object() {
    let env = classify(json!({"hello": "world"}));
    assert_eq!(env.kind(), "unrecognized");
}

#[test]
fn test_null_key_treated_as_absent() {
    let env = classify(json!({"message": null, "admin": true}));
    assert_eq!(env.kind(), "admin");
}

// ============================================================================
// Codec
// ============================================================================

#[test]
fn test_decode_rejects_non_json() {
    assert!(codec::decode(b"not json").is_err());
}

#[test]
fn test_encode_config_wire_shape() {
    let mut config = ClientConfig::new("app", "desc");
    config
        .publish
        .messages
        .push(ChannelDeclaration::publish("out", "boolean", Some("false".to_string())));
    config
        .subscribe
        .messages
        .push(ChannelDeclaration::subscribe("in", "range"));

    let bytes = codec::encode(&Outbound::Config(config)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(
        value,
        json!({"config": {
            "name": "app",
            "description": "desc",
            "publish": {"messages": [{"name": "out", "type": "boolean", "default": "false"}]},
            "subscribe": {"messages": [{"name": "in", "type": "range"}]}
        }})
    );
}

#[test]
fn test_encode_admin_registration() {
    let bytes = codec::encode(&Outbound::admin_registration()).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!({"admin": [{"admin": true}]}));
}

#[test]
fn test_encode_data_message() {
    let msg = DataMessage::new("app", "out", ChannelType::Range, "512");
    let bytes = codec::encode(&Outbound::Message(msg)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        value,
        json!({"message": {"clientName": "app", "name": "out", "type": "range", "value": "512"}})
    );
}

#[test]
fn test_encode_route_request() {
    let route = Route::new(
        Endpoint::new("a", "1", "out", Some(ChannelType::String)),
        Endpoint::new("b", "2", "in", Some(ChannelType::String)),
    );
    let bytes = codec::encode(&Outbound::route(RouteOp::Remove, &route)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        value,
        json!({"route": {
            "type": "remove",
            "publisher": {"clientName": "a", "remoteAddress": "1", "name": "out", "type": "string"},
            "subscriber": {"clientName": "b", "remoteAddress": "2", "name": "in", "type": "string"}
        }})
    );
}

#[test]
fn test_encode_route_omits_unresolved_type() {
    let route = Route::new(
        Endpoint::new("a", "1", "out", None),
        Endpoint::new("b", "2", "in", None),
    );
    let bytes = codec::encode(&Outbound::route(RouteOp::Add, &route)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(value["route"]["publisher"].get("type").is_none());
}
