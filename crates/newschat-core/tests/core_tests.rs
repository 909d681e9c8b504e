use chrono::TimeZone;
use newschat_core::config::Settings;
use newschat_core::*;
use tempfile::TempDir;

// ========================================================================
// Settings Tests (config/mod.rs)
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.backend.base_url, "http://localhost:3001/api");
    assert!(!settings.backend.streaming);
    assert!(settings.backend.request_timeout_secs.is_none());
    assert_eq!(settings.ui.theme, "dark");
    assert!(settings.session.dir.is_none());
    assert_eq!(settings.delivery_mode(), DeliveryMode::Buffered);
}

#[test]
fn test_settings_save_and_reload_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.backend.base_url = "https://news.example.com/api".to_string();
    settings.backend.streaming = true;
    settings.backend.request_timeout_secs = Some(30);
    settings.ui.theme = "dracula".to_string();

    settings.save_to(&config_path).unwrap();
    let loaded = Settings::load_from(&config_path);

    assert_eq!(loaded, settings);
    assert_eq!(loaded.delivery_mode(), DeliveryMode::Streaming);
}

#[test]
fn test_settings_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[ui]\ntheme = \"tokyo-night\"\n").unwrap();

    let loaded = Settings::load_from(&config_path);

    assert_eq!(loaded.ui.theme, "tokyo-night");
    assert_eq!(loaded.backend.base_url, "http://localhost:3001/api");
}

#[test]
fn test_settings_invalid_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "this is = = not toml").unwrap();

    assert_eq!(Settings::load_from(&config_path), Settings::default());
}

#[test]
fn test_settings_missing_file_is_default() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Settings::load_from(&temp_dir.path().join("absent.toml"));
    assert_eq!(loaded, Settings::default());
}

#[test]
fn test_settings_session_store_uses_configured_dir() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.session.dir = Some(temp_dir.path().to_path_buf());

    let client = settings.build_client().unwrap();
    let store = settings.build_session_store(&client);
    store.store("configured").unwrap();

    assert!(temp_dir.path().join("http_localhost_3001.json").exists());
    assert_eq!(store.load().unwrap().as_deref(), Some("configured"));
}

#[test]
fn test_settings_build_client_with_timeout() {
    let mut settings = Settings::default();
    settings.backend.request_timeout_secs = Some(5);
    settings.backend.base_url = "http://127.0.0.1:9/api/".to_string();

    let client = settings.build_client().unwrap();
    assert_eq!(client.base_url(), "http://127.0.0.1:9/api");
    assert_eq!(client.origin(), "http://127.0.0.1:9");
}

// ========================================================================
// Message serialization (conversation/message.rs)
// ========================================================================

#[test]
fn test_message_serializes_camel_case_and_omits_defaults() {
    let message = Message::bot("7", "done");
    let json = serde_json::to_value(&message).unwrap();

    assert_eq!(json["sender"], "bot");
    assert!(json.get("isStreaming").is_none());
    assert!(json.get("isError").is_none());
    assert!(json.get("sources").is_none());

    let error = Message::bot("8", "oops").error();
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["isError"], true);
}

#[test]
fn test_message_deserializes_optional_flags() {
    let message: Message = serde_json::from_str(
        r#"{"id":"9","content":"...","sender":"bot","timestamp":"2024-01-02T03:04:05+02:00",
            "isStreaming":true,"isError":false}"#,
    )
    .unwrap();

    assert!(message.is_streaming);
    assert!(!message.is_error);
    assert_eq!(message.timestamp.to_rfc3339(), "2024-01-02T01:04:05+00:00");
}

#[test]
fn test_message_rejects_bad_timestamp() {
    let result = serde_json::from_str::<Message>(
        r#"{"id":"1","content":"x","sender":"user","timestamp":"yesterday"}"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_message_accepts_numeric_ids() {
    let message: Message = serde_json::from_str(
        r#"{"id":1714564800000,"content":"x","sender":"bot","timestamp":1714564800000}"#,
    )
    .unwrap();
    assert_eq!(message.id, "1714564800000");

    let message: Message = serde_json::from_str(
        r#"{"id":2.5,"content":"x","sender":"bot","timestamp":1714564800000}"#,
    )
    .unwrap();
    assert_eq!(message.id, "2.5");
}

#[test]
fn test_message_timestamp_formats() {
    let parse = |timestamp: &str| {
        let json = format!(r#"{{"id":"1","content":"x","sender":"user","timestamp":{timestamp}}}"#);
        serde_json::from_str::<Message>(&json).unwrap().timestamp
    };
    let noon = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    assert_eq!(parse(r#""2024-05-01T12:00:00Z""#), noon);
    assert_eq!(parse(r#""2024-05-01T14:00:00+02:00""#), noon);
    assert_eq!(parse(r#""2024-05-01T12:00:00""#), noon);
    assert_eq!(parse(r#""2024-05-01 12:00:00""#), noon);
    assert_eq!(
        parse(r#""2024-05-01T12:00:00.123456""#),
        noon + chrono::Duration::microseconds(123_456)
    );
    assert_eq!(
        parse(r#""2024-05-01""#),
        chrono::Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(parse("1714564800000"), noon);
    assert_eq!(
        parse("1714564800000.5"),
        noon + chrono::Duration::microseconds(500)
    );
}

#[test]
fn test_stream_event_wire_format() {
    let chunk: StreamEvent = serde_json::from_str(r#"{"type":"chunk","content":"Hi"}"#).unwrap();
    assert_eq!(
        chunk,
        StreamEvent::Chunk {
            content: "Hi".into()
        }
    );

    let complete: StreamEvent =
        serde_json::from_str(r#"{"type":"complete","sources":[{"title":"A","url":"u"}]}"#)
            .unwrap();
    match complete {
        StreamEvent::Complete { sources } => {
            let sources = sources.unwrap();
            assert_eq!(sources[0].url.as_deref(), Some("u"));
            assert!(sources[0].date.is_none());
        }
        other => panic!("unexpected event {other:?}"),
    }

    let unknown: StreamEvent = serde_json::from_str(r#"{"type":"heartbeat"}"#).unwrap();
    assert_eq!(unknown, StreamEvent::Unknown);
}

#[test]
fn test_error_messages() {
    assert_eq!(
        ChatError::network(404).to_string(),
        "HTTP error! status: 404"
    );
    assert_eq!(ChatError::network(404).status(), Some(404));
    assert_eq!(ChatError::storage("x").status(), None);
}
