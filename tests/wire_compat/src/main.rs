fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use serde_json::{Value, json};
    use wsecho_protocol::{Direction, Envelope, LogEntry, MessageType, decode};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    // --- Envelopes ---

    #[test]
    fn fixture_welcome() {
        let env: Envelope = roundtrip_test("welcome.json");
        assert_eq!(env.msg_type, MessageType::Welcome);
        assert!(env.data.is_none());
    }

    #[test]
    fn fixture_echo_object() {
        let env: Envelope = roundtrip_test("echo_object.json");
        assert_eq!(env.msg_type, MessageType::Echo);
        assert_eq!(env.data.as_ref().unwrap()["nested"]["list"][1], json!(2.5));
    }

    #[test]
    fn fixture_echo_string() {
        let env: Envelope = roundtrip_test("echo_string.json");
        assert_eq!(env.data, Some(json!("{bad json")));
    }

    #[test]
    fn fixture_echo_null() {
        // A present null survives; it is not dropped as "absent".
        let env: Envelope = roundtrip_test("echo_null.json");
        assert_eq!(env.data, Some(Value::Null));
    }

    #[test]
    fn fixture_echo_array() {
        let env: Envelope = roundtrip_test("echo_array.json");
        assert_eq!(env.data, Some(json!([])));
    }

    #[test]
    fn echo_built_from_decoded_frame_matches_fixture_shape() {
        let fixture = load_fixture("echo_object.json");
        let raw = fixture["data"].to_string();

        let mut env = Envelope::echo(decode(&raw).into_value());
        env.timestamp = fixture["timestamp"].as_str().unwrap().to_owned();

        assert_eq!(serde_json::to_value(&env).unwrap(), fixture);
    }

    #[test]
    fn envelope_fields_in_wire_order() {
        let mut welcome = Envelope::welcome();
        welcome.timestamp = "2024-05-01T12:00:00.000Z".into();
        assert_eq!(
            welcome.to_json().unwrap(),
            r#"{"type":"welcome","message":"Connected to WebSocket server","timestamp":"2024-05-01T12:00:00.000Z"}"#
        );

        let mut echo = Envelope::echo(json!({"a": 1}));
        echo.timestamp = "2024-05-01T12:00:01.000Z".into();
        assert_eq!(
            echo.to_json().unwrap(),
            r#"{"type":"echo","data":{"a":1},"timestamp":"2024-05-01T12:00:01.000Z"}"#
        );
    }

    // --- Client log entries ---

    #[test]
    fn fixture_log_entry_sent() {
        let entry: LogEntry = roundtrip_test("log_entry_sent.json");
        assert_eq!(entry.direction, Direction::Sent);
        assert!(entry.entry_type.is_none());
    }

    #[test]
    fn fixture_log_entry_notice() {
        let entry: LogEntry = roundtrip_test("log_entry_notice.json");
        assert_eq!(entry.direction, Direction::Received);
        assert_eq!(entry.entry_type.as_deref(), Some("disconnected"));
    }

    #[test]
    fn unknown_envelope_type_is_rejected() {
        let raw = r#"{"type":"pong","timestamp":"2024-05-01T12:00:00.000Z"}"#;
        assert!(serde_json::from_str::<Envelope>(raw).is_err());
    }
}
