//! Payload encoding and Server-Sent Events framing.

use crate::error::Result;
use crate::metrics::StatusSnapshot;

/// Serializes snapshots into the stream payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusEncoder;

impl StatusEncoder {
    /// Encode a snapshot as a compact JSON object.
    pub fn encode(&self, snapshot: &StatusSnapshot) -> Result<String> {
        Ok(serde_json::to_string(snapshot)?)
    }
}

/// Frame a payload as one event block.
///
/// Produces `event: <name>\ndata: <payload>\n\n`, or `data: <payload>\n\n`
/// when no event name is given. A payload spanning several lines is split
/// over several `data:` lines.
pub fn frame_event(event: Option<&str>, payload: &str) -> String {
    let mut frame = String::with_capacity(payload.len() + 32);

    if let Some(name) = event {
        frame.push_str("event: ");
        frame.push_str(name);
        frame.push('\n');
    }

    for line in payload.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line.strip_suffix('\r').unwrap_or(line));
        frame.push('\n');
    }

    frame.push('\n');
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_wire_field_names() {
        let snapshot = StatusSnapshot {
            cpu_usage: 42,
            temperature: 51,
            memory_usage: 30,
            storage_usage: 70,
            cpu_frequency: 1800,
            memory_total: 8192,
            memory_used: 2457,
            storage_total: 476.5,
            storage_used: 333.5,
        };

        let json = StatusEncoder.encode(&snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["cpu_usage"], 42);
        assert_eq!(value["temperature"], 51);
        assert_eq!(value["memory_usage"], 30);
        assert_eq!(value["storage_usage"], 70);
        assert_eq!(value["cpu_frequency"], 1800);
        assert_eq!(value["memory_total"], 8192);
        assert_eq!(value["memory_used"], 2457);
        assert_eq!(value["storage_total"], 476.5);
        assert_eq!(value["storage_used"], 333.5);
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_named_event_frame() {
        assert_eq!(
            frame_event(Some("update"), r#"{"cpu_usage":42}"#),
            "event: update\ndata: {\"cpu_usage\":42}\n\n"
        );
    }

    #[test]
    fn test_unnamed_event_frame() {
        assert_eq!(frame_event(None, "{}"), "data: {}\n\n");
    }

    #[test]
    fn test_multiline_payload_splits_data_lines() {
        assert_eq!(frame_event(None, "a\r\nb"), "data: a\ndata: b\n\n");
    }
}
