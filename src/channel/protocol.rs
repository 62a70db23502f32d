//! JSON message shapes for the recognizer wire protocols.
//!
//! The streaming socket carries raw binary audio frames upstream plus one
//! JSON control message, and JSON transcript/error messages downstream.
//! The batch endpoint answers one upload with one JSON reply. These shapes
//! are fixed by the external service; field names here are wire names.

use serde::{Deserialize, Serialize};

/// Control messages sent to the streaming recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// No more audio will follow; finalize the current segment.
    Stop,
}

impl ControlMessage {
    /// Serialize to the wire JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages received from the streaming recognizer.
///
/// Untagged: the server distinguishes the two shapes by their fields alone
/// (`transcript`/`is_final` vs `error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Transcript { transcript: String, is_final: bool },
    Error { error: String },
}

impl ServerMessage {
    /// Deserialize from a wire JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Reply from the batch transcription endpoint: either the transcription
/// result or an error payload with a human-readable detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchReply {
    Result { success: bool, transcript: String },
    Error { detail: String },
}

impl BatchReply {
    /// Deserialize from a wire JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_control_exact_wire_format() {
        let json = ControlMessage::Stop.to_json().unwrap();
        assert_eq!(json, r#"{"type":"stop"}"#);
    }

    #[test]
    fn test_server_transcript_parses() {
        let msg = ServerMessage::from_json(r#"{"transcript":"hello world","is_final":false}"#)
            .expect("should deserialize");
        assert_eq!(
            msg,
            ServerMessage::Transcript {
                transcript: "hello world".to_string(),
                is_final: false,
            }
        );
    }

    #[test]
    fn test_server_final_transcript_parses() {
        let msg = ServerMessage::from_json(r#"{"transcript":"Hello world.","is_final":true}"#)
            .expect("should deserialize");
        let ServerMessage::Transcript { is_final, .. } = msg else {
            panic!("expected transcript variant");
        };
        assert!(is_final);
    }

    #[test]
    fn test_server_error_parses() {
        let msg = ServerMessage::from_json(r#"{"error":"recognizer overloaded"}"#)
            .expect("should deserialize");
        assert_eq!(
            msg,
            ServerMessage::Error {
                error: "recognizer overloaded".to_string(),
            }
        );
    }

    #[test]
    fn test_server_message_malformed_payloads_rejected() {
        assert!(ServerMessage::from_json("not json at all").is_err());
        assert!(ServerMessage::from_json(r#"{"transcript":"missing final flag"}"#).is_err());
        assert!(ServerMessage::from_json(r#"{"unrelated":true}"#).is_err());
        assert!(ServerMessage::from_json(r#"{"transcript":42,"is_final":true}"#).is_err());
    }

    #[test]
    fn test_server_transcript_with_special_chars() {
        let msg = ServerMessage::from_json(r#"{"transcript":"she said \"stop\"","is_final":true}"#)
            .expect("should deserialize");
        let ServerMessage::Transcript { transcript, .. } = msg else {
            panic!("expected transcript variant");
        };
        assert_eq!(transcript, "she said \"stop\"");
    }

    #[test]
    fn test_batch_result_parses() {
        let reply = BatchReply::from_json(r#"{"success":true,"transcript":"Full report text."}"#)
            .expect("should deserialize");
        assert_eq!(
            reply,
            BatchReply::Result {
                success: true,
                transcript: "Full report text.".to_string(),
            }
        );
    }

    #[test]
    fn test_batch_failure_result_parses() {
        let reply = BatchReply::from_json(r#"{"success":false,"transcript":""}"#)
            .expect("should deserialize");
        let BatchReply::Result { success, .. } = reply else {
            panic!("expected result variant");
        };
        assert!(!success);
    }

    #[test]
    fn test_batch_error_detail_parses() {
        let reply = BatchReply::from_json(r#"{"detail":"audio payload empty"}"#)
            .expect("should deserialize");
        assert_eq!(
            reply,
            BatchReply::Error {
                detail: "audio payload empty".to_string(),
            }
        );
    }

    #[test]
    fn test_batch_reply_malformed_rejected() {
        assert!(BatchReply::from_json(r#"{"status":"ok"}"#).is_err());
        assert!(BatchReply::from_json("").is_err());
    }
}
