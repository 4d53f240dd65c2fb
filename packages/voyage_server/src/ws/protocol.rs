use serde::{Deserialize, Serialize};

/// Messages from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    pub content: String,
    /// Role the client believes it holds. Informational only: the server
    /// attributes messages to the role the connection was admitted with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed client frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("client frame has no content")]
    Empty,
}

/// Decode a text frame from the client. Content is trimmed; whitespace-only
/// content is rejected as [`FrameError::Empty`].
pub fn decode_client_frame(text: &str) -> Result<ClientMessage, FrameError> {
    let mut msg: ClientMessage = serde_json::from_str(text)?;
    let trimmed = msg.content.trim();
    if trimmed.is_empty() {
        return Err(FrameError::Empty);
    }
    if trimmed.len() != msg.content.len() {
        msg.content = trimmed.to_string();
    }
    Ok(msg)
}

pub fn joined_text(role: &str) -> String {
    format!("{role} has joined the voyage.")
}

pub fn left_text(role: &str) -> String {
    format!("{role} has left the voyage.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_role() {
        let msg = decode_client_frame(r#"{"content":"Set course for Io","role":"Captain"}"#).unwrap();
        assert_eq!(msg.content, "Set course for Io");
        assert_eq!(msg.role.as_deref(), Some("Captain"));
    }

    #[test]
    fn test_decode_without_role() {
        let msg = decode_client_frame(r#"{"content":"hello"}"#).unwrap();
        assert_eq!(msg.content, "hello");
        assert!(msg.role.is_none());
    }

    #[test]
    fn test_decode_trims_content() {
        let msg = decode_client_frame(r#"{"content":"  ping  "}"#).unwrap();
        assert_eq!(msg.content, "ping");
    }

    #[test]
    fn test_decode_rejects_blank_content() {
        assert!(matches!(
            decode_client_frame(r#"{"content":"   "}"#),
            Err(FrameError::Empty)
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_client_frame("not json"),
            Err(FrameError::Malformed(_))
        ));
        assert!(matches!(
            decode_client_frame(r#"{"role":"Captain"}"#),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_announcement_text() {
        assert_eq!(joined_text("Mechanic"), "Mechanic has joined the voyage.");
        assert_eq!(left_text("Mechanic"), "Mechanic has left the voyage.");
    }
}
