use std::fmt;

/// Inbound message classification errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownResponseCode(u8),
    VoiceLength { expected: usize, got: usize },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::EmptyMessage => {
                write!(f, "empty message")
            }
            ProtocolError::UnknownResponseCode(code) => {
                write!(f, "unknown response code: 0x{:02x}", code)
            }
            ProtocolError::VoiceLength { expected, got } => {
                write!(f, "voice message length mismatch: expected {} bytes, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}
