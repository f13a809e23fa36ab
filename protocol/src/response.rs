//! Inbound message classification for the logged-in state.
//!
//! Every message the server sends after login starts with one response code
//! byte. Voice messages additionally carry a 3-byte header (the code byte
//! included) before the packed codec units.

use crate::error::ProtocolError;
use crate::geometry::{GSM_FRAME_SIZE, VOICE_HEADER_SIZE, VOICE_MESSAGE_SIZE};

macro_rules! response_codes {
    ($($name:ident = $val:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ResponseCode { $($name = $val,)* }

        impl ResponseCode {
            #[must_use]
            pub const fn as_u8(self) -> u8 { self as u8 }
        }

        impl TryFrom<u8> for ResponseCode {
            type Error = ProtocolError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($val => Ok(Self::$name),)*
                    _ => Err(ProtocolError::UnknownResponseCode(value)),
                }
            }
        }
    };
}

response_codes! {
    Idle = 0,
    DoTx = 1,
    VoiceBuffer = 2,

    // Informational lists and broadcasts
    ClientList = 3,
    TextMessage = 4,
    NetNames = 5,
    AdminList = 6,
    AccessList = 7,
    BlockList = 8,
    MuteList = 9,
    AccessMode = 10,
}

impl ResponseCode {
    /// Codes whose payload is only forwarded to the application.
    #[must_use]
    pub const fn is_informational(self) -> bool {
        !matches!(self, Self::Idle | Self::DoTx | Self::VoiceBuffer)
    }
}

/// A validated inbound voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceBlock<'a> {
    data: &'a [u8],
}

impl<'a> VoiceBlock<'a> {
    /// Validate a complete voice message, header included.
    pub fn new(message: &'a [u8]) -> Result<Self, ProtocolError> {
        if message.len() != VOICE_MESSAGE_SIZE {
            return Err(ProtocolError::VoiceLength {
                expected: VOICE_MESSAGE_SIZE,
                got: message.len(),
            });
        }
        Ok(Self {
            data: &message[VOICE_HEADER_SIZE..],
        })
    }

    /// Codec bytes without the header.
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        self.data
    }

    /// Packed WAV49 units in transmission order.
    pub fn units(&self) -> impl Iterator<Item = &'a [u8]> {
        self.data.chunks_exact(GSM_FRAME_SIZE)
    }
}

/// Classified inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    Idle,
    DoTx,
    Voice(VoiceBlock<'a>),
    Info {
        code: ResponseCode,
        payload: &'a [u8],
    },
}

/// Classify an inbound message by its leading response code.
///
/// Voice messages of the wrong length are rejected as a whole; informational
/// payloads are passed through untouched, code byte included.
pub fn classify(message: &[u8]) -> Result<Inbound<'_>, ProtocolError> {
    let first = *message.first().ok_or(ProtocolError::EmptyMessage)?;

    match ResponseCode::try_from(first)? {
        ResponseCode::Idle => Ok(Inbound::Idle),
        ResponseCode::DoTx => Ok(Inbound::DoTx),
        ResponseCode::VoiceBuffer => VoiceBlock::new(message).map(Inbound::Voice),
        code => Ok(Inbound::Info {
            code,
            payload: message,
        }),
    }
}
