//! Interpretation of inbound messages against the session state.

use frn_protocol::{classify, Inbound, ProtocolError, ResponseCode, VoiceBlock};
use tracing::debug;

use crate::state::State;

/// Which server reply of the login handshake is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    /// First reply after the login message.
    Greeting,
    /// Second reply; accepting it completes the login.
    Confirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeVerdict {
    Advance,
    Reject,
}

/// Decides whether a handshake reply lets the login progress.
pub trait HandshakePolicy: Send {
    fn evaluate(&mut self, stage: HandshakeStage, data: &[u8]) -> HandshakeVerdict;
}

/// Accepts any reply as handshake progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct LenientHandshake;

impl HandshakePolicy for LenientHandshake {
    fn evaluate(&mut self, _stage: HandshakeStage, _data: &[u8]) -> HandshakeVerdict {
        HandshakeVerdict::Advance
    }
}

/// What the session should do with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<'a> {
    Ignore,
    Handshake(HandshakeStage, HandshakeVerdict),
    GrantTransmit,
    Voice(VoiceBlock<'a>),
    Info {
        code: ResponseCode,
        payload: &'a [u8],
    },
    /// Malformed message, dropped without surfacing.
    Discard(ProtocolError),
    Anomaly {
        code: u8,
        payload: &'a [u8],
    },
}

pub struct ResponseDispatcher {
    policy: Box<dyn HandshakePolicy>,
}

impl Default for ResponseDispatcher {
    fn default() -> Self {
        Self::new(Box::new(LenientHandshake))
    }
}

impl ResponseDispatcher {
    pub fn new(policy: Box<dyn HandshakePolicy>) -> Self {
        Self { policy }
    }

    pub fn set_policy(&mut self, policy: Box<dyn HandshakePolicy>) {
        self.policy = policy;
    }

    pub fn dispatch<'a>(&mut self, state: State, data: &'a [u8]) -> Action<'a> {
        match state {
            State::LoggingIn => self.handshake(HandshakeStage::Greeting, data),
            State::LoggingIn2 => self.handshake(HandshakeStage::Confirmation, data),
            State::LoggedIn => Self::response(data),
            _ => Action::Ignore,
        }
    }

    fn handshake<'a>(&mut self, stage: HandshakeStage, data: &'a [u8]) -> Action<'a> {
        debug!("Handshake {:?}: {}", stage, String::from_utf8_lossy(data).trim_end());
        Action::Handshake(stage, self.policy.evaluate(stage, data))
    }

    fn response(data: &[u8]) -> Action<'_> {
        match classify(data) {
            Ok(Inbound::Idle) => Action::Ignore,
            Ok(Inbound::DoTx) => Action::GrantTransmit,
            Ok(Inbound::Voice(block)) => Action::Voice(block),
            Ok(Inbound::Info { code, payload }) => Action::Info { code, payload },
            Err(ProtocolError::UnknownResponseCode(code)) => Action::Anomaly {
                code,
                payload: data,
            },
            Err(e) => Action::Discard(e),
        }
    }
}
