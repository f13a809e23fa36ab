use frn_protocol::ResponseCode;

use crate::state::State;

/// Events published by a session to the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QsoEvent {
    /// The session moved to a new state.
    StateChanged(State),
    /// The server granted the floor; the upstream source should resume.
    ResumeOutput,
    /// A flush request from the upstream source has been handled.
    AllSamplesFlushed,
    /// Informational list or broadcast, passed through uninterpreted.
    Info { code: ResponseCode, payload: Vec<u8> },
    /// Message with an unrecognized response code.
    ProtocolAnomaly { code: u8, payload: Vec<u8> },
}
