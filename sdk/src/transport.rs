//! Byte-stream transport seam.
//!
//! All calls return immediately. Connect completion and disconnects are
//! reported back to the session through `Qso::on_connected` and
//! `Qso::on_disconnected`; received bytes through `Qso::on_data_received`.

use std::fmt;

/// Why a transport connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    HostNotFound,
    RemoteDisconnected,
    SystemError,
    RecvBufferOverflow,
    OrderedDisconnect,
    Unknown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HostNotFound => "host not found",
            Self::RemoteDisconnected => "remote disconnected",
            Self::SystemError => "system error",
            Self::RecvBufferOverflow => "receive buffer overflow",
            Self::OrderedDisconnect => "ordered disconnect",
            Self::Unknown => "unknown reason",
        };
        f.write_str(s)
    }
}

/// Non-blocking connection primitives used by the session.
pub trait Transport {
    /// Start connecting. Completion is reported asynchronously.
    fn connect(&mut self, host: &str, port: u16);

    /// Queue bytes for sending, returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> usize;

    fn is_connected(&self) -> bool;

    /// Close the connection or abandon a pending connect. No-op when idle;
    /// never reports a disconnect back.
    fn disconnect(&mut self);
}
