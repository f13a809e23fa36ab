//! Floor-control and keep-alive tokens sent to the server.

use std::fmt;

/// Short ASCII control requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    /// Ready to receive; sent once after login completes.
    Rx0,
    /// Stop transmitting.
    Tx0,
    /// Start transmitting; precedes every uplink voice payload.
    Tx1,
    /// Keep-alive ping.
    Ping,
}

impl Request {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rx0 => "RX0",
            Self::Tx0 => "TX0",
            Self::Tx1 => "TX1",
            Self::Ping => "P",
        }
    }

    /// Encode to wire format: the token followed by a line break.
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.as_str().len() + 1);
        buf.extend_from_slice(self.as_str().as_bytes());
        buf.push(b'\n');
        buf
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
