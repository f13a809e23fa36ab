pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod network;
pub mod qso;
pub mod state;
pub mod timer;
pub mod transport;
pub mod uplink;

pub use codec::{FrameCodec, GsmCodec, SpeechCodec};
pub use config::{Credentials, QsoConfig, Timing};
pub use dispatch::{HandshakePolicy, HandshakeStage, HandshakeVerdict, LenientHandshake};
pub use error::{CodecError, ConfigError, QsoError};
pub use event::QsoEvent;
pub use network::{spawn, Command, QsoHandle, TcpTransport};
pub use qso::Qso;
pub use state::State;
pub use transport::{DisconnectReason, Transport};
