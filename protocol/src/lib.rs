pub mod error;
pub mod geometry;
pub mod login;
pub mod request;
pub mod response;

pub use error::ProtocolError;
pub use geometry::{
    BUFFER_SIZE, DECODE_SPLIT, ENCODE_SPLIT, FRAME_COUNT, FRN_AUDIO_PACKET_SIZE, GSM_FRAME_SIZE,
    HALF_FRAME_SIZE, PCM_FRAME_SIZE, VOICE_HEADER_SIZE, VOICE_MESSAGE_SIZE,
};
pub use login::LoginInfo;
pub use request::Request;
pub use response::{classify, Inbound, ResponseCode, VoiceBlock};
