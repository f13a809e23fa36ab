//! Speech codec seam and the FRN packet packing built on top of it.

pub mod frame;
pub mod gsm;

pub use frame::FrameCodec;
pub use gsm::GsmCodec;

use crate::error::CodecError;

/// A stateful speech codec context serving one direction.
///
/// Each call handles one 160-sample frame. Contexts carry prosody state from
/// one frame to the next and alternate between the two halves of a WAV49
/// packed unit, so a context must see every frame of its stream in order and
/// must not be recreated while the session lives.
///
/// Encoding writes 32 bytes for the first half of a unit and 33 for the
/// second; decoding consumes 33 then 32.
pub trait SpeechCodec: Send {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<(), CodecError>;

    fn decode(&mut self, data: &[u8], pcm: &mut [i16]) -> Result<(), CodecError>;
}
