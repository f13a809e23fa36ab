//! GSM 06.10 full-rate speech codec in WAV49 packing.
//!
//! Fixed-point RPE-LTP coder: each 20 ms frame of 160 samples becomes 260
//! bits of short-term, long-term and excitation parameters. WAV49 stores two
//! frames in 65 bytes, so the first frame of a unit writes 32 bytes and
//! carries its last 4 bits into the first byte of the second frame.

mod decoder;
mod encoder;
mod lpc;
mod ltp;
mod math;
mod rpe;
mod short_term;
mod wav49;

use frn_protocol::{DECODE_SPLIT, ENCODE_SPLIT, GSM_FRAME_SIZE, HALF_FRAME_SIZE};

use super::SpeechCodec;
use crate::error::CodecError;
use decoder::Decoder;
use encoder::Encoder;
use rpe::Excitation;

const FRAME_SAMPLES: usize = HALF_FRAME_SIZE;
const SUBFRAME_SAMPLES: usize = FRAME_SAMPLES / 4;

/// Bits in one coded frame
const FRAME_BITS: usize = 260;

/// Bytes that hold one frame plus the nibble shared with its neighbour
const PACKED_SIZE: usize = (FRAME_BITS + 4) / 8;

/// Parameters of one sub-frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SubFrame {
    nc: i16,
    bc: i16,
    excitation: Excitation,
}

/// Parameters of one coded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Frame {
    larc: [i16; 8],
    subframes: [SubFrame; 4],
}

/// GSM codec context.
///
/// Encoding and decoding keep separate state, but each side expects one
/// continuous stream, so a session uses one context per direction.
#[derive(Debug, Clone, Default)]
pub struct GsmCodec {
    encoder: Encoder,
    decoder: Decoder,
    encode_second: bool,
    encode_carry: u8,
    decode_second: bool,
    decode_carry: u8,
}

impl GsmCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn pcm_block(pcm: &[i16]) -> Result<&[i16; FRAME_SAMPLES], CodecError> {
    pcm.try_into().map_err(|_| CodecError::PcmLength {
        expected: FRAME_SAMPLES,
        got: pcm.len(),
    })
}

impl SpeechCodec for GsmCodec {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<(), CodecError> {
        let block = pcm_block(pcm)?;
        let expected = if self.encode_second {
            GSM_FRAME_SIZE - ENCODE_SPLIT
        } else {
            ENCODE_SPLIT
        };
        if out.len() != expected {
            return Err(CodecError::FrameLength {
                expected,
                got: out.len(),
            });
        }

        let frame = self.encoder.encode(block);
        let mut packed = [0u8; PACKED_SIZE];

        if self.encode_second {
            packed[0] = self.encode_carry;
            wav49::pack(&frame, &mut packed, 4);
            out.copy_from_slice(&packed);
        } else {
            wav49::pack(&frame, &mut packed, 0);
            out.copy_from_slice(&packed[..ENCODE_SPLIT]);
            self.encode_carry = packed[ENCODE_SPLIT] & 0x0F;
        }

        self.encode_second = !self.encode_second;
        Ok(())
    }

    fn decode(&mut self, data: &[u8], pcm: &mut [i16]) -> Result<(), CodecError> {
        if pcm.len() != FRAME_SAMPLES {
            return Err(CodecError::PcmLength {
                expected: FRAME_SAMPLES,
                got: pcm.len(),
            });
        }
        let expected = if self.decode_second {
            GSM_FRAME_SIZE - DECODE_SPLIT
        } else {
            DECODE_SPLIT
        };
        if data.len() != expected {
            return Err(CodecError::FrameLength {
                expected,
                got: data.len(),
            });
        }

        let mut packed = [0u8; PACKED_SIZE];
        let frame = if self.decode_second {
            packed[0] = self.decode_carry << 4;
            packed[1..].copy_from_slice(data);
            wav49::unpack(&packed, 4)
        } else {
            packed.copy_from_slice(data);
            self.decode_carry = data[DECODE_SPLIT - 1] >> 4;
            wav49::unpack(&packed, 0)
        };

        pcm.copy_from_slice(&self.decoder.decode(&frame));
        self.decode_second = !self.decode_second;
        Ok(())
    }
}
