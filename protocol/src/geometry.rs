//! Fixed byte and sample geometry of FRN audio packets.
//!
//! Audio is 8 kHz mono. One PCM block holds two 160-sample GSM 06.10 frames,
//! which the WAV49 packing squeezes into a single 65-byte unit.

/// Samples in one GSM frame (20 ms at 8 kHz).
pub const HALF_FRAME_SIZE: usize = 160;

/// Samples in one PCM block (two GSM frames).
pub const PCM_FRAME_SIZE: usize = HALF_FRAME_SIZE * 2;

/// Bytes in one WAV49 packed unit.
pub const GSM_FRAME_SIZE: usize = 65;

/// PCM blocks carried by one network audio packet.
pub const FRAME_COUNT: usize = 5;

/// Samples buffered before an uplink packet is sent.
pub const BUFFER_SIZE: usize = FRAME_COUNT * PCM_FRAME_SIZE;

/// Codec bytes in one network audio packet.
pub const FRN_AUDIO_PACKET_SIZE: usize = FRAME_COUNT * GSM_FRAME_SIZE;

/// Header bytes preceding codec bytes on inbound voice messages.
/// Outbound payloads carry no header.
pub const VOICE_HEADER_SIZE: usize = 3;

/// Exact length of a valid inbound voice message.
pub const VOICE_MESSAGE_SIZE: usize = VOICE_HEADER_SIZE + FRN_AUDIO_PACKET_SIZE;

/// Offset of the second encoded half inside a packed unit when encoding.
/// The encoder emits 32 bytes, then 33.
pub const ENCODE_SPLIT: usize = 32;

/// Offset of the second half inside a packed unit when decoding.
/// The decoder consumes 33 bytes, then 32.
pub const DECODE_SPLIT: usize = 33;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_geometry_is_consistent() {
        assert_eq!(BUFFER_SIZE, 1600);
        assert_eq!(FRN_AUDIO_PACKET_SIZE, 325);
        assert_eq!(VOICE_MESSAGE_SIZE, 328);
        assert_eq!(ENCODE_SPLIT + (GSM_FRAME_SIZE - ENCODE_SPLIT), GSM_FRAME_SIZE);
        assert_eq!(GSM_FRAME_SIZE - DECODE_SPLIT, ENCODE_SPLIT);
    }
}
