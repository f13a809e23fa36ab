//! Packing of PCM blocks into FRN audio payloads and back.

use frn_protocol::{
    BUFFER_SIZE, DECODE_SPLIT, ENCODE_SPLIT, FRN_AUDIO_PACKET_SIZE, GSM_FRAME_SIZE,
    HALF_FRAME_SIZE, PCM_FRAME_SIZE,
};

use super::SpeechCodec;
use crate::error::CodecError;

/// Owns the session's encode and decode contexts for their whole lifetime.
pub struct FrameCodec<C: SpeechCodec> {
    encoder: C,
    decoder: C,
}

impl<C: SpeechCodec> FrameCodec<C> {
    pub fn new(encoder: C, decoder: C) -> Self {
        Self { encoder, decoder }
    }

    /// Encode a full uplink buffer into one audio payload.
    ///
    /// Every PCM block is split in two halves; the first lands at offset 0 of
    /// its packed unit and the second right after it at `ENCODE_SPLIT`.
    pub fn encode_payload(&mut self, pcm: &[i16]) -> Result<Vec<u8>, CodecError> {
        if pcm.len() != BUFFER_SIZE {
            return Err(CodecError::PcmLength {
                expected: BUFFER_SIZE,
                got: pcm.len(),
            });
        }

        let mut payload = vec![0u8; FRN_AUDIO_PACKET_SIZE];
        for (block, unit) in pcm
            .chunks_exact(PCM_FRAME_SIZE)
            .zip(payload.chunks_exact_mut(GSM_FRAME_SIZE))
        {
            let (first, second) = unit.split_at_mut(ENCODE_SPLIT);
            self.encoder.encode(&block[..HALF_FRAME_SIZE], first)?;
            self.encoder.encode(&block[HALF_FRAME_SIZE..], second)?;
        }

        Ok(payload)
    }

    /// Decode one packed unit into a PCM block.
    pub fn decode_unit(&mut self, unit: &[u8]) -> Result<[i16; PCM_FRAME_SIZE], CodecError> {
        if unit.len() != GSM_FRAME_SIZE {
            return Err(CodecError::FrameLength {
                expected: GSM_FRAME_SIZE,
                got: unit.len(),
            });
        }

        let mut pcm = [0i16; PCM_FRAME_SIZE];
        let (first, second) = pcm.split_at_mut(HALF_FRAME_SIZE);
        self.decoder.decode(&unit[..DECODE_SPLIT], first)?;
        self.decoder.decode(&unit[DECODE_SPLIT..], second)?;

        Ok(pcm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::GsmCodec;
    use frn_protocol::FRAME_COUNT;

    #[derive(Default)]
    struct Recording {
        encoded: Vec<(usize, usize)>,
        decoded: Vec<usize>,
    }

    impl SpeechCodec for Recording {
        fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<(), CodecError> {
            self.encoded.push((pcm.len(), out.len()));
            out.fill(u8::try_from(self.encoded.len()).unwrap());
            Ok(())
        }

        fn decode(&mut self, data: &[u8], pcm: &mut [i16]) -> Result<(), CodecError> {
            self.decoded.push(data.len());
            pcm.fill(i16::from(data[0]));
            Ok(())
        }
    }

    #[test]
    fn payload_uses_alternating_half_sizes() {
        let mut codec = FrameCodec::new(Recording::default(), Recording::default());
        let payload = codec.encode_payload(&[0i16; BUFFER_SIZE]).unwrap();

        assert_eq!(payload.len(), FRN_AUDIO_PACKET_SIZE);
        assert_eq!(codec.encoder.encoded.len(), FRAME_COUNT * 2);
        for (i, &(pcm_len, out_len)) in codec.encoder.encoded.iter().enumerate() {
            assert_eq!(pcm_len, HALF_FRAME_SIZE);
            assert_eq!(out_len, if i % 2 == 0 { 32 } else { 33 });
        }
        assert_eq!(payload[0], 1);
        assert_eq!(payload[ENCODE_SPLIT], 2);
        assert_eq!(payload[GSM_FRAME_SIZE], 3);
    }

    #[test]
    fn unit_decodes_with_reversed_split() {
        let mut codec = FrameCodec::new(Recording::default(), Recording::default());
        let mut unit = [0u8; GSM_FRAME_SIZE];
        unit[0] = 7;
        unit[DECODE_SPLIT] = 9;

        let pcm = codec.decode_unit(&unit).unwrap();
        assert_eq!(codec.decoder.decoded, vec![33, 32]);
        assert!(pcm[..HALF_FRAME_SIZE].iter().all(|&s| s == 7));
        assert!(pcm[HALF_FRAME_SIZE..].iter().all(|&s| s == 9));
    }

    #[test]
    fn silence_round_trip_keeps_length() {
        let mut codec = FrameCodec::new(GsmCodec::new(), GsmCodec::new());
        let payload = codec.encode_payload(&[0i16; BUFFER_SIZE]).unwrap();

        let mut samples = 0;
        for unit in payload.chunks_exact(GSM_FRAME_SIZE) {
            let pcm = codec.decode_unit(unit).unwrap();
            assert!(pcm.iter().all(|s| s.abs() <= 256));
            samples += pcm.len();
        }
        assert_eq!(samples, BUFFER_SIZE);
    }

    #[test]
    fn short_input_is_rejected() {
        let mut codec = FrameCodec::new(GsmCodec::new(), GsmCodec::new());
        assert!(codec.encode_payload(&[0i16; PCM_FRAME_SIZE]).is_err());
        assert!(codec.decode_unit(&[0u8; 64]).is_err());
    }
}
