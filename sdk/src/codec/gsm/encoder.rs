use super::ltp::{self, MAX_LAG, QLB};
use super::math::{add, l_add, mult_r, sub};
use super::short_term::ShortTermFilter;
use super::{lpc, rpe, Frame, FRAME_SAMPLES, SUBFRAME_SAMPLES};

/// Reconstructed short-term residual: 120 past samples and the current frame
const HISTORY: usize = MAX_LAG + FRAME_SAMPLES;

/// Analysis state carried across frames.
#[derive(Debug, Clone)]
pub(super) struct Encoder {
    z1: i16,
    l_z2: i32,
    mp: i16,
    short_term: ShortTermFilter,
    dp0: [i16; HISTORY],
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            z1: 0,
            l_z2: 0,
            mp: 0,
            short_term: ShortTermFilter::default(),
            dp0: [0; HISTORY],
        }
    }
}

impl Encoder {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub(super) fn encode(&mut self, pcm: &[i16; FRAME_SAMPLES]) -> Frame {
        let mut so = self.preprocess(pcm);
        let larc = lpc::analysis(&mut so);
        self.short_term.analyse(&larc, &mut so);

        let mut frame = Frame {
            larc,
            ..Frame::default()
        };
        let mut e = [0i16; SUBFRAME_SAMPLES + 10];

        for (j, sub_frame) in frame.subframes.iter_mut().enumerate() {
            let base = MAX_LAG + j * SUBFRAME_SAMPLES;
            let d = &so[j * SUBFRAME_SAMPLES..(j + 1) * SUBFRAME_SAMPLES];

            let (nc, bc) = ltp::parameters(d, &self.dp0, base);
            for k in 0..SUBFRAME_SAMPLES {
                let dpp = mult_r(QLB[bc], self.dp0[base + k - nc]);
                self.dp0[base + k] = dpp;
                e[5 + k] = sub(d[k], dpp);
            }

            sub_frame.excitation = rpe::encode(&mut e);
            for k in 0..SUBFRAME_SAMPLES {
                self.dp0[base + k] = add(e[5 + k], self.dp0[base + k]);
            }

            sub_frame.nc = nc as i16;
            sub_frame.bc = bc as i16;
        }

        self.dp0.copy_within(FRAME_SAMPLES.., 0);
        frame
    }

    /// Offset compensation and pre-emphasis
    #[allow(clippy::cast_possible_truncation)]
    fn preprocess(&mut self, pcm: &[i16; FRAME_SAMPLES]) -> [i16; FRAME_SAMPLES] {
        let mut so = [0i16; FRAME_SAMPLES];

        for (out, &sample) in so.iter_mut().zip(pcm) {
            let scaled = (sample >> 3) << 2;
            let s1 = scaled - self.z1;
            self.z1 = scaled;

            let mut l_s2 = i32::from(s1) << 15;
            let msp = (self.l_z2 >> 15) as i16;
            let lsp = self.l_z2.wrapping_sub(i32::from(msp) << 15) as i16;
            l_s2 += i32::from(mult_r(lsp, 32735));
            self.l_z2 = l_add(i32::from(msp) * 32735, l_s2);

            let l_temp = l_add(self.l_z2, 16384);
            let msp = mult_r(self.mp, -28180);
            self.mp = (l_temp >> 15) as i16;
            *out = add(self.mp, msp);
        }
        so
    }
}
