use super::ltp::{MAX_LAG, MIN_LAG, QLB};
use super::math::{add, mult_r};
use super::short_term::ShortTermFilter;
use super::{rpe, Frame, FRAME_SAMPLES, SUBFRAME_SAMPLES};

/// Reconstructed residual: 120 past samples and one sub-frame
const HISTORY: usize = MAX_LAG + SUBFRAME_SAMPLES;

/// Synthesis state carried across frames.
#[derive(Debug, Clone)]
pub(super) struct Decoder {
    short_term: ShortTermFilter,
    drp: [i16; HISTORY],
    nrp: usize,
    msr: i16,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            short_term: ShortTermFilter::default(),
            drp: [0; HISTORY],
            nrp: MIN_LAG,
            msr: 0,
        }
    }
}

impl Decoder {
    pub(super) fn decode(&mut self, frame: &Frame) -> [i16; FRAME_SAMPLES] {
        let mut wt = [0i16; FRAME_SAMPLES];
        for (sub, out) in frame
            .subframes
            .iter()
            .zip(wt.chunks_exact_mut(SUBFRAME_SAMPLES))
        {
            let erp = rpe::decode(&sub.excitation);
            self.long_term_synthesis(sub.nc, sub.bc, &erp);
            out.copy_from_slice(&self.drp[MAX_LAG..]);
        }

        let mut sr = [0i16; FRAME_SAMPLES];
        self.short_term.synthesise(&frame.larc, &wt, &mut sr);
        self.postprocess(&mut sr);
        sr
    }

    #[allow(clippy::cast_sign_loss)]
    fn long_term_synthesis(&mut self, ncr: i16, bcr: i16, erp: &[i16; SUBFRAME_SAMPLES]) {
        // Out-of-range lags repeat the last good one
        if let Ok(lag) = usize::try_from(ncr) {
            if (MIN_LAG..=MAX_LAG).contains(&lag) {
                self.nrp = lag;
            }
        }
        let nr = self.nrp;
        let brp = QLB[(bcr & 3) as usize];

        for (k, &e) in erp.iter().enumerate() {
            let drpp = mult_r(brp, self.drp[MAX_LAG + k - nr]);
            self.drp[MAX_LAG + k] = add(e, drpp);
        }

        // Keep the newest 120 samples as history
        self.drp.copy_within(SUBFRAME_SAMPLES.., 0);
    }

    /// De-emphasis, upscaling and truncation to 13 bits
    fn postprocess(&mut self, s: &mut [i16; FRAME_SAMPLES]) {
        for x in s.iter_mut() {
            let tmp = mult_r(self.msr, 28180);
            self.msr = add(*x, tmp);
            *x = add(self.msr, self.msr) & !7;
        }
    }
}
