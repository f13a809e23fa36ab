//! Short-term lattice filters driven by interpolated reflection coefficients.

use super::math::{abs, add, mult_r, sub};
use super::FRAME_SAMPLES;

/// (B, MIC, INVA) per coefficient
const DECODE: [(i16, i16, i16); 8] = [
    (0, -32, 13107),
    (0, -32, 13107),
    (2048, -16, 13107),
    (-2560, -16, 13107),
    (94, -8, 19223),
    (-1792, -8, 17476),
    (-341, -4, 31454),
    (-1144, -4, 29708),
];

/// Sample ranges that share one set of interpolated coefficients
const SEGMENTS: [(usize, usize); 4] = [(0, 13), (13, 27), (27, 40), (40, FRAME_SAMPLES)];

/// Filter memory carried from frame to frame.
#[derive(Debug, Clone, Default)]
pub(super) struct ShortTermFilter {
    larpp: [[i16; 8]; 2],
    current: usize,
    u: [i16; 8],
    v: [i16; 9],
}

impl ShortTermFilter {
    /// Residual of `s` through the analysis lattice, in place
    pub(super) fn analyse(&mut self, larc: &[i16; 8], s: &mut [i16; FRAME_SAMPLES]) {
        let (previous, current) = self.advance(larc);

        for (segment, &(start, end)) in SEGMENTS.iter().enumerate() {
            let rp = interpolate(&previous, &current, segment);
            for sample in &mut s[start..end] {
                let mut di = *sample;
                let mut sav = di;
                for (u, &rpi) in self.u.iter_mut().zip(&rp) {
                    let ui = *u;
                    *u = sav;
                    sav = add(ui, mult_r(rpi, di));
                    di = add(di, mult_r(rpi, ui));
                }
                *sample = di;
            }
        }
    }

    /// Speech from the reconstructed residual `wt`
    pub(super) fn synthesise(
        &mut self,
        larc: &[i16; 8],
        wt: &[i16; FRAME_SAMPLES],
        sr: &mut [i16; FRAME_SAMPLES],
    ) {
        let (previous, current) = self.advance(larc);

        for (segment, &(start, end)) in SEGMENTS.iter().enumerate() {
            let rrp = interpolate(&previous, &current, segment);
            for k in start..end {
                let mut sri = wt[k];
                for i in (0..8).rev() {
                    sri = sub(sri, mult_r(rrp[i], self.v[i]));
                    self.v[i + 1] = add(self.v[i], mult_r(rrp[i], sri));
                }
                self.v[0] = sri;
                sr[k] = sri;
            }
        }
    }

    /// Decode this frame's ratios, returns them with the previous frame's
    fn advance(&mut self, larc: &[i16; 8]) -> ([i16; 8], [i16; 8]) {
        let slot = self.current;
        self.current ^= 1;
        self.larpp[slot] = decode_lar(larc);
        (self.larpp[self.current], self.larpp[slot])
    }
}

fn decode_lar(larc: &[i16; 8]) -> [i16; 8] {
    let mut larpp = [0i16; 8];
    for ((out, &code), &(b, mic, inva)) in larpp.iter_mut().zip(larc).zip(&DECODE) {
        let temp = add(code, mic) << 10;
        let temp = mult_r(inva, sub(temp, b << 1));
        *out = add(temp, temp);
    }
    larpp
}

fn interpolate(previous: &[i16; 8], current: &[i16; 8], segment: usize) -> [i16; 8] {
    let mut larp = [0i16; 8];
    for ((out, &a), &b) in larp.iter_mut().zip(previous).zip(current) {
        *out = match segment {
            0 => add(add(a >> 2, b >> 2), a >> 1),
            1 => add(a >> 1, b >> 1),
            2 => add(add(a >> 2, b >> 2), b >> 1),
            _ => b,
        };
    }
    to_reflection_coefficients(&mut larp);
    larp
}

fn to_reflection_coefficients(larp: &mut [i16; 8]) {
    for x in larp.iter_mut() {
        let temp = abs(*x);
        let rp = if temp < 11059 {
            temp << 1
        } else if temp < 20070 {
            temp + 11059
        } else {
            add(temp >> 2, 26112)
        };
        *x = if *x < 0 { -rp } else { rp };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_coefficients_pass_signal_through() {
        // Codes of a silent frame decode to ratios near zero
        let larc = [32, 32, 20, 11, 8, 5, 3, 2];
        let lar = decode_lar(&larc);
        assert!(lar.iter().all(|&x| x.abs() < 2000), "{lar:?}");

        let mut analysis = ShortTermFilter::default();
        let mut synthesis = ShortTermFilter::default();
        let mut s = [0i16; FRAME_SAMPLES];
        s[0] = 1000;
        let input = s;

        analysis.analyse(&larc, &mut s);
        let mut out = [0i16; FRAME_SAMPLES];
        synthesis.synthesise(&larc, &s, &mut out);

        for (a, b) in input.iter().zip(&out) {
            assert!((a - b).abs() <= 8, "{a} vs {b}");
        }
    }

    #[test]
    fn interpolation_ends_on_current_ratios() {
        let previous = [0i16; 8];
        let current = [4000i16; 8];
        assert_eq!(interpolate(&previous, &current, 3), [8000; 8]);
        assert_eq!(interpolate(&previous, &current, 1), [4000; 8]);
    }
}
