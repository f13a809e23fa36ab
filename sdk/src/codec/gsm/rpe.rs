//! Regular pulse excitation: 13 pulses per sub-frame on one of four grids.

use super::math::{abs, add, asl, asr, mult, mult_r, sub};
use super::SUBFRAME_SAMPLES;

/// Pulses per sub-frame
pub(super) const PULSES: usize = 13;

/// Weighting filter taps
const H: [i32; 11] = [-134, -374, 0, 2054, 5741, 8192, 5741, 2054, 0, -374, -134];

/// Normalised inverse mantissas
const NRFAC: [i16; 8] = [29128, 26215, 23832, 21846, 20165, 18725, 17476, 16384];

/// Normalised direct mantissas
const FAC: [i16; 8] = [18431, 20479, 22527, 24575, 26623, 28671, 30719, 32767];

/// Coded excitation of one sub-frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct Excitation {
    pub(super) xmaxc: i16,
    pub(super) mc: i16,
    pub(super) xmc: [i16; PULSES],
}

/// Code the residual `e`, which sits at `e[5..45]` between zero guards.
/// The residual is replaced by what a decoder will reconstruct from the code.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(super) fn encode(e: &mut [i16; SUBFRAME_SAMPLES + 10]) -> Excitation {
    let x = weighting_filter(e);
    let (xm, mc) = grid_selection(&x);
    let (xmc, xmaxc, exp, mant) = quantize(&xm);
    let xmp = dequantize(&xmc, exp, mant);
    position(mc, &xmp, &mut e[5..5 + SUBFRAME_SAMPLES]);

    Excitation {
        xmaxc,
        mc: mc as i16,
        xmc,
    }
}

/// Reconstructed residual of one sub-frame
#[allow(clippy::cast_sign_loss)]
pub(super) fn decode(excitation: &Excitation) -> [i16; SUBFRAME_SAMPLES] {
    let (exp, mant) = exp_mant(excitation.xmaxc);
    let xmp = dequantize(&excitation.xmc, exp, mant);
    let mut erp = [0i16; SUBFRAME_SAMPLES];
    position((excitation.mc & 3) as usize, &xmp, &mut erp);
    erp
}

#[allow(clippy::cast_possible_truncation)]
fn weighting_filter(e: &[i16; SUBFRAME_SAMPLES + 10]) -> [i16; SUBFRAME_SAMPLES] {
    let mut x = [0i16; SUBFRAME_SAMPLES];
    for (k, out) in x.iter_mut().enumerate() {
        let l = e[k..k + H.len()]
            .iter()
            .zip(&H)
            .fold(4096i32, |acc, (&v, &h)| acc + i32::from(v) * h);
        *out = (l >> 13).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
    }
    x
}

fn grid_selection(x: &[i16; SUBFRAME_SAMPLES]) -> ([i16; PULSES], usize) {
    let mut best = 0i32;
    let mut mc = 0;
    for m in 0..4 {
        let energy = (0..PULSES).fold(0i32, |acc, i| {
            let v = i32::from(x[m + 3 * i] >> 2);
            acc + v * v
        }) << 1;
        if m == 0 || energy > best {
            mc = m;
            best = energy;
        }
    }

    let mut xm = [0i16; PULSES];
    for (i, v) in xm.iter_mut().enumerate() {
        *v = x[mc + 3 * i];
    }
    (xm, mc)
}

/// Adaptive PCM: returns the pulse codes, the block maximum code and its
/// exponent and mantissa
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(xm: &[i16; PULSES]) -> ([i16; PULSES], i16, i16, i16) {
    let xmax = xm.iter().map(|&v| abs(v)).max().unwrap_or(0);

    let mut exp = 0i16;
    let mut temp = xmax >> 9;
    let mut itest = false;
    for _ in 0..6 {
        itest |= temp <= 0;
        temp >>= 1;
        if !itest {
            exp += 1;
        }
    }

    let xmaxc = add(xmax >> (exp + 5), exp << 3);
    let (exp, mant) = exp_mant(xmaxc);

    let shift = 6 - exp;
    let factor = NRFAC[mant as usize];
    let mut xmc = [0i16; PULSES];
    for (c, &v) in xmc.iter_mut().zip(xm) {
        let scaled = (i32::from(v) << shift) as i16;
        *c = (mult(scaled, factor) >> 12) + 4;
    }
    (xmc, xmaxc, exp, mant)
}

fn exp_mant(xmaxc: i16) -> (i16, i16) {
    let mut exp = if xmaxc > 15 { (xmaxc >> 3) - 1 } else { 0 };
    let mut mant = xmaxc - (exp << 3);

    if mant == 0 {
        return (-4, 7);
    }
    while mant <= 7 {
        mant = (mant << 1) | 1;
        exp -= 1;
    }
    (exp, mant - 8)
}

#[allow(clippy::cast_sign_loss)]
fn dequantize(xmc: &[i16; PULSES], exp: i16, mant: i16) -> [i16; PULSES] {
    let factor = FAC[mant as usize];
    let shift = sub(6, exp);
    let rounding = asl(1, sub(shift, 1));

    xmc.map(|code| {
        let temp = ((code << 1) - 7) << 12;
        asr(add(mult_r(factor, temp), rounding), shift)
    })
}

fn position(mc: usize, xmp: &[i16; PULSES], ep: &mut [i16]) {
    ep.fill(0);
    for (i, &v) in xmp.iter().enumerate() {
        ep[mc + 3 * i] = v;
    }
}
