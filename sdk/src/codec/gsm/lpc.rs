//! Linear prediction analysis: 8 quantised log area ratios per frame.

use super::math::{abs, add, div, mult, mult_r, norm};
use super::FRAME_SAMPLES;

/// (A, B, MAC, MIC) per coefficient
const QUANT: [(i16, i16, i16, i16); 8] = [
    (20480, 0, 31, -32),
    (20480, 0, 31, -32),
    (20480, 2048, 15, -16),
    (20480, -2560, 15, -16),
    (13964, 94, 7, -8),
    (15360, -1792, 7, -8),
    (8534, -341, 3, -4),
    (9036, -1144, 3, -4),
];

/// Analyse one preprocessed frame. `s` is rescaled in place and stays
/// equal to the input apart from rounding.
pub(super) fn analysis(s: &mut [i16; FRAME_SAMPLES]) -> [i16; 8] {
    let acf = autocorrelation(s);
    let mut lar = reflection_coefficients(&acf);
    to_log_area_ratios(&mut lar);
    quantize(&mut lar);
    lar
}

fn autocorrelation(s: &mut [i16; FRAME_SAMPLES]) -> [i32; 9] {
    let smax = s.iter().map(|&x| abs(x)).max().unwrap_or(0);
    let scalauto = if smax == 0 {
        0
    } else {
        4 - norm(i32::from(smax) << 16)
    };

    if scalauto > 0 {
        let factor = 16384 >> (scalauto - 1);
        for x in s.iter_mut() {
            *x = mult_r(*x, factor);
        }
    }

    let mut acf = [0i32; 9];
    for (k, value) in acf.iter_mut().enumerate() {
        let mut sum = 0i32;
        for i in k..FRAME_SAMPLES {
            sum = sum.wrapping_add(i32::from(s[i]) * i32::from(s[i - k]));
        }
        *value = sum << 1;
    }

    if scalauto > 0 {
        for x in s.iter_mut() {
            *x <<= scalauto;
        }
    }
    acf
}

/// Schur recursion
#[allow(clippy::cast_possible_truncation)]
fn reflection_coefficients(l_acf: &[i32; 9]) -> [i16; 8] {
    let mut r = [0i16; 8];
    if l_acf[0] == 0 {
        return r;
    }

    let shift = norm(l_acf[0]);
    let mut acf = [0i16; 9];
    for (a, &l) in acf.iter_mut().zip(l_acf) {
        *a = ((l << shift) >> 16) as i16;
    }

    let mut p = acf;
    let mut k = [0i16; 9];
    k[1..8].copy_from_slice(&acf[1..8]);

    for n in 1..=8 {
        let temp = abs(p[1]);
        if p[0] < temp {
            return r;
        }

        let mut rn = div(temp, p[0]);
        if p[1] > 0 {
            rn = -rn;
        }
        r[n - 1] = rn;
        if n == 8 {
            break;
        }

        p[0] = add(p[0], mult_r(p[1], rn));
        for m in 1..=8 - n {
            p[m] = add(p[m + 1], mult_r(k[m], rn));
            k[m] = add(k[m], mult_r(p[m + 1], rn));
        }
    }
    r
}

fn to_log_area_ratios(r: &mut [i16; 8]) {
    for x in r.iter_mut() {
        let mut temp = abs(*x);
        if temp < 22118 {
            temp >>= 1;
        } else if temp < 31130 {
            temp -= 11059;
        } else {
            temp = (temp - 26112) << 2;
        }
        *x = if *x < 0 { -temp } else { temp };
    }
}

fn quantize(lar: &mut [i16; 8]) {
    for (x, &(a, b, mac, mic)) in lar.iter_mut().zip(&QUANT) {
        let temp = add(add(mult(a, *x), b), 256) >> 9;
        *x = if temp > mac {
            mac - mic
        } else if temp < mic {
            0
        } else {
            temp - mic
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_gives_mid_range_codes() {
        let mut s = [0i16; FRAME_SAMPLES];
        // Zero ratios land on the offset B of each quantiser
        assert_eq!(analysis(&mut s), [32, 32, 20, 11, 8, 5, 3, 2]);
    }

    #[test]
    fn smooth_signal_has_strong_first_reflection() {
        let mut s = [0i16; FRAME_SAMPLES];
        for (i, x) in s.iter_mut().enumerate() {
            *x = if (i / 20) % 2 == 0 { 4000 } else { -4000 };
        }
        let before = s;
        let acf = autocorrelation(&mut s);
        assert_eq!(s, before);
        assert!(acf[0] > acf[1] && acf[1] > 0);

        let r = reflection_coefficients(&acf);
        assert!(r[0] < -20000);
    }
}
