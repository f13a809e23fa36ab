//! Long-term (pitch) prediction over 40-sample sub-frames.
//!
//! History buffers hold 120 past reconstructed samples ahead of the current
//! sub-frame, addressed as `history[base + k - lag]`.

use super::math::{abs, mult, mult_r, norm};
use super::SUBFRAME_SAMPLES;

/// Shortest and longest pitch lag
pub(super) const MIN_LAG: usize = 40;
pub(super) const MAX_LAG: usize = 120;

/// Decision levels for the gain code
const DLB: [i16; 4] = [6554, 16384, 26214, 32767];

/// Quantised gains
pub(super) const QLB: [i16; 4] = [3277, 11469, 21299, 32767];

/// Pick the lag and gain code that best predict `d` from the history
#[allow(clippy::cast_possible_truncation)]
pub(super) fn parameters(d: &[i16], history: &[i16], base: usize) -> (usize, usize) {
    let dmax = d.iter().map(|&x| abs(x)).max().unwrap_or(0);
    let temp = if dmax == 0 {
        0
    } else {
        norm(i32::from(dmax) << 16)
    };
    let scal = if temp > 6 { 0 } else { 6 - temp };

    let mut wt = [0i16; SUBFRAME_SAMPLES];
    for (w, &x) in wt.iter_mut().zip(d) {
        *w = x >> scal;
    }

    let mut l_max = 0i32;
    let mut nc = MIN_LAG;
    for lag in MIN_LAG..=MAX_LAG {
        let past = &history[base - lag..base - lag + SUBFRAME_SAMPLES];
        let l_result = wt
            .iter()
            .zip(past)
            .fold(0i32, |acc, (&w, &p)| acc.wrapping_add(i32::from(w) * i32::from(p)));
        if l_result > l_max {
            nc = lag;
            l_max = l_result;
        }
    }
    l_max <<= 1;
    l_max >>= 6 - scal;

    let l_power = history[base - nc..base - nc + SUBFRAME_SAMPLES]
        .iter()
        .fold(0i32, |acc, &p| {
            let p = i32::from(p >> 3);
            acc.wrapping_add(p * p)
        })
        << 1;

    if l_max <= 0 {
        return (nc, 0);
    }
    if l_max >= l_power {
        return (nc, 3);
    }

    let shift = norm(l_power);
    let r = ((l_max << shift) >> 16) as i16;
    let s = ((l_power << shift) >> 16) as i16;
    let bc = (0..3).find(|&bc| r <= mult(s, DLB[bc])).unwrap_or(3);
    (nc, bc)
}
