//! Saturating fixed-point primitives of the 06.10 reference arithmetic.

pub(super) const MIN_WORD: i16 = i16::MIN;
pub(super) const MAX_WORD: i16 = i16::MAX;

pub(super) fn add(a: i16, b: i16) -> i16 {
    a.saturating_add(b)
}

pub(super) fn sub(a: i16, b: i16) -> i16 {
    a.saturating_sub(b)
}

pub(super) fn l_add(a: i32, b: i32) -> i32 {
    a.saturating_add(b)
}

/// Q15 product, truncated
#[allow(clippy::cast_possible_truncation)]
pub(super) fn mult(a: i16, b: i16) -> i16 {
    if a == MIN_WORD && b == MIN_WORD {
        MAX_WORD
    } else {
        ((i32::from(a) * i32::from(b)) >> 15) as i16
    }
}

/// Q15 product, rounded
#[allow(clippy::cast_possible_truncation)]
pub(super) fn mult_r(a: i16, b: i16) -> i16 {
    if a == MIN_WORD && b == MIN_WORD {
        MAX_WORD
    } else {
        ((i32::from(a) * i32::from(b) + 16384) >> 15) as i16
    }
}

pub(super) fn abs(a: i16) -> i16 {
    if a == MIN_WORD {
        MAX_WORD
    } else {
        a.abs()
    }
}

/// Left shifts needed to normalise `a`, 31 for zero
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(super) fn norm(a: i32) -> i16 {
    let a = if a < 0 {
        if a <= -1_073_741_824 {
            return 0;
        }
        !a
    } else {
        a
    };
    a.leading_zeros() as i16 - 1
}

/// Fractional division, requires `0 <= num <= denum`
pub(super) fn div(num: i16, denum: i16) -> i16 {
    if num == 0 {
        return 0;
    }

    let mut l_num = i32::from(num);
    let l_denum = i32::from(denum);
    let mut div = 0i16;
    for _ in 0..15 {
        div <<= 1;
        l_num <<= 1;
        if l_num >= l_denum {
            l_num -= l_denum;
            div += 1;
        }
    }
    div
}

/// Arithmetic shift right, negative counts shift left
#[allow(clippy::cast_possible_truncation)]
pub(super) fn asr(a: i16, n: i16) -> i16 {
    if n >= 16 {
        if a < 0 {
            -1
        } else {
            0
        }
    } else if n <= -16 {
        0
    } else if n < 0 {
        (i32::from(a) << -n) as i16
    } else {
        a >> n
    }
}

/// Arithmetic shift left, negative counts shift right
#[allow(clippy::cast_possible_truncation)]
pub(super) fn asl(a: i16, n: i16) -> i16 {
    if n >= 16 {
        0
    } else if n <= -16 {
        if a < 0 {
            -1
        } else {
            0
        }
    } else if n < 0 {
        asr(a, -n)
    } else {
        (i32::from(a) << n) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation() {
        assert_eq!(add(MAX_WORD, 1), MAX_WORD);
        assert_eq!(sub(MIN_WORD, 1), MIN_WORD);
        assert_eq!(abs(MIN_WORD), MAX_WORD);
        assert_eq!(mult_r(MIN_WORD, MIN_WORD), MAX_WORD);
        assert_eq!(mult_r(16384, 16384), 8192);
        assert_eq!(mult(-16384, 16384), -8192);
    }

    #[test]
    fn norm_counts_redundant_sign_bits() {
        assert_eq!(norm(0x4000_0000), 0);
        assert_eq!(norm(1), 30);
        assert_eq!(norm(-1), 31);
        assert_eq!(norm(-0x4000_0000), 0);
        assert_eq!(norm(0x7FFF << 16), 0);
        assert_eq!(norm(0x0100 << 16), 6);
    }

    #[test]
    fn div_is_a_q15_fraction() {
        assert_eq!(div(1, 2), 16384);
        assert_eq!(div(3, 4), 24576);
        assert_eq!(div(0, 7), 0);
        assert_eq!(div(5, 5), 32767);
    }

    #[test]
    fn shifts_accept_negative_counts() {
        assert_eq!(asr(-8, 2), -2);
        assert_eq!(asr(1, -3), 8);
        assert_eq!(asr(-5, 20), -1);
        assert_eq!(asl(1, 9), 512);
        assert_eq!(asl(1, -1), 0);
        assert_eq!(asl(3, 16), 0);
    }
}
