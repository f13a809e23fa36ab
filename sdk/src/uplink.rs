//! Fixed-capacity accumulator for outgoing PCM.

use frn_protocol::BUFFER_SIZE;

/// Convert a float sample to 16-bit PCM with hard clipping.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_pcm(sample: f32) -> i16 {
    if sample >= 1.0 {
        i16::MAX
    } else if sample <= -1.0 {
        -i16::MAX
    } else {
        (32767.0 * sample) as i16
    }
}

/// Holds exactly one uplink packet worth of samples.
///
/// The fill count never exceeds capacity; once full the buffer refuses more
/// samples until it is taken or cleared.
pub struct UplinkBuffer {
    samples: Box<[i16; BUFFER_SIZE]>,
    len: usize,
}

impl Default for UplinkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl UplinkBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: Box::new([0; BUFFER_SIZE]),
            len: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == BUFFER_SIZE
    }

    /// Append as many samples as fit, returns how many were consumed.
    pub fn push(&mut self, samples: &[f32]) -> usize {
        let count = samples.len().min(BUFFER_SIZE - self.len);
        for (dst, &src) in self.samples[self.len..self.len + count]
            .iter_mut()
            .zip(samples)
        {
            *dst = to_pcm(src);
        }
        self.len += count;
        count
    }

    /// Zero the unused tail and mark the buffer full.
    pub fn pad(&mut self) {
        self.samples[self.len..].fill(0);
        self.len = BUFFER_SIZE;
    }

    /// The full buffer contents, valid once `is_full()`.
    #[must_use]
    pub fn as_slice(&self) -> &[i16] {
        &self.samples[..]
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}
