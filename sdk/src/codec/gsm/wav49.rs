//! WAV49 bit layout: fields packed least significant bit first, 260 bits per
//! frame, two frames sharing the middle byte of a 65-byte unit.

use super::rpe::PULSES;
use super::Frame;

/// Width of each log area ratio code
const LAR_BITS: [u32; 8] = [6, 6, 5, 5, 4, 4, 3, 3];

struct BitWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl BitWriter<'_> {
    fn put(&mut self, value: i16, bits: u32) {
        for i in 0..bits {
            if (value >> i) & 1 == 1 {
                self.buf[self.pos / 8] |= 1 << (self.pos % 8);
            }
            self.pos += 1;
        }
    }
}

struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl BitReader<'_> {
    fn get(&mut self, bits: u32) -> i16 {
        let mut value = 0i16;
        for i in 0..bits {
            if (self.buf[self.pos / 8] >> (self.pos % 8)) & 1 == 1 {
                value |= 1 << i;
            }
            self.pos += 1;
        }
        value
    }
}

/// OR one frame into `buf` starting at bit `offset`
pub(super) fn pack(frame: &Frame, buf: &mut [u8], offset: usize) {
    let mut writer = BitWriter { buf, pos: offset };

    for (&lar, &bits) in frame.larc.iter().zip(&LAR_BITS) {
        writer.put(lar, bits);
    }
    for sub in &frame.subframes {
        writer.put(sub.nc, 7);
        writer.put(sub.bc, 2);
        writer.put(sub.excitation.mc, 2);
        writer.put(sub.excitation.xmaxc, 6);
        for &xmc in &sub.excitation.xmc {
            writer.put(xmc, 3);
        }
    }
}

/// Read one frame from `buf` starting at bit `offset`
pub(super) fn unpack(buf: &[u8], offset: usize) -> Frame {
    let mut reader = BitReader { buf, pos: offset };
    let mut frame = Frame::default();

    for (lar, &bits) in frame.larc.iter_mut().zip(&LAR_BITS) {
        *lar = reader.get(bits);
    }
    for sub in &mut frame.subframes {
        sub.nc = reader.get(7);
        sub.bc = reader.get(2);
        sub.excitation.mc = reader.get(2);
        sub.excitation.xmaxc = reader.get(6);
        for xmc in &mut sub.excitation.xmc[..PULSES] {
            *xmc = reader.get(3);
        }
    }
    frame
}
