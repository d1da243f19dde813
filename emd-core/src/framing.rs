//! Payload framing: bytes ⇄ base-(2n+1) digit stream.
//!
//! Frame layout, most-significant digit first:
//!
//! ```text
//! [H digits]         payload length in bytes (u32, big-endian) in base b
//! [D(32) digits]*    each full 32-byte block of the payload
//! [D(r) digits]      the trailing r-byte block, if r > 0
//! ```
//!
//! `D(k)` is the number of base-b digits of `256^k - 1`, so every block of
//! `k` bytes converts to exactly `D(k)` digits. `H = D(4)`. Conversion uses an
//! arbitrary-precision digit + carry accumulator; blocks keep the cost linear
//! in payload size.

use tracing::trace;

use crate::error::{EmdError, FramingError, Result};
use crate::group::{Digit, EmdParams};

/// Bytes per independently converted block.
pub const BLOCK_BYTES: usize = 32;

/// Width of the length header before conversion.
pub const HEADER_BYTES: usize = 4;

/// Largest payload the header can describe.
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;

/// Minimal little-endian base-`base` representation of a big-endian byte string.
fn radix_convert(bytes: &[u8], base: u32) -> Vec<Digit> {
    let base = u64::from(base);
    let mut acc: Vec<Digit> = Vec::new();
    for &byte in bytes {
        let mut carry = u64::from(byte);
        for digit in acc.iter_mut() {
            let v = u64::from(*digit) * 256 + carry;
            *digit = (v % base) as Digit;
            carry = v / base;
        }
        while carry > 0 {
            acc.push((carry % base) as Digit);
            carry /= base;
        }
    }
    acc
}

/// Convert `bytes` to exactly `width` digits, most significant first.
fn bytes_to_digits(bytes: &[u8], base: u32, width: usize) -> Vec<Digit> {
    let mut digits = radix_convert(bytes, base);
    debug_assert!(digits.len() <= width);
    digits.resize(width, 0);
    digits.reverse();
    digits
}

/// Convert most-significant-first digits back to exactly `width` bytes.
///
/// Returns `None` if a digit is out of range or the value needs more than
/// `width` bytes.
fn digits_to_bytes(digits: &[Digit], base: u32, width: usize) -> Option<Vec<u8>> {
    let wide_base = u64::from(base);
    let mut limbs: Vec<u8> = Vec::with_capacity(width + 1);
    for &d in digits {
        if d >= base {
            return None;
        }
        let mut carry = u64::from(d);
        for limb in limbs.iter_mut() {
            let v = u64::from(*limb) * wide_base + carry;
            *limb = (v & 0xFF) as u8;
            carry = v >> 8;
        }
        while carry > 0 {
            limbs.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
        if limbs.len() > width {
            return None;
        }
    }
    limbs.resize(width, 0);
    limbs.reverse();
    Some(limbs)
}

/// Number of base-`base` digits needed for any `len`-byte value.
pub fn digit_count(len: usize, base: u32) -> usize {
    radix_convert(&vec![0xFF; len], base).len()
}

/// Digit budget of the frame format for one group size.
#[derive(Debug, Clone)]
pub struct FrameLayout {
    params: EmdParams,
    header_digits: usize,
    /// `block_digits[k]` = D(k) for k in 0..=BLOCK_BYTES.
    block_digits: [usize; BLOCK_BYTES + 1],
}

impl FrameLayout {
    pub fn new(params: EmdParams) -> Self {
        let base = params.base();
        let mut block_digits = [0usize; BLOCK_BYTES + 1];
        for (k, slot) in block_digits.iter_mut().enumerate() {
            *slot = digit_count(k, base);
        }
        Self {
            params,
            header_digits: block_digits[HEADER_BYTES],
            block_digits,
        }
    }

    pub fn params(&self) -> &EmdParams {
        &self.params
    }

    /// Digits occupied by the length header.
    pub fn header_digits(&self) -> usize {
        self.header_digits
    }

    /// Digits occupied by a payload of `len` bytes (header excluded).
    pub fn payload_digits(&self, len: usize) -> usize {
        (len / BLOCK_BYTES) * self.block_digits[BLOCK_BYTES] + self.block_digits[len % BLOCK_BYTES]
    }

    /// Digits occupied by the whole frame for a payload of `len` bytes.
    pub fn frame_digits(&self, len: usize) -> usize {
        self.header_digits + self.payload_digits(len)
    }

    /// Largest payload whose frame fits in `available` digits.
    pub fn max_payload(&self, available: usize) -> usize {
        let Some(room) = available.checked_sub(self.header_digits) else {
            return 0;
        };
        let full_block = self.block_digits[BLOCK_BYTES];
        let blocks = room / full_block;
        let rest = room % full_block;
        // D(k) is non-decreasing in k
        let tail = self.block_digits[..BLOCK_BYTES]
            .iter()
            .rposition(|&d| d <= rest)
            .unwrap_or(0);
        (blocks * BLOCK_BYTES + tail).min(MAX_PAYLOAD_LEN)
    }

    /// Serialize `payload` into its digit stream.
    pub fn frame(&self, payload: &[u8]) -> Result<Vec<Digit>> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            EmdError::InvalidParameter(format!(
                "payload of {} bytes exceeds the {MAX_PAYLOAD_LEN}-byte header limit",
                payload.len()
            ))
        })?;
        let base = self.params.base();

        let mut digits = Vec::with_capacity(self.frame_digits(payload.len()));
        digits.extend(bytes_to_digits(
            &len.to_be_bytes(),
            base,
            self.header_digits,
        ));
        for block in payload.chunks(BLOCK_BYTES) {
            digits.extend(bytes_to_digits(
                block,
                base,
                self.block_digits[block.len()],
            ));
        }

        trace!(
            n = self.params.n(),
            bytes = payload.len(),
            digits = digits.len(),
            "Framed payload"
        );
        Ok(digits)
    }

    /// Decode the length header at the start of `digits`.
    pub fn read_header(&self, digits: &[Digit]) -> Result<usize> {
        let header = digits
            .get(..self.header_digits)
            .ok_or(FramingError::Truncated {
                needed: self.header_digits,
                available: digits.len(),
            })?;
        let bytes = digits_to_bytes(header, self.params.base(), HEADER_BYTES)
            .ok_or(FramingError::DigitOverflow { offset: 0 })?;
        let mut be = [0u8; HEADER_BYTES];
        be.copy_from_slice(&bytes);
        Ok(u32::from_be_bytes(be) as usize)
    }

    /// Decode `len` payload bytes from `digits`, which start right after the header.
    pub fn decode_payload(&self, digits: &[Digit], len: usize) -> Result<Vec<u8>> {
        let needed = self.payload_digits(len);
        if digits.len() < needed {
            return Err(FramingError::Truncated {
                needed: self.header_digits + needed,
                available: self.header_digits + digits.len(),
            }
            .into());
        }

        let base = self.params.base();
        let mut payload = Vec::with_capacity(len);
        let mut offset = 0;
        let mut remaining = len;
        while remaining > 0 {
            let block_len = remaining.min(BLOCK_BYTES);
            let width = self.block_digits[block_len];
            let block = digits_to_bytes(&digits[offset..offset + width], base, block_len).ok_or(
                FramingError::DigitOverflow {
                    offset: self.header_digits + offset,
                },
            )?;
            payload.extend_from_slice(&block);
            offset += width;
            remaining -= block_len;
        }
        Ok(payload)
    }

    /// Inverse of [`FrameLayout::frame`].
    ///
    /// Fails with `Truncated` if the stream is shorter than the header, and
    /// with `InconsistentLength` if the declared length cannot fit in the
    /// stream.
    pub fn unframe(&self, digits: &[Digit]) -> Result<Vec<u8>> {
        let declared = self.read_header(digits)?;
        let limit = self.max_payload(digits.len());
        if declared > limit {
            return Err(FramingError::InconsistentLength { declared, limit }.into());
        }
        self.decode_payload(&digits[self.header_digits..], declared)
    }
}

/// Serialize `payload` for group size `n`.
pub fn frame(payload: &[u8], n: usize) -> Result<Vec<Digit>> {
    FrameLayout::new(EmdParams::new(n)?).frame(payload)
}

/// Recover the payload from a digit stream produced with group size `n`.
pub fn unframe(digits: &[Digit], n: usize) -> Result<Vec<u8>> {
    FrameLayout::new(EmdParams::new(n)?).unframe(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(n: usize) -> FrameLayout {
        FrameLayout::new(EmdParams::new(n).unwrap())
    }

    #[test]
    fn test_digit_count_known_values() {
        // 255 = 2010 in base 5
        assert_eq!(digit_count(1, 5), 4);
        assert_eq!(digit_count(0, 5), 0);
        // 5^13 < 2^32 - 1 < 5^14
        assert_eq!(digit_count(4, 5), 14);
        // 23^7 < 2^32 - 1 < 23^8
        assert_eq!(digit_count(4, 23), 8);
        // 11^9 < 2^32 - 1 < 11^10
        assert_eq!(digit_count(4, 11), 10);
        // ceil(256 / log2(5)) = 111
        assert_eq!(digit_count(32, 5), 111);
    }

    #[test]
    fn test_radix_conversion_is_big_endian() {
        assert_eq!(bytes_to_digits(&[0x00, 0x07], 5, 3), vec![0, 1, 2]);
        assert_eq!(digits_to_bytes(&[0, 1, 2], 5, 2), Some(vec![0x00, 0x07]));
        assert_eq!(digits_to_bytes(&[4, 4, 4, 4], 5, 1), None);
        assert_eq!(digits_to_bytes(&[5], 5, 1), None);
    }

    #[test]
    fn test_frame_unframe_various_sizes() {
        for n in [2, 3, 7, 11, 20, 127, 300] {
            let layout = layout(n);
            for len in [1usize, 5, 31, 32, 33, 64, 100] {
                let payload: Vec<u8> = (0..len).map(|i| (i * 73 + 11) as u8).collect();
                let digits = layout.frame(&payload).unwrap();
                assert_eq!(digits.len(), layout.frame_digits(len));
                assert!(digits.iter().all(|&d| d < layout.params().base()));
                assert_eq!(layout.unframe(&digits).unwrap(), payload, "n={n} len={len}");
            }
        }
    }

    #[test]
    fn test_unframe_ignores_trailing_digits() {
        let layout = layout(4);
        let mut digits = layout.frame(b"HELLO").unwrap();
        digits.extend(std::iter::repeat(3).take(50));
        assert_eq!(layout.unframe(&digits).unwrap(), b"HELLO");
    }

    #[test]
    fn test_unframe_truncated_header() {
        let layout = layout(2);
        let err = layout.unframe(&[0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            EmdError::Framing(FramingError::Truncated {
                needed: 14,
                available: 3
            })
        );
    }

    #[test]
    fn test_unframe_declared_length_exceeds_stream() {
        let layout = layout(3);
        let digits = layout.frame(&[0xAB; 40]).unwrap();
        let cut = &digits[..digits.len() - 1];
        assert!(matches!(
            layout.unframe(cut),
            Err(EmdError::Framing(FramingError::InconsistentLength { declared: 40, .. }))
        ));
    }

    #[test]
    fn test_unframe_header_overflow() {
        let layout = layout(2);
        let digits = vec![4; 20];
        assert_eq!(
            layout.unframe(&digits),
            Err(EmdError::Framing(FramingError::DigitOverflow { offset: 0 }))
        );
    }

    #[test]
    fn test_max_payload_is_tight() {
        for n in [2, 5, 11, 19] {
            let layout = layout(n);
            for available in [0usize, 5, 14, 40, 111, 500, 5000] {
                let max = layout.max_payload(available);
                if max > 0 {
                    assert!(layout.frame_digits(max) <= available);
                }
                if available >= layout.header_digits() {
                    assert!(layout.frame_digits(max + 1) > available);
                }
            }
        }
    }

    #[test]
    fn test_free_functions_validate_n() {
        assert!(matches!(frame(b"x", 1), Err(EmdError::InvalidParameter(_))));
        let digits = frame(b"xyz", 6).unwrap();
        assert_eq!(unframe(&digits, 6).unwrap(), b"xyz");
    }
}
