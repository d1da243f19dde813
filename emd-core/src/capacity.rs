//! Embedding capacity for an image size and group size.

use serde::Serialize;

use crate::error::{EmdError, Result};
use crate::framing::FrameLayout;
use crate::group::EmdParams;

/// Capacity of a `width × height` grayscale image for one group size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Capacity {
    pub n: usize,
    pub base: u32,
    pub pixels: usize,
    /// `floor(pixels / n)`: one digit per group.
    pub max_digits: usize,
    /// Digits reserved for the length header.
    pub header_digits: usize,
    /// Information bound `floor(max_digits · log2(2n + 1))`, header included.
    pub max_bits: u64,
    /// Largest payload, in bytes, whose complete frame fits.
    pub max_bytes: usize,
}

impl Capacity {
    /// Whether a payload of `len` bytes fits.
    pub fn fits(&self, len: usize) -> bool {
        len <= self.max_bytes
    }
}

/// Compute the capacity of a `width × height` image with group size `n`.
pub fn capacity(width: u32, height: u32, n: usize) -> Result<Capacity> {
    if width == 0 || height == 0 {
        return Err(EmdError::InvalidParameter(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    let params = EmdParams::new(n)?;
    Ok(capacity_for(width as usize * height as usize, &FrameLayout::new(params)))
}

pub(crate) fn capacity_for(pixels: usize, layout: &FrameLayout) -> Capacity {
    let params = layout.params();
    let max_digits = pixels / params.n();
    Capacity {
        n: params.n(),
        base: params.base(),
        pixels,
        max_digits,
        header_digits: layout.header_digits(),
        max_bits: (max_digits as f64 * params.bits_per_digit()).floor() as u64,
        max_bytes: layout.max_payload(max_digits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rejects_invalid_arguments() {
        assert!(matches!(
            capacity(0, 10, 2),
            Err(EmdError::InvalidParameter(_))
        ));
        assert!(matches!(
            capacity(10, 10, 1),
            Err(EmdError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_capacity_small_image_is_header_only() {
        // 16 pixels, n = 5 -> 3 digits, header alone needs 10
        let cap = capacity(4, 4, 5).unwrap();
        assert_eq!(cap.max_digits, 3);
        assert_eq!(cap.header_digits, 10);
        assert_eq!(cap.max_bytes, 0);
        assert!(!cap.fits(1));
    }

    #[test]
    fn test_capacity_net_of_header() {
        let cap = capacity(64, 64, 11).unwrap();
        assert_eq!(cap.max_digits, 4096 / 11);
        assert_eq!(cap.base, 23);
        assert!(cap.max_bytes > 0);
        // Net bytes never exceed the raw information bound minus the header.
        let header_bits = (cap.header_digits as f64 * 23f64.log2()) as u64;
        assert!((cap.max_bytes as u64) * 8 <= cap.max_bits - header_bits);
    }

    #[test]
    fn test_max_bits_matches_formula() {
        let cap = capacity(100, 100, 2).unwrap();
        assert_eq!(cap.max_digits, 5000);
        assert_eq!(cap.max_bits, (5000.0 * 5f64.log2()).floor() as u64);
    }
}
