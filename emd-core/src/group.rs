//! Pixel groups and the modification-direction function.
//!
//! A group is a window of `n` consecutive pixels in row-major order. Its
//! modification-direction value is the weighted checksum
//!
//! ```text
//! f(x_1, ..., x_n) = (1·x_1 + 2·x_2 + ... + n·x_n) mod (2n + 1)
//! ```
//!
//! which is the digit the group carries.

use serde::Serialize;

use crate::error::{EmdError, Result};

/// One base-(2n+1) digit. Always in `[0, 2n]`.
pub type Digit = u32;

/// Smallest supported group size.
pub const MIN_GROUP_SIZE: usize = 2;

/// Largest supported group size.
pub const MAX_GROUP_SIZE: usize = 4096;

/// Embedding parameters derived from the group size `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmdParams {
    n: usize,
    base: u32,
}

impl EmdParams {
    /// Validate `n` and derive the digit base `2n + 1`.
    pub fn new(n: usize) -> Result<Self> {
        if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&n) {
            return Err(EmdError::InvalidParameter(format!(
                "group size n={n} outside {MIN_GROUP_SIZE}..={MAX_GROUP_SIZE}"
            )));
        }
        Ok(Self {
            n,
            base: (2 * n + 1) as u32,
        })
    }

    /// Pixels per group.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Digit base `b = 2n + 1`.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Information carried by one digit, `log2(2n + 1)` bits.
    pub fn bits_per_digit(&self) -> f64 {
        f64::from(self.base).log2()
    }
}

/// Read-only view of one group's current intensities.
#[derive(Debug, Clone, Copy)]
pub struct PixelGroup<'a> {
    pixels: &'a [u8],
}

impl<'a> PixelGroup<'a> {
    /// Wrap `pixels`, which must hold exactly `params.n()` values.
    pub fn new(pixels: &'a [u8], params: &EmdParams) -> Result<Self> {
        if pixels.len() != params.n() {
            return Err(EmdError::InvalidParameter(format!(
                "group holds {} pixels, expected {}",
                pixels.len(),
                params.n()
            )));
        }
        Ok(Self { pixels })
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Modification-direction value of this group.
    pub fn modification_direction(&self, params: &EmdParams) -> Digit {
        compute_f(self.pixels, params.base())
    }
}

/// `(Σ i·x_i) mod base` for i = 1..=len.
pub fn compute_f(pixels: &[u8], base: u32) -> Digit {
    let base = u64::from(base);
    let sum = pixels
        .iter()
        .zip(1u64..)
        .fold(0u64, |acc, (&x, weight)| (acc + weight * u64::from(x)) % base);
    sum as Digit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_reject_small_n() {
        assert!(matches!(
            EmdParams::new(1),
            Err(EmdError::InvalidParameter(_))
        ));
        assert!(EmdParams::new(0).is_err());
        assert!(EmdParams::new(MAX_GROUP_SIZE + 1).is_err());
    }

    #[test]
    fn test_params_base() {
        let params = EmdParams::new(2).unwrap();
        assert_eq!(params.base(), 5);
        let params = EmdParams::new(11).unwrap();
        assert_eq!(params.base(), 23);
        assert!((params.bits_per_digit() - 23f64.log2()).abs() < 1e-12);
    }

    #[test]
    fn test_compute_f_known_values() {
        // 1·10 + 2·20 = 50, 50 mod 5 = 0
        assert_eq!(compute_f(&[10, 20], 5), 0);
        // 1·3 + 2·1 + 3·4 = 17, 17 mod 7 = 3
        assert_eq!(compute_f(&[3, 1, 4], 7), 3);
        // 255·(1+2) = 765, 765 mod 5 = 0
        assert_eq!(compute_f(&[255, 255], 5), 0);
    }

    #[test]
    fn test_compute_f_in_range() {
        for n in 2..=12usize {
            let params = EmdParams::new(n).unwrap();
            let pixels: Vec<u8> = (0..n).map(|i| (i * 37 + 200) as u8).collect();
            let group = PixelGroup::new(&pixels, &params).unwrap();
            assert!(group.modification_direction(&params) < params.base());
        }
    }

    #[test]
    fn test_group_size_checked() {
        let params = EmdParams::new(3).unwrap();
        assert!(PixelGroup::new(&[1, 2], &params).is_err());
        assert!(PixelGroup::new(&[1, 2, 3], &params).is_ok());
    }
}
