//! Group-wise EMD embedding and extraction.
//!
//! For a group with current value `f` and target digit `d`, let
//! `s = (d - f) mod (2n + 1)`:
//!
//! - `s == 0`: the group already carries `d`.
//! - `1 <= s <= n`: increment the pixel of weight `s`.
//! - `n < s <= 2n`: decrement the pixel of weight `2n + 1 - s`.
//!
//! Embedding over a whole image is all-or-nothing: every group is planned
//! against the untouched pixels first, and pixels are only written once all
//! plans succeeded. Groups are disjoint, so both phases run data-parallel
//! when the `parallel` feature is enabled.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{EmdError, FramingError, Result};
use crate::group::{compute_f, Digit, EmdParams};

/// What to do when the selected pixel is already at 0 or 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SaturationPolicy {
    /// Fail with [`EmdError::SaturatedPixel`] and leave the image untouched.
    #[default]
    Strict,
    /// Step the saturated pixel one unit inward and re-plan the group.
    /// Always succeeds, but a pixel may move by up to 2 and a group may have
    /// several pixels changed.
    Compensate,
}

/// A single ±1 change to one pixel of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    /// 1-based weight of the pixel inside the group.
    pub position: usize,
    /// `+1` or `-1`.
    pub delta: i8,
}

/// Canonical adjustment that moves a group from value `f` to `digit`.
pub fn select_adjustment(f: Digit, digit: Digit, params: &EmdParams) -> Option<Adjustment> {
    let base = params.base();
    let s = (digit + base - f) % base;
    if s == 0 {
        None
    } else if s as usize <= params.n() {
        Some(Adjustment {
            position: s as usize,
            delta: 1,
        })
    } else {
        Some(Adjustment {
            position: (base - s) as usize,
            delta: -1,
        })
    }
}

/// Saturation found while planning a group, before its index is known.
#[derive(Debug, Clone, Copy)]
struct Saturated {
    position: usize,
    value: u8,
}

impl Saturated {
    fn at(self, group: usize) -> EmdError {
        EmdError::SaturatedPixel {
            group,
            position: self.position,
            value: self.value,
        }
    }
}

fn is_saturated(value: u8, delta: i8) -> bool {
    (delta > 0 && value == u8::MAX) || (delta < 0 && value == u8::MIN)
}

fn apply(value: u8, delta: i8) -> u8 {
    if delta > 0 {
        value + 1
    } else {
        value - 1
    }
}

/// Compute the new contents of one group, or `None` when it already carries
/// `digit`. Never touches `pixels`.
fn plan_group(
    pixels: &[u8],
    digit: Digit,
    params: &EmdParams,
    policy: SaturationPolicy,
) -> std::result::Result<Option<Vec<u8>>, Saturated> {
    let base = params.base();
    match policy {
        SaturationPolicy::Strict => {
            let Some(adj) = select_adjustment(compute_f(pixels, base), digit, params) else {
                return Ok(None);
            };
            let value = pixels[adj.position - 1];
            if is_saturated(value, adj.delta) {
                return Err(Saturated {
                    position: adj.position,
                    value,
                });
            }
            let mut values = pixels.to_vec();
            values[adj.position - 1] = apply(value, adj.delta);
            Ok(Some(values))
        }
        SaturationPolicy::Compensate => {
            let mut values = pixels.to_vec();
            let mut changed = false;
            let mut first = None;
            // Each inward step clears one saturated pixel, so n + 1 rounds suffice.
            for _ in 0..=params.n() {
                let Some(adj) = select_adjustment(compute_f(&values, base), digit, params) else {
                    return Ok(changed.then_some(values));
                };
                let idx = adj.position - 1;
                let value = values[idx];
                if is_saturated(value, adj.delta) {
                    first.get_or_insert(Saturated {
                        position: adj.position,
                        value,
                    });
                    values[idx] = apply(value, -adj.delta);
                    changed = true;
                    continue;
                }
                values[idx] = apply(value, adj.delta);
                return Ok(Some(values));
            }
            Err(first.unwrap_or(Saturated {
                position: 1,
                value: pixels[0],
            }))
        }
    }
}

fn check_digit(digit: Digit, params: &EmdParams) -> Result<()> {
    if digit >= params.base() {
        return Err(EmdError::InvalidParameter(format!(
            "digit {digit} out of range for base {}",
            params.base()
        )));
    }
    Ok(())
}

fn check_group(group: &[u8], params: &EmdParams) -> Result<()> {
    if group.len() != params.n() {
        return Err(EmdError::InvalidParameter(format!(
            "group holds {} pixels, expected {}",
            group.len(),
            params.n()
        )));
    }
    Ok(())
}

/// Embed one digit into a standalone group.
///
/// Returns `true` if any pixel changed. Saturation errors report group 0.
pub fn embed_group(
    group: &mut [u8],
    digit: Digit,
    params: &EmdParams,
    policy: SaturationPolicy,
) -> Result<bool> {
    check_group(group, params)?;
    check_digit(digit, params)?;
    match plan_group(group, digit, params, policy).map_err(|s| s.at(0))? {
        Some(values) => {
            group.copy_from_slice(&values);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Recover the digit carried by one group.
pub fn extract_group(group: &[u8], params: &EmdParams) -> Result<Digit> {
    check_group(group, params)?;
    Ok(compute_f(group, params.base()))
}

/// Counters describing what an embed pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmbedStats {
    pub groups_used: usize,
    pub groups_modified: usize,
    pub pixels_modified: usize,
}

type Plan = Option<Vec<u8>>;

#[cfg(feature = "parallel")]
fn plan_groups(
    pixels: &[u8],
    digits: &[Digit],
    params: &EmdParams,
    policy: SaturationPolicy,
) -> Result<Vec<Plan>> {
    pixels
        .par_chunks_exact(params.n())
        .zip(digits.par_iter())
        .enumerate()
        .map(|(g, (chunk, &d))| plan_group(chunk, d, params, policy).map_err(|s| s.at(g)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn plan_groups(
    pixels: &[u8],
    digits: &[Digit],
    params: &EmdParams,
    policy: SaturationPolicy,
) -> Result<Vec<Plan>> {
    pixels
        .chunks_exact(params.n())
        .zip(digits.iter())
        .enumerate()
        .map(|(g, (chunk, &d))| plan_group(chunk, d, params, policy).map_err(|s| s.at(g)))
        .collect()
}

fn write_plan(chunk: &mut [u8], plan: &Plan) -> usize {
    match plan {
        Some(values) => {
            let changed = chunk.iter().zip(values).filter(|(a, b)| a != b).count();
            chunk.copy_from_slice(values);
            changed
        }
        None => 0,
    }
}

#[cfg(feature = "parallel")]
fn apply_plans(pixels: &mut [u8], plans: &[Plan], n: usize) -> usize {
    pixels
        .par_chunks_exact_mut(n)
        .zip(plans.par_iter())
        .map(|(chunk, plan)| write_plan(chunk, plan))
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn apply_plans(pixels: &mut [u8], plans: &[Plan], n: usize) -> usize {
    pixels
        .chunks_exact_mut(n)
        .zip(plans.iter())
        .map(|(chunk, plan)| write_plan(chunk, plan))
        .sum()
}

/// Embed `digits` into the leading groups of `pixels`, one digit per group.
///
/// Either every group is written or, on error, no pixel is touched.
pub fn embed_digits(
    pixels: &mut [u8],
    digits: &[Digit],
    params: &EmdParams,
    policy: SaturationPolicy,
) -> Result<EmbedStats> {
    let n = params.n();
    let available = pixels.len() / n;
    if digits.len() > available {
        return Err(EmdError::InvalidParameter(format!(
            "{} digits need {} pixels, image has {}",
            digits.len(),
            digits.len() * n,
            pixels.len()
        )));
    }
    if let Some(&bad) = digits.iter().find(|&&d| d >= params.base()) {
        check_digit(bad, params)?;
    }

    let plans = plan_groups(pixels, digits, params, policy)?;
    let groups_modified = plans.iter().filter(|p| p.is_some()).count();
    let pixels_modified = apply_plans(pixels, &plans, n);

    debug!(
        n,
        digits = digits.len(),
        groups_modified,
        pixels_modified,
        "Embedded digit stream"
    );

    Ok(EmbedStats {
        groups_used: digits.len(),
        groups_modified,
        pixels_modified,
    })
}

/// Read `count` digits starting at group `start`.
pub fn extract_digits(
    pixels: &[u8],
    params: &EmdParams,
    start: usize,
    count: usize,
) -> Result<Vec<Digit>> {
    let n = params.n();
    let available = pixels.len() / n;
    let end = start.saturating_add(count);
    if end > available {
        return Err(FramingError::Truncated {
            needed: end,
            available,
        }
        .into());
    }
    let region = &pixels[start * n..end * n];
    let base = params.base();

    #[cfg(feature = "parallel")]
    let digits = region
        .par_chunks_exact(n)
        .map(|chunk| compute_f(chunk, base))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let digits = region
        .chunks_exact(n)
        .map(|chunk| compute_f(chunk, base))
        .collect();

    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n: usize) -> EmdParams {
        EmdParams::new(n).unwrap()
    }

    #[test]
    fn test_select_adjustment_directions() {
        let p = params(2);
        // s = 0
        assert_eq!(select_adjustment(3, 3, &p), None);
        // s = 1 -> +1 on weight 1
        assert_eq!(
            select_adjustment(0, 1, &p),
            Some(Adjustment {
                position: 1,
                delta: 1
            })
        );
        // s = 4 -> -1 on weight 5 - 4 = 1
        assert_eq!(
            select_adjustment(0, 4, &p),
            Some(Adjustment {
                position: 1,
                delta: -1
            })
        );
        // s = 3 -> -1 on weight 2
        assert_eq!(
            select_adjustment(1, 4, &p),
            Some(Adjustment {
                position: 2,
                delta: -1
            })
        );
    }

    #[test]
    fn test_embed_group_every_digit() {
        for n in 2..=8 {
            let p = params(n);
            for d in 0..p.base() {
                let original: Vec<u8> = (0..n).map(|i| (100 + i * 13) as u8).collect();
                let mut group = original.clone();
                embed_group(&mut group, d, &p, SaturationPolicy::Strict).unwrap();
                assert_eq!(extract_group(&group, &p).unwrap(), d, "n={n} d={d}");

                let touched: Vec<_> = original
                    .iter()
                    .zip(&group)
                    .filter(|(a, b)| a != b)
                    .map(|(&a, &b)| (i16::from(a) - i16::from(b)).abs())
                    .collect();
                assert!(touched.len() <= 1);
                assert!(touched.iter().all(|&delta| delta == 1));
            }
        }
    }

    #[test]
    fn test_embed_group_no_change_when_digit_matches() {
        let p = params(3);
        let mut group = vec![3, 1, 4];
        let f = extract_group(&group, &p).unwrap();
        let changed = embed_group(&mut group, f, &p, SaturationPolicy::Strict).unwrap();
        assert!(!changed);
        assert_eq!(group, vec![3, 1, 4]);
    }

    #[test]
    fn test_strict_rejects_saturated_increment() {
        let p = params(2);
        let mut group = vec![255, 255];
        // f = 0, d = 1 -> increment weight 1 which is already 255
        let err = embed_group(&mut group, 1, &p, SaturationPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            EmdError::SaturatedPixel {
                group: 0,
                position: 1,
                value: 255
            }
        );
        assert_eq!(group, vec![255, 255]);
    }

    #[test]
    fn test_strict_rejects_saturated_decrement() {
        let p = params(2);
        let mut group = vec![0, 0];
        let err = embed_group(&mut group, 4, &p, SaturationPolicy::Strict).unwrap_err();
        assert!(matches!(err, EmdError::SaturatedPixel { value: 0, .. }));
        assert_eq!(group, vec![0, 0]);
    }

    #[test]
    fn test_compensate_recovers_saturated_groups() {
        for n in 2..=6 {
            let p = params(n);
            for fill in [0u8, 255] {
                for d in 0..p.base() {
                    let mut group = vec![fill; n];
                    embed_group(&mut group, d, &p, SaturationPolicy::Compensate).unwrap();
                    assert_eq!(extract_group(&group, &p).unwrap(), d);
                    for &v in &group {
                        assert!((i16::from(v) - i16::from(fill)).abs() <= 2);
                    }
                }
            }
        }
    }

    #[test]
    fn test_embed_digits_all_or_nothing() {
        let p = params(2);
        // Group 0 is fine, group 1 is saturated for digit 1.
        let mut pixels = vec![100, 100, 255, 255, 50, 50];
        let before = pixels.clone();
        let err = embed_digits(&mut pixels, &[3, 1, 2], &p, SaturationPolicy::Strict).unwrap_err();
        assert!(matches!(err, EmdError::SaturatedPixel { group: 1, .. }));
        assert_eq!(pixels, before);
    }

    #[test]
    fn test_embed_then_extract_digits() {
        let p = params(4);
        let mut pixels: Vec<u8> = (0..400).map(|i| (i * 7 % 250 + 3) as u8).collect();
        let digits: Vec<Digit> = (0..100).map(|i| (i * 5 % 9) as Digit).collect();
        let stats = embed_digits(&mut pixels, &digits, &p, SaturationPolicy::Strict).unwrap();
        assert_eq!(stats.groups_used, 100);
        assert_eq!(stats.groups_modified, stats.pixels_modified);
        assert_eq!(extract_digits(&pixels, &p, 0, 100).unwrap(), digits);
        assert_eq!(extract_digits(&pixels, &p, 10, 5).unwrap(), digits[10..15]);
    }

    #[test]
    fn test_embed_digits_rejects_overlong_stream() {
        let p = params(3);
        let mut pixels = vec![10u8; 8];
        assert!(matches!(
            embed_digits(&mut pixels, &[1, 2, 3], &p, SaturationPolicy::Strict),
            Err(EmdError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_embed_digits_rejects_out_of_range_digit() {
        let p = params(2);
        let mut pixels = vec![10u8; 8];
        assert!(matches!(
            embed_digits(&mut pixels, &[5], &p, SaturationPolicy::Strict),
            Err(EmdError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_extract_digits_truncated() {
        let p = params(2);
        let pixels = vec![0u8; 9];
        assert_eq!(
            extract_digits(&pixels, &p, 2, 3),
            Err(EmdError::Framing(FramingError::Truncated {
                needed: 5,
                available: 4
            }))
        );
    }
}
