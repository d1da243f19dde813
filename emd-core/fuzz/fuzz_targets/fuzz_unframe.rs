#![no_main]

//! Fuzz target for digit stream unframing
//!
//! The first byte picks the group size, the rest become digits. Digits may be
//! out of range for the base; unframe must reject them without panicking.
//!
//! Run with: cargo +nightly fuzz run fuzz_unframe

use libfuzzer_sys::fuzz_target;
use emd_core::{unframe, Digit};

fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let n = usize::from(first % 30) + 2;
    let digits: Vec<Digit> = rest.iter().map(|&b| Digit::from(b % 48)).collect();

    if let Ok(payload) = unframe(&digits, n) {
        // Anything accepted must re-frame into a prefix of the input.
        if let Ok(again) = emd_core::frame(&payload, n) {
            assert_eq!(&digits[..again.len()], &again[..]);
        }
    }
});
