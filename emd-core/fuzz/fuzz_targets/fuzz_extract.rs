#![no_main]

//! Fuzz target for extraction and search
//!
//! Treats the input as a square-ish grayscale image and runs framed
//! extraction for a few group sizes plus a bounded search. None of these may
//! panic on arbitrary pixels.
//!
//! Run with: cargo +nightly fuzz run fuzz_extract

use libfuzzer_sys::fuzz_target;
use emd_core::{extract_framed, AnyContent, ImageView, SearchConfig, Searcher};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let width = (data.len() as f64).sqrt() as u32;
    let height = data.len() as u32 / width;
    let pixels = &data[..(width * height) as usize];
    let Ok(image) = ImageView::new(width, height, pixels) else {
        return;
    };

    for n in [2, 3, 11] {
        let _ = extract_framed(&image, n);
    }

    let searcher = Searcher::new(
        SearchConfig {
            max_n: 8,
            max_length: Some(1024),
            ..SearchConfig::default()
        },
        AnyContent,
    );
    let _ = searcher.run(&image);
});
