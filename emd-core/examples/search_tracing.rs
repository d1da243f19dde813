//! Example demonstrating search tracing instrumentation.
//!
//! Run with: cargo run -p emd-core --example search_tracing
//! Add `RUST_LOG=emd_core=trace` to see every rejected group size.

use emd_core::{hide, search, ImageView, ImageViewMut, SaturationPolicy};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("emd_core=debug,info")),
        )
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== EMD Search Tracing Demo ===\n");

    let (width, height) = (128u32, 96u32);
    let mut pixels: Vec<u8> = (0..width * height)
        .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8 | 1)
        .map(|v| v.min(254))
        .collect();

    let message = b"Hidden in plain sight";
    let mut cover = match ImageViewMut::new(width, height, &mut pixels) {
        Ok(view) => view,
        Err(e) => {
            eprintln!("Failed to create view: {}", e);
            return;
        }
    };

    match hide(&mut cover, 9, message, SaturationPolicy::Strict) {
        Ok(report) => println!("Hidden {} bytes with n=9: {:?}\n", message.len(), report),
        Err(e) => {
            eprintln!("Failed to hide: {}", e);
            return;
        }
    }

    let Ok(stego) = ImageView::new(width, height, &pixels) else {
        return;
    };

    println!("Searching n = 2..=20...\n");

    match search(&stego, Some(256)) {
        Ok(candidates) => {
            println!("\nFound {} candidate(s):", candidates.len());
            for c in candidates {
                println!("   n={:<3} {}", c.n, String::from_utf8_lossy(&c.payload));
            }
        }
        Err(e) => {
            println!("\nSearch failed: {}", e);
        }
    }
}
