//! EMD Core - Exploiting Modification Direction steganography
//!
//! This crate embeds and recovers byte payloads in grayscale pixel data using
//! the EMD scheme of Zhang & Wang (IEEE Communications Letters, 2006): every
//! group of `n` pixels carries one base-(2n+1) digit, encoded by changing at
//! most one pixel of the group by ±1.
//!
//! # Features
//!
//! - Group-wise embed/extract with an explicit saturation policy
//! - Length-prefixed framing with arbitrary-precision radix conversion
//! - Exact capacity computation, net of the header
//! - Parameter search that recovers a payload without knowing `n`
//! - Data-parallel processing of disjoint pixel groups (`parallel` feature)
//!
//! No encryption is applied: the payload is hidden, not secret.
//!
//! # Example
//!
//! ```
//! use emd_core::{extract, hide, search, ImageView, ImageViewMut, SaturationPolicy};
//!
//! # fn example() -> emd_core::Result<()> {
//! let (width, height) = (64u32, 64u32);
//! let mut pixels: Vec<u8> = (0..width * height).map(|i| (i * 7 % 200 + 20) as u8).collect();
//!
//! let mut cover = ImageViewMut::new(width, height, &mut pixels)?;
//! hide(&mut cover, 11, b"HELLO", SaturationPolicy::Strict)?;
//!
//! let stego = ImageView::new(width, height, &pixels)?;
//! assert_eq!(extract(&stego, 11, 5)?, b"HELLO");
//!
//! let found = search(&stego, Some(64))?;
//! assert!(found.iter().any(|c| c.n == 11 && c.payload == b"HELLO"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod capacity;
pub mod codec;
pub mod error;
pub mod framing;
pub mod group;
pub mod view;
pub mod search;

use serde::Serialize;
use tracing::debug;

pub use capacity::{capacity, Capacity};
pub use codec::{
    embed_digits, embed_group, extract_digits, extract_group, select_adjustment, Adjustment,
    EmbedStats, SaturationPolicy,
};
pub use error::{EmdError, FramingError, Result};
pub use framing::{frame, unframe, FrameLayout, BLOCK_BYTES, MAX_PAYLOAD_LEN};
pub use group::{compute_f, Digit, EmdParams, PixelGroup, MAX_GROUP_SIZE, MIN_GROUP_SIZE};
pub use view::{ImageView, ImageViewMut};
pub use search::{AnyContent, Candidate, ContentValidator, PrintableText, SearchConfig, Searcher};

/// Outcome of a successful [`hide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HideReport {
    pub n: usize,
    pub payload_bytes: usize,
    pub capacity_bytes: usize,
    #[serde(flatten)]
    pub stats: EmbedStats,
}

/// Embed `payload` into `image` with group size `n`.
///
/// Parameters and capacity are validated, and every group is planned, before
/// any pixel is written. On error the image is unchanged.
pub fn hide(
    image: &mut ImageViewMut<'_>,
    n: usize,
    payload: &[u8],
    policy: SaturationPolicy,
) -> Result<HideReport> {
    let params = EmdParams::new(n)?;
    if payload.is_empty() {
        return Err(EmdError::InvalidParameter(
            "payload length must be positive".into(),
        ));
    }

    let layout = FrameLayout::new(params);
    let cap = capacity::capacity_for(image.pixel_count(), &layout);
    if !cap.fits(payload.len()) {
        return Err(EmdError::InsufficientCapacity {
            needed: payload.len(),
            capacity: cap.max_bytes,
            n,
        });
    }

    let digits = layout.frame(payload)?;
    let stats = embed_digits(image.pixels_mut(), &digits, &params, policy)?;

    tracing::info!(
        n,
        bytes = payload.len(),
        digits = digits.len(),
        pixels_modified = stats.pixels_modified,
        "Payload hidden"
    );

    Ok(HideReport {
        n,
        payload_bytes: payload.len(),
        capacity_bytes: cap.max_bytes,
        stats,
    })
}

/// Recover a payload of known `length` hidden with group size `n`.
///
/// The embedded header must declare exactly `length` bytes.
pub fn extract(image: &ImageView<'_>, n: usize, length: usize) -> Result<Vec<u8>> {
    if length == 0 {
        return Err(EmdError::InvalidParameter(
            "length must be positive".into(),
        ));
    }
    let (declared, payload) = extract_inner(image, n)?;
    if declared != length {
        return Err(FramingError::LengthMismatch {
            expected: length,
            declared,
        }
        .into());
    }
    Ok(payload)
}

/// Recover a payload hidden with group size `n`, trusting the embedded header.
pub fn extract_framed(image: &ImageView<'_>, n: usize) -> Result<Vec<u8>> {
    extract_inner(image, n).map(|(_, payload)| payload)
}

fn extract_inner(image: &ImageView<'_>, n: usize) -> Result<(usize, Vec<u8>)> {
    let params = EmdParams::new(n)?;
    let layout = FrameLayout::new(params);
    let pixels = image.pixels();
    let cap = capacity::capacity_for(pixels.len(), &layout);

    let header = extract_digits(pixels, &params, 0, layout.header_digits())?;
    let declared = layout.read_header(&header)?;
    if declared > cap.max_bytes {
        return Err(FramingError::InconsistentLength {
            declared,
            limit: cap.max_bytes,
        }
        .into());
    }

    let body = extract_digits(
        pixels,
        &params,
        layout.header_digits(),
        layout.payload_digits(declared),
    )?;
    let payload = layout.decode_payload(&body, declared)?;
    debug!(n, bytes = declared, "Payload extracted");
    Ok((declared, payload))
}

/// Capacity of `image` for group size `n`.
pub fn info(image: &ImageView<'_>, n: usize) -> Result<Capacity> {
    capacity(image.width(), image.height(), n)
}

/// Search for a text payload with the default [`Searcher`] settings.
///
/// `max_length` optionally bounds the declared payload length. Returns all
/// passing candidates in ascending `n`, or [`EmdError::NotFound`].
pub fn search(image: &ImageView<'_>, max_length: Option<usize>) -> Result<Vec<Candidate>> {
    let config = SearchConfig {
        max_length,
        ..SearchConfig::default()
    };
    Searcher::new(config, PrintableText::default()).run(image)
}
