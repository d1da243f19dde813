//! Parameter search: locate a hidden payload without knowing `n`.
//!
//! Every group size produces *some* digit stream, so each candidate `n` is
//! checked in two stages. First the length header alone is decoded and must
//! be plausible (non-zero, within the caller's bound, within capacity). Only
//! then is the payload extracted, unframed and handed to a
//! [`ContentValidator`].
//!
//! This is a heuristic. Short payloads or permissive validators can let more
//! than one `n` pass; all passing candidates are reported in ascending `n`.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

use crate::capacity::capacity_for;
use crate::codec::extract_digits;
use crate::error::{EmdError, Result};
use crate::framing::FrameLayout;
use crate::group::{EmdParams, MIN_GROUP_SIZE};
use crate::view::ImageView;

/// Acceptance test for recovered payload bytes.
pub trait ContentValidator: Sync {
    fn accept(&self, payload: &[u8]) -> bool;
}

impl<F> ContentValidator for F
where
    F: Fn(&[u8]) -> bool + Sync,
{
    fn accept(&self, payload: &[u8]) -> bool {
        self(payload)
    }
}

/// Accepts payloads that are mostly printable text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintableText {
    /// Minimum share of printable characters, in `[0, 1]`.
    pub min_ratio: f64,
}

impl PrintableText {
    pub const DEFAULT_RATIO: f64 = 0.90;

    pub fn new(min_ratio: f64) -> Self {
        Self {
            min_ratio: min_ratio.clamp(0.0, 1.0),
        }
    }

    /// Share of printable characters after lossy UTF-8 decoding.
    pub fn ratio(payload: &[u8]) -> f64 {
        let text = String::from_utf8_lossy(payload);
        let (printable, total) = text.chars().fold((0usize, 0usize), |(p, t), c| {
            let ok = c != char::REPLACEMENT_CHARACTER && (!c.is_control() || c.is_whitespace());
            (p + usize::from(ok), t + 1)
        });
        if total == 0 {
            return 0.0;
        }
        printable as f64 / total as f64
    }
}

impl Default for PrintableText {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATIO)
    }
}

impl ContentValidator for PrintableText {
    fn accept(&self, payload: &[u8]) -> bool {
        !payload.is_empty() && Self::ratio(payload) >= self.min_ratio
    }
}

/// Accepts anything; only the header consistency checks apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyContent;

impl ContentValidator for AnyContent {
    fn accept(&self, _payload: &[u8]) -> bool {
        true
    }
}

/// Bounds and behaviour of a search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub min_n: usize,
    pub max_n: usize,
    /// Reject headers declaring more than this many bytes.
    pub max_length: Option<usize>,
    /// Return as soon as the smallest passing `n` is known.
    pub stop_at_first: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_n: MIN_GROUP_SIZE,
            max_n: 20,
            max_length: None,
            stop_at_first: false,
        }
    }
}

/// A validated `(n, payload)` combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub n: usize,
    pub length: usize,
    pub payload: Vec<u8>,
}

/// Guess-and-check search over group sizes.
pub struct Searcher<V> {
    config: SearchConfig,
    validator: V,
}

impl Searcher<PrintableText> {
    /// Text search with the default printable ratio.
    pub fn text() -> Self {
        Self::new(SearchConfig::default(), PrintableText::default())
    }
}

impl<V: ContentValidator> Searcher<V> {
    pub fn new(config: SearchConfig, validator: V) -> Self {
        Self { config, validator }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Candidate group sizes for `image`: the configured range, cut where not
    /// even a header plus one digit fits.
    fn n_range(&self, image: &ImageView<'_>) -> Result<(usize, usize)> {
        let min_n = self.config.min_n.max(MIN_GROUP_SIZE);
        if self.config.max_n < min_n {
            return Err(EmdError::InvalidParameter(format!(
                "empty search range n={}..={}",
                self.config.min_n, self.config.max_n
            )));
        }
        if self.config.max_length == Some(0) {
            return Err(EmdError::InvalidParameter(
                "maximum length must be positive".into(),
            ));
        }
        let pixels = image.pixel_count();
        let mut max_n = self.config.max_n;
        while max_n >= min_n {
            let params = EmdParams::new(max_n)?;
            let layout = FrameLayout::new(params);
            if pixels / max_n > layout.header_digits() {
                break;
            }
            max_n -= 1;
        }
        Ok((min_n, max_n))
    }

    /// Try one group size. `None` means this `n` was rejected.
    pub fn try_n(&self, image: &ImageView<'_>, n: usize) -> Option<Candidate> {
        let params = EmdParams::new(n).ok()?;
        let layout = FrameLayout::new(params);
        let pixels = image.pixels();
        let capacity = capacity_for(pixels.len(), &layout);

        let header = extract_digits(pixels, &params, 0, layout.header_digits()).ok()?;
        let length = layout.read_header(&header).ok()?;
        if length == 0 || length > capacity.max_bytes {
            trace!(n, length, max_bytes = capacity.max_bytes, "Header out of range");
            return None;
        }
        if self.config.max_length.is_some_and(|max| length > max) {
            trace!(n, length, "Header above requested maximum");
            return None;
        }

        let body = extract_digits(
            pixels,
            &params,
            layout.header_digits(),
            layout.payload_digits(length),
        )
        .ok()?;
        let payload = layout.decode_payload(&body, length).ok()?;
        if !self.validator.accept(&payload) {
            trace!(n, length, "Payload rejected by validator");
            return None;
        }

        debug!(n, length, "Candidate found");
        Some(Candidate { n, length, payload })
    }

    /// All candidates in ascending `n`, or `NotFound`.
    pub fn run(&self, image: &ImageView<'_>) -> Result<Vec<Candidate>> {
        let (min_n, max_n) = self.n_range(image)?;
        debug!(min_n, max_n, pixels = image.pixel_count(), "Searching");

        let candidates = if max_n < min_n {
            Vec::new()
        } else if self.config.stop_at_first {
            self.first_candidate(image, min_n, max_n)
                .into_iter()
                .collect()
        } else {
            self.all_candidates(image, min_n, max_n)
        };

        if candidates.is_empty() {
            return Err(EmdError::NotFound {
                min_n,
                max_n: self.config.max_n,
            });
        }
        Ok(candidates)
    }

    #[cfg(feature = "parallel")]
    fn all_candidates(&self, image: &ImageView<'_>, min_n: usize, max_n: usize) -> Vec<Candidate> {
        (min_n..=max_n)
            .into_par_iter()
            .filter_map(|n| self.try_n(image, n))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn all_candidates(&self, image: &ImageView<'_>, min_n: usize, max_n: usize) -> Vec<Candidate> {
        (min_n..=max_n)
            .filter_map(|n| self.try_n(image, n))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn first_candidate(
        &self,
        image: &ImageView<'_>,
        min_n: usize,
        max_n: usize,
    ) -> Option<Candidate> {
        (min_n..=max_n)
            .into_par_iter()
            .find_map_first(|n| self.try_n(image, n))
    }

    #[cfg(not(feature = "parallel"))]
    fn first_candidate(
        &self,
        image: &ImageView<'_>,
        min_n: usize,
        max_n: usize,
    ) -> Option<Candidate> {
        (min_n..=max_n).find_map(|n| self.try_n(image, n))
    }
}
