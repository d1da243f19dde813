use thiserror::Error;

/// Errors raised by the EMD codec, framing and search.
///
/// Every variant is recoverable by the caller. A rejected `hide` never leaves
/// a partially modified image behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmdError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Insufficient capacity: need {needed} bytes, have capacity for {capacity} with n={n}")]
    InsufficientCapacity {
        needed: usize,
        capacity: usize,
        n: usize,
    },

    /// The ±1 adjustment required by a group would leave the [0, 255] range.
    #[error("Embed failure: saturated pixel (value {value}) at group {group}, position {position}")]
    SaturatedPixel {
        group: usize,
        /// 1-based weight of the pixel inside its group.
        position: usize,
        value: u8,
    },

    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("No hidden payload found (tried n={min_n}..={max_n})")]
    NotFound { min_n: usize, max_n: usize },
}

impl EmdError {
    /// `NotFound` is a normal negative search outcome rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Mismatch between the extraction parameters and what the digit stream holds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("truncated stream: need {needed} digits, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("decoded length exceeds stream: header declares {declared} bytes, at most {limit} fit")]
    InconsistentLength { declared: usize, limit: usize },

    #[error("length mismatch: expected {expected} bytes, header declares {declared}")]
    LengthMismatch { expected: usize, declared: usize },

    #[error("digit run at offset {offset} does not fit its byte width")]
    DigitOverflow { offset: usize },
}

pub type Result<T> = std::result::Result<T, EmdError>;
