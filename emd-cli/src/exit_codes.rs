//! Exit codes following sysexits.h conventions.
//!
//! Scripts can tell a wrong group size apart from a full image or an
//! unreadable file without parsing messages.

use emd_core::EmdError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// No payload found, or an unclassified error.
pub const GENERAL_ERROR: i32 = 1;

/// Invalid parameter or command line argument.
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Embedded data could not be decoded (wrong n, corruption).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open or decode an input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// The payload does not fit in the cover image.
/// Maps to EX_CANTCREAT from sysexits.h.
pub const CAPACITY_ERROR: i32 = 73;

/// Cannot write an output file.
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// A pixel at 0 or 255 blocked embedding; retrying with --compensate works.
/// Maps to EX_TEMPFAIL from sysexits.h.
pub const SATURATED_ERROR: i32 = 75;

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    /// Exit code for a core error.
    pub fn for_emd_error(err: &EmdError) -> i32 {
        match err {
            EmdError::InvalidParameter(_) => USAGE_ERROR,
            EmdError::InsufficientCapacity { .. } => CAPACITY_ERROR,
            EmdError::SaturatedPixel { .. } => SATURATED_ERROR,
            EmdError::Framing(_) => DATA_ERROR,
            EmdError::NotFound { .. } => GENERAL_ERROR,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let code = if let Some(emd) = err.downcast_ref::<EmdError>() {
            Self::for_emd_error(emd)
        } else if message.contains("Failed to read") || message.contains("Failed to decode") {
            INPUT_ERROR
        } else if message.contains("Failed to write") || message.contains("Failed to encode") {
            IO_ERROR
        } else if message.contains("Invalid argument") {
            USAGE_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use emd_core::FramingError;

    #[test]
    fn test_core_errors_map_through_context() {
        let err: anyhow::Result<()> = Err(EmdError::InsufficientCapacity {
            needed: 10,
            capacity: 0,
            n: 5,
        })
        .context("Failed to hide payload");
        assert_eq!(ExitCode::from_anyhow(&err.unwrap_err()).code, CAPACITY_ERROR);

        let framing = anyhow::Error::from(EmdError::from(FramingError::DigitOverflow {
            offset: 0,
        }));
        assert_eq!(ExitCode::from_anyhow(&framing).code, DATA_ERROR);

        let saturated = anyhow::Error::from(EmdError::SaturatedPixel {
            group: 3,
            position: 1,
            value: 255,
        });
        assert_eq!(ExitCode::from_anyhow(&saturated).code, SATURATED_ERROR);
    }

    #[test]
    fn test_io_errors_classified_by_message() {
        let read = anyhow::anyhow!("Failed to read image: missing.png");
        assert_eq!(ExitCode::from_anyhow(&read).code, INPUT_ERROR);

        let write = anyhow::anyhow!("Failed to write image: /nope/out.png");
        assert_eq!(ExitCode::from_anyhow(&write).code, IO_ERROR);

        let other = anyhow::anyhow!("something else");
        let exit = ExitCode::from_anyhow(&other);
        assert_eq!(exit.code, GENERAL_ERROR);
        assert_eq!(exit.message.as_deref(), Some("something else"));
    }

    #[test]
    fn test_not_found_is_general_error() {
        let err = anyhow::Error::from(EmdError::NotFound { min_n: 2, max_n: 20 });
        assert_eq!(ExitCode::from_anyhow(&err).code, GENERAL_ERROR);
    }
}
