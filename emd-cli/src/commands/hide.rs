//! Hide command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use emd_core::{EmdParams, ImageViewMut, SaturationPolicy};
use tracing::{info, warn};

use crate::config::Config;
use crate::utils::{default_output_path, ensure_lossless, load_gray, save_gray};

/// Where the payload bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    Text(String),
    File(PathBuf),
}

impl PayloadSource {
    pub fn from_args(text: Option<String>, file: Option<PathBuf>) -> Result<Self> {
        match (text, file) {
            (Some(text), None) => Ok(Self::Text(text)),
            (None, Some(file)) => Ok(Self::File(file)),
            (Some(_), Some(_)) => bail!("Invalid argument: --text and --file are exclusive"),
            (None, None) => bail!("Invalid argument: one of --text or --file is required"),
        }
    }

    fn read(&self) -> Result<Vec<u8>> {
        match self {
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::File(path) => std::fs::read(path)
                .with_context(|| format!("Failed to read payload file: {}", path.display())),
        }
    }
}

/// Execute the hide command.
pub fn execute(
    input: PathBuf,
    n: usize,
    source: PayloadSource,
    output: Option<PathBuf>,
    compensate: bool,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    // Reject bad parameters before touching any file
    let params = EmdParams::new(n)?;
    let output = output.unwrap_or_else(|| default_output_path(&input, &config.output_suffix));
    ensure_lossless(&output)?;

    let payload = source.read()?;
    info!(bytes = payload.len(), "Read payload");

    let mut img = load_gray(&input, quiet)?;
    let (width, height) = img.dimensions();

    let policy = if compensate {
        warn!("Saturated pixels will be compensated; some may change by 2");
        SaturationPolicy::Compensate
    } else {
        SaturationPolicy::Strict
    };

    let report = {
        let mut cover = ImageViewMut::try_from(&mut img)?;
        emd_core::hide(&mut cover, n, &payload, policy)?
    };

    save_gray(&img, &output)?;
    info!(path = %output.display(), "Wrote stego image");

    if !quiet {
        println!();
        println!("{}", "Payload hidden".green().bold());
        println!();
        println!("   {} {}", "Output:".dimmed(), output.display());
        println!(
            "   {} {} (base {})",
            "Group size:".dimmed(),
            n,
            params.base()
        );
        println!(
            "   {} {} of {} bytes",
            "Payload:".dimmed(),
            report.payload_bytes,
            report.capacity_bytes
        );
        println!(
            "   {} {} of {} ({}x{})",
            "Pixels modified:".dimmed(),
            report.stats.pixels_modified,
            u64::from(width) * u64::from(height),
            width,
            height
        );
        println!();
        println!(
            "   {} emd extract -n {} -l {} -i {}",
            "Recover with:".dimmed(),
            n,
            report.payload_bytes,
            output.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_source_from_args() {
        assert_eq!(
            PayloadSource::from_args(Some("hi".into()), None).unwrap(),
            PayloadSource::Text("hi".into())
        );
        assert_eq!(
            PayloadSource::from_args(None, Some("a.bin".into())).unwrap(),
            PayloadSource::File("a.bin".into())
        );
        assert!(PayloadSource::from_args(None, None).is_err());
        assert!(PayloadSource::from_args(Some("x".into()), Some("y".into())).is_err());
    }

    #[test]
    fn test_text_payload_bytes() {
        let source = PayloadSource::Text("Grüße".into());
        assert_eq!(source.read().unwrap(), "Grüße".as_bytes());
    }
}
