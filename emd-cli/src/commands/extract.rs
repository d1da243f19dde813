//! Extract command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use emd_core::ImageView;
use tracing::info;

use crate::utils::{display_payload, load_gray};

/// Execute the extract command.
pub fn execute(
    input: PathBuf,
    n: usize,
    length: Option<usize>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let img = load_gray(&input, quiet)?;
    let stego = ImageView::try_from(&img)?;

    let payload = match length {
        Some(length) => emd_core::extract(&stego, n, length)?,
        None => emd_core::extract_framed(&stego, n)?,
    };
    info!(n, bytes = payload.len(), "Extracted payload");

    match output {
        Some(path) => {
            std::fs::write(&path, &payload)
                .with_context(|| format!("Failed to write payload file: {}", path.display()))?;
            if !quiet {
                println!(
                    "{} {} bytes to {}",
                    "Extracted".green().bold(),
                    payload.len(),
                    path.display()
                );
            }
        }
        None => {
            let (shown, encoding) = display_payload(&payload);
            if encoding == "hex" && !quiet {
                eprintln!("{}", "Payload is not UTF-8, printing hex".yellow());
            }
            println!("{shown}");
        }
    }

    Ok(())
}
