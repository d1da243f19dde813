//! Info command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use emd_core::{capacity, Capacity, MIN_GROUP_SIZE};
use tracing::debug;

use crate::config::Config;
use crate::OutputFormat;

fn print_table(path: &str, width: u32, height: u32, rows: &[Capacity]) {
    println!();
    println!("{} {} ({}x{})", "Capacity of".bold(), path, width, height);
    println!();
    println!(
        "   {:>4} {:>5} {:>9} {:>7} {:>11} {:>10}",
        "n".dimmed(),
        "base".dimmed(),
        "digits".dimmed(),
        "header".dimmed(),
        "bits".dimmed(),
        "bytes".dimmed()
    );
    for cap in rows {
        let bytes = if cap.max_bytes == 0 {
            "0".red().to_string()
        } else {
            cap.max_bytes.to_string()
        };
        println!(
            "   {:>4} {:>5} {:>9} {:>7} {:>11} {:>10}",
            cap.n, cap.base, cap.max_digits, cap.header_digits, cap.max_bits, bytes
        );
    }
    println!();
}

/// Execute the info command.
pub fn execute(
    input: PathBuf,
    n: Option<usize>,
    format: OutputFormat,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    // Only the header is decoded; pixels are not needed for capacity.
    let (width, height) = image::image_dimensions(&input)
        .with_context(|| format!("Failed to read image: {}", input.display()))?;
    debug!(width, height, "Read image dimensions");

    let rows = match n {
        Some(n) => vec![capacity(width, height, n)?],
        None => (MIN_GROUP_SIZE..=config.search_max_n)
            .map(|n| capacity(width, height, n))
            .collect::<emd_core::Result<Vec<_>>>()?,
    };

    match format {
        OutputFormat::Json => {
            let json = match rows.as_slice() {
                [single] if n.is_some() => serde_json::to_string_pretty(single),
                _ => serde_json::to_string_pretty(&rows),
            }
            .context("Failed to encode capacity report")?;
            println!("{json}");
        }
        OutputFormat::Text if quiet => {
            for cap in &rows {
                println!("{} {}", cap.n, cap.max_bytes);
            }
        }
        OutputFormat::Text => print_table(&input.display().to_string(), width, height, &rows),
    }

    Ok(())
}
