//! Search command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use emd_core::{
    AnyContent, Candidate, EmdParams, ImageView, PrintableText, SearchConfig, Searcher,
};
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::utils::{display_payload, load_gray};
use crate::OutputFormat;

/// Search flags from the command line; unset values come from [`Config`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub max_length: Option<usize>,
    pub max_n: Option<usize>,
    pub min_printable: Option<f64>,
    pub any_content: bool,
    pub first: bool,
}

/// JSON view of a candidate with a readable payload.
#[derive(Debug, Serialize)]
struct CandidateReport {
    n: usize,
    base: u32,
    length: usize,
    encoding: &'static str,
    payload: String,
}

impl From<&Candidate> for CandidateReport {
    fn from(c: &Candidate) -> Self {
        let (payload, encoding) = display_payload(&c.payload);
        Self {
            n: c.n,
            base: 2 * c.n as u32 + 1,
            length: c.length,
            encoding,
            payload,
        }
    }
}

/// Execute the search command.
pub fn execute(
    input: PathBuf,
    options: SearchOptions,
    format: OutputFormat,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    let search_config = SearchConfig {
        max_n: options.max_n.unwrap_or(config.search_max_n),
        max_length: options.max_length,
        stop_at_first: options.first,
        ..SearchConfig::default()
    };
    // Validates the upper bound with the same rules as hide/extract
    EmdParams::new(search_config.max_n)?;

    let img = load_gray(&input, quiet)?;
    let stego = ImageView::try_from(&img)?;

    let result = if options.any_content {
        Searcher::new(search_config, AnyContent).run(&stego)
    } else {
        let ratio = options.min_printable.unwrap_or(config.printable_ratio);
        Searcher::new(search_config, PrintableText::new(ratio)).run(&stego)
    };

    let candidates = match result {
        Ok(candidates) => candidates,
        Err(e) if e.is_not_found() => {
            if format == OutputFormat::Json {
                println!("[]");
            } else if !quiet {
                println!("{}", "No hidden payload found".yellow());
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    info!(count = candidates.len(), "Search finished");

    let reports: Vec<CandidateReport> = candidates.iter().map(CandidateReport::from).collect();
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&reports).context("Failed to encode search report")?;
            println!("{json}");
        }
        OutputFormat::Text if quiet => {
            for r in &reports {
                println!("{}\t{}\t{}", r.n, r.length, r.payload);
            }
        }
        OutputFormat::Text => {
            println!();
            println!(
                "{} {} candidate(s)",
                "Found".green().bold(),
                reports.len()
            );
            if reports.len() > 1 {
                println!(
                    "{}",
                    "Several group sizes decode consistently; the right one is usually the readable one"
                        .dimmed()
                );
            }
            println!();
            for r in &reports {
                println!(
                    "   {} {:<3} {} {:<5} {} {:<6} {}",
                    "n:".dimmed(),
                    r.n,
                    "base:".dimmed(),
                    r.base,
                    "bytes:".dimmed(),
                    r.length,
                    r.payload
                );
            }
            println!();
        }
    }

    Ok(())
}
