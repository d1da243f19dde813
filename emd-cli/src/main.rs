//! EMD CLI - hide and recover data in grayscale images.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;
mod exit_codes;
mod utils;

use commands::hide::PayloadSource;
use commands::search::SearchOptions;
use config::Config;
use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   No payload found, or general error
  64  Invalid parameter or argument
  65  Framing error (wrong group size or corrupted image)
  66  Cannot read input
  73  Payload exceeds image capacity
  74  Cannot write output
  75  Saturated pixel (retry with --compensate)";

#[derive(Parser)]
#[command(name = "emd")]
#[command(author, version, about = "EMD steganography for grayscale images", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print payloads and machine-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a text or file payload in a grayscale image
    Hide {
        /// Group size (pixels per digit)
        #[arg(short = 'n', long = "group-size", value_name = "N")]
        n: usize,

        /// Cover image
        #[arg(short, long, value_name = "IMAGE")]
        input: PathBuf,

        /// Text to hide
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// File whose bytes to hide
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Stego image path (defaults to <STEM>_EMD.<EXT>)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Step saturated pixels inward instead of failing
        #[arg(long)]
        compensate: bool,
    },

    /// Extract a payload hidden with a known group size
    Extract {
        /// Group size used when hiding
        #[arg(short = 'n', long = "group-size", value_name = "N")]
        n: usize,

        /// Stego image
        #[arg(short, long, value_name = "IMAGE")]
        input: PathBuf,

        /// Expected payload length in bytes (checked against the header)
        #[arg(short, long, value_name = "LENGTH")]
        length: Option<usize>,

        /// Write raw payload bytes to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show embedding capacity
    Info {
        /// Image to inspect
        #[arg(short, long, value_name = "IMAGE")]
        input: PathBuf,

        /// Group size (omit for a table over all searched sizes)
        #[arg(short = 'n', long = "group-size", value_name = "N")]
        n: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Find a payload without knowing the group size
    Search {
        /// Stego image
        #[arg(short, long, value_name = "IMAGE")]
        input: PathBuf,

        /// Reject headers declaring more than this many bytes
        #[arg(short = 'l', long = "max-length", value_name = "MAX_LENGTH")]
        max_length: Option<usize>,

        /// Largest group size to try
        #[arg(long, value_name = "N")]
        max_n: Option<usize>,

        /// Minimum share of printable characters
        #[arg(long, value_name = "RATIO", conflicts_with = "any_content")]
        min_printable: Option<f64>,

        /// Accept any payload with a consistent header
        #[arg(long)]
        any_content: bool,

        /// Stop at the smallest matching group size
        #[arg(long)]
        first: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: u8, config: &Config) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = config
        .log_filter
        .as_deref()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Hide {
            n,
            input,
            text,
            file,
            output,
            compensate,
        } => {
            let source = PayloadSource::from_args(text, file)?;
            commands::hide::execute(input, n, source, output, compensate, config, quiet)
        }
        Commands::Extract {
            n,
            input,
            length,
            output,
        } => commands::extract::execute(input, n, length, output, quiet),
        Commands::Info { input, n, format } => {
            commands::info::execute(input, n, format, config, quiet)
        }
        Commands::Search {
            input,
            max_length,
            max_n,
            min_printable,
            any_content,
            first,
            format,
        } => {
            let options = SearchOptions {
                max_length,
                max_n,
                min_printable,
                any_content,
                first,
            };
            commands::search::execute(input, options, format, config, quiet)
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are reported as "errors" on stdout
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let config = Config::from_env();
    init_tracing(cli.verbose, &config);

    if let Err(err) = run(cli, &config) {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = &exit.message {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
