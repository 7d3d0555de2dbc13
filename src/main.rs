//! blinder - Redact office documents

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use blinder::{
    ImageHash, KeywordStore, Outcome, RedactionOptions, ReplacementRule, Strategy,
    default_keywords, diff, extract_structure, list_images, preview, redact_file,
};

#[derive(Parser)]
#[command(name = "blinder")]
#[command(version, about = "Redact images, styling and sensitive terms from documents", long_about = None)]
#[command(after_help = "EXAMPLES:
    blinder redact report.docx                 Write report_blinded.docx
    blinder redact page.html -o clean.html     Redact to a chosen path
    blinder images report.docx                 List embedded images and their hashes
    blinder redact report.docx --select <HASH> Remove only the selected image")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Redact a document and write the result
    Redact {
        /// Input file (DOCX, HTML, or TXT)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (default: <stem>_blinded.<ext> next to the input)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        redaction: RedactionArgs,
    },
    /// Redact in memory and print before/after snapshots with their diff
    Preview {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        redaction: RedactionArgs,
    },
    /// Print the paragraph and table snapshot of a document
    Inspect {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// List embedded images with their content hashes
    Images {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Diff the snapshots of two documents
    Diff {
        #[arg(value_name = "ORIGINAL")]
        original: PathBuf,

        #[arg(value_name = "PROCESSED")]
        processed: PathBuf,
    },
}

#[derive(Args)]
struct RedactionArgs {
    /// Keyword file: {"keywords": [{"original", "replacement", "enabled"}]}
    #[arg(short, long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Full redaction options as JSON; flags below are applied on top
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Remove only images with this content hash (repeatable)
    #[arg(long = "select", value_name = "HASH")]
    select: Vec<ImageHash>,

    #[arg(long, value_name = "NAME")]
    font_name: Option<String>,

    /// Font size in points
    #[arg(long, value_name = "PT")]
    font_size: Option<u32>,

    /// Leave fonts as they are
    #[arg(long)]
    keep_fonts: bool,

    /// Leave text colors as they are
    #[arg(long)]
    keep_colors: bool,

    #[arg(long)]
    keep_shading: bool,

    #[arg(long)]
    keep_images: bool,

    #[arg(long)]
    keep_hyperlinks: bool,

    #[arg(long)]
    keep_borders: bool,

    #[arg(long)]
    keep_content_controls: bool,

    /// Keep paragraph styles, numbering and indents
    #[arg(long)]
    keep_styles: bool,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Structural,
    Tree,
}

impl RedactionArgs {
    fn redaction_options(&self) -> Result<RedactionOptions, String> {
        let mut options: RedactionOptions = match &self.options {
            Some(path) => read_json(path)?,
            None => RedactionOptions::default(),
        };
        if let Some(name) = &self.font_name {
            options.font_name = name.clone();
        }
        if let Some(size) = self.font_size {
            options.font_size = size;
        }
        options.standardize_fonts &= !self.keep_fonts;
        options.force_black_text &= !self.keep_colors;
        options.strip_shading &= !self.keep_shading;
        options.strip_images &= !self.keep_images;
        options.strip_hyperlinks &= !self.keep_hyperlinks;
        options.strip_borders &= !self.keep_borders;
        options.strip_content_controls &= !self.keep_content_controls;
        options.reset_paragraph_styles &= !self.keep_styles;
        if let Some(strategy) = self.strategy {
            options.strategy = match strategy {
                StrategyArg::Structural => Strategy::Structural,
                StrategyArg::Tree => Strategy::Tree,
            };
        }
        Ok(options)
    }

    fn replacement_rules(&self) -> Result<Vec<ReplacementRule>, String> {
        let store = match &self.rules {
            Some(path) => read_json::<KeywordStore>(path)?,
            None => KeywordStore {
                keywords: default_keywords(),
            },
        };
        Ok(store.rules())
    }

    fn selection(&self) -> Option<HashSet<ImageHash>> {
        (!self.select.is_empty()).then(|| self.select.iter().copied().collect())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Redact {
            input,
            output,
            redaction,
        } => {
            let report = redact_file(
                &input,
                output.as_deref(),
                &redaction.replacement_rules()?,
                redaction.selection().as_ref(),
                &redaction.redaction_options()?,
            )
            .map_err(|e| e.to_string())?;
            for warning in &report.result.warnings {
                eprintln!("warning: {warning}");
            }
            if let Outcome::CompletedWithWarnings(n) = report.result.outcome() {
                eprintln!("completed with {n} skipped node operations");
            }
            print_json(&report)
        }
        Command::Preview { input, redaction } => {
            let bytes = read(&input)?;
            let preview = preview(
                &bytes,
                &redaction.replacement_rules()?,
                redaction.selection().as_ref(),
                &redaction.redaction_options()?,
            )
            .map_err(|e| e.to_string())?;
            print_json(&preview)
        }
        Command::Inspect { input } => {
            let snapshot = extract_structure(&read(&input)?).map_err(|e| e.to_string())?;
            print_json(&snapshot)
        }
        Command::Images { input } => {
            let images = list_images(&read(&input)?).map_err(|e| e.to_string())?;
            print_json(&images)
        }
        Command::Diff {
            original,
            processed,
        } => {
            let pre = extract_structure(&read(&original)?).map_err(|e| e.to_string())?;
            let post = extract_structure(&read(&processed)?).map_err(|e| e.to_string())?;
            print_json(&diff(&pre, &post))
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let bytes = read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| format!("{}: {e}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
