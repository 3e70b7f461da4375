//! pdfslicer CLI - list and export the sections of indexed PDF bundles

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_slicer::render::{blocks_to_json, sections_from_json, sections_to_json, sections_to_text};
use pdf_slicer::{
    extract_blocks, extract_index, sanitize_filename, JsonFormat, Section, Slicer, SlicerOptions,
    DEFAULT_FILENAME_LIMIT,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdfslicer")]
#[command(version)]
#[command(about = "List and export the sub-documents of indexed PDF bundles", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE", env = "PDFSLICER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the sections of a PDF
    Sections {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List the summary entries without resolving pages
    Index {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Dump the filtered text blocks of every page as JSON
    Blocks {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Export one page range as a new PDF
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// First page (1-based)
        #[arg(long)]
        start: u32,

        /// Last page (inclusive)
        #[arg(long)]
        end: u32,

        /// Output file (defaults to <name>_<start>-<end>.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Export resolved sections as a ZIP archive
    Export {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only export these section ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// Use sections from a JSON file instead of resolving them again
        #[arg(long, value_name = "FILE")]
        sections: Option<PathBuf>,

        /// Output archive (defaults to <case number>_fatiado.zip)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the case number of a PDF
    ProcessNumber {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print a file-system-safe version of a text
    Sanitize {
        /// Text to sanitize
        text: String,

        /// Maximum length before the extension
        #[arg(long, default_value_t = DEFAULT_FILENAME_LIMIT)]
        limit: usize,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let options = match load_options(cli.config.as_deref()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&options.log_level))
        .init();

    let slicer = Slicer::new().with_options(options);

    let result = match cli.command {
        Commands::Sections {
            input,
            json,
            compact,
            output,
        } => cmd_sections(&slicer, &input, json, compact, output.as_deref()),
        Commands::Index { input, json } => cmd_index(&input, json),
        Commands::Blocks {
            input,
            compact,
            output,
        } => cmd_blocks(&input, compact, output.as_deref()),
        Commands::Extract {
            input,
            start,
            end,
            output,
        } => cmd_extract(&slicer, &input, start, end, output.as_deref()),
        Commands::Export {
            input,
            ids,
            sections,
            output,
        } => cmd_export(&slicer, &input, &ids, sections.as_deref(), output.as_deref()),
        Commands::ProcessNumber { input } => {
            println!("{}", pdf_slicer::extract_process_number(&input));
            Ok(())
        }
        Commands::Sanitize { text, limit } => {
            println!("{}", sanitize_filename(&text, limit));
            Ok(())
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_options(path: Option<&Path>) -> pdf_slicer::Result<SlicerOptions> {
    match path {
        Some(path) => SlicerOptions::from_json_file(path),
        None => Ok(SlicerOptions::default()),
    }
}

/// Pipeline run with a progress bar on stderr.
fn resolve_with_progress(slicer: &Slicer, input: &Path) -> Vec<Section> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message("Scanning pages...");

    let mut on_progress = |current: usize, total: usize| {
        pb.set_length(total as u64);
        pb.set_position(current as u64);
    };
    let sections = slicer.sections(input, Some(&mut on_progress));

    pb.finish_and_clear();
    sections
}

fn write_or_print(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_sections(
    slicer: &Slicer,
    input: &Path,
    json: bool,
    compact: bool,
    output: Option<&Path>,
) -> CliResult {
    let sections = resolve_with_progress(slicer, input);

    if json || compact {
        return write_or_print(output, &sections_to_json(&sections, json_format(compact))?);
    }
    if output.is_some() {
        return write_or_print(output, &sections_to_text(&sections));
    }

    if sections.is_empty() {
        println!("{}", "No sections found".yellow());
        return Ok(());
    }

    let resolved = sections.iter().filter(|s| s.has_range()).count();
    println!(
        "{} {} sections, {} with pages",
        "Found".green().bold(),
        sections.len(),
        resolved
    );
    println!("{}", "─".repeat(60).dimmed());

    for section in &sections {
        let pages = match section.range() {
            Some((start, end)) => format!("{:>4}-{:<4}", start, end),
            None => format!("{:^9}", "-"),
        };
        let line = format!(
            "{} {:<12} {:<16} {}",
            pages, section.id, section.date, section.document_title
        );
        if section.has_range() {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }

    Ok(())
}

fn cmd_index(input: &Path, json: bool) -> CliResult {
    let entries = extract_index(input);
    if json {
        println!("{}", sections_to_json(&entries, JsonFormat::Pretty)?);
    } else {
        print!("{}", sections_to_text(&entries));
    }
    Ok(())
}

fn cmd_blocks(input: &Path, compact: bool, output: Option<&Path>) -> CliResult {
    let records = extract_blocks(input, None);
    write_or_print(output, &blocks_to_json(&records, json_format(compact))?)
}

fn cmd_extract(
    slicer: &Slicer,
    input: &Path,
    start: u32,
    end: u32,
    output: Option<&Path>,
) -> CliResult {
    let pdf = slicer.extract_range(input, start, end)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_range_output(input, start, end));
    fs::write(&output, &pdf)?;

    println!(
        "{} pages {}-{} to {}",
        "Extracted".green().bold(),
        start,
        end,
        output.display()
    );
    Ok(())
}

fn cmd_export(
    slicer: &Slicer,
    input: &Path,
    ids: &[String],
    sections_file: Option<&Path>,
    output: Option<&Path>,
) -> CliResult {
    let sections = match sections_file {
        Some(path) => sections_from_json(&fs::read_to_string(path)?)?,
        None => resolve_with_progress(slicer, input),
    };

    let selected = select_sections(sections, ids);
    if selected.is_empty() {
        return Err("no resolved sections to export".into());
    }

    let report = slicer.export(input, &selected)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(slicer.archive_name(input)));
    fs::write(&output, &report.archive)?;

    println!(
        "{} {} sections to {}",
        "Exported".green().bold(),
        report.written.len(),
        output.display()
    );
    for name in &report.written {
        println!("  {} {}", "├─".dimmed(), name);
    }
    if !report.is_complete() {
        println!(
            "{} skipped: {}",
            "Warning".yellow().bold(),
            report.skipped.join(", ")
        );
    }

    Ok(())
}

/// Sections with a range, restricted to `ids` when given, in list order.
fn select_sections(sections: Vec<Section>, ids: &[String]) -> Vec<Section> {
    sections
        .into_iter()
        .filter(|s| s.has_range())
        .filter(|s| ids.is_empty() || ids.iter().any(|id| id.trim() == s.id))
        .collect()
}

fn default_range_output(input: &Path, start: u32, end: u32) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("{}_{}-{}.pdf", stem, start, end))
}

fn cmd_version() {
    println!("{} {}", "pdfslicer".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Split indexed PDF bundles into their sub-documents");
    println!();
    println!("License: MIT");
}
