//! # histline CLI - Recover files from editor local history
//!
//! Command-line interface for the histline library.
//!
//! ## Features
//! - List the files recorded in the local history
//! - Show every saved version of a file
//! - Export one version of a file
//! - Rebuild a directory from its latest snapshots, or as it was at a past time
//!
//! ## Usage
//! ```bash
//! # List tracked files under a project
//! histline list --directory ~/code/project
//!
//! # Rebuild the project as it was on June 27th
//! histline reconstruct ~/code/project --output ./recovered --at 2025-06-27
//!
//! # Show versions of a file, then export the third newest
//! histline versions ~/code/project/src/main.rs
//! histline export ~/code/project/src/main.rs --output ./main.rs --version 2
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use histline::utils::{format_bytes, truncate_path};
use histline::{parse_timestamp, ExtractorBuilder, ReconstructProgress, Result, TimelineExtractor};
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// histline CLI - Extract and reconstruct files from editor local history
#[derive(Parser)]
#[command(name = "histline")]
#[command(version)]
#[command(about = "Extract and reconstruct files from VS Code's Timeline / local history")]
#[command(after_help = "Default timeline paths:
  macOS:   ~/Library/Application Support/Code/User/History
  Linux:   ~/.config/Code/User/History
  Windows: %APPDATA%/Code/User/History")]
struct Cli {
    /// Path to the timeline directory (default: auto-detect)
    #[arg(short, long, global = true)]
    timeline_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List files in the timeline
    #[command(alias = "ls")]
    List {
        /// Filter by directory path
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Maximum number of files to list (0 = all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Reconstruct a directory from timeline versions
    Reconstruct {
        /// Source directory to reconstruct
        source: PathBuf,

        /// Output directory (default: output/<source name>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the metadata JSON export
        #[arg(long)]
        no_metadata: bool,

        /// Reconstruct as of this time: ISO date-time, date, or Unix timestamp
        #[arg(long)]
        at: Option<String>,

        /// Show progress
        #[arg(long)]
        progress: bool,
    },

    /// Show all versions of a file
    Versions {
        /// File path to look up
        file: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Export one version of a file
    Export {
        /// File path to export
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Version index to export (0 = latest)
        #[arg(long = "version", default_value = "0")]
        version_index: usize,
    },

    /// Show timeline information and statistics
    Info,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    let extractor = ExtractorBuilder::new()
        .maybe_history_root(cli.timeline_path)
        .build()?;

    match cli.command {
        Commands::List { directory, limit, json } => {
            cmd_list(&extractor, directory.as_deref(), limit, json)
        }
        Commands::Reconstruct { source, output, no_metadata, at, progress } => {
            cmd_reconstruct(&extractor, &source, output, !no_metadata, at.as_deref(), progress)
        }
        Commands::Versions { file, json } => cmd_versions(&extractor, &file, json),
        Commands::Export { file, output, version_index } => {
            cmd_export(&extractor, &file, &output, version_index)
        }
        Commands::Info => cmd_info(&extractor),
    }
}

/// List tracked files, most recently saved first
fn cmd_list(
    extractor: &TimelineExtractor,
    directory: Option<&Path>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let files = extractor.list_files(directory, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("{}", "No files found in timeline.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} files:", files.len()).blue().bold());
    println!();

    for file in &files {
        let datetime = file.latest_datetime.as_deref().unwrap_or("Unknown");
        print!(
            "  [{} versions] {} - {}",
            format!("{:3}", file.versions).yellow(),
            datetime.dimmed(),
            file.path.cyan()
        );
        if let Some(source) = &file.latest_source {
            print!(" ({})", source.dimmed());
        }
        println!();
    }

    Ok(())
}

/// Rebuild a directory from the timeline
///
/// Every tracked file under `source` is copied from its latest version, or
/// from the version current at `--at`, into a mirrored tree under the output
/// directory. A `timeline_metadata.json` manifest records where each file
/// came from unless `--no-metadata` is given.
fn cmd_reconstruct(
    extractor: &TimelineExtractor,
    source: &Path,
    output: Option<PathBuf>,
    export_metadata: bool,
    at: Option<&str>,
    show_progress: bool,
) -> Result<()> {
    let at = at.map(parse_timestamp).transpose()?;
    let output = output.unwrap_or_else(|| default_output_dir(source));

    let mut options = extractor.reconstruct_options().export_metadata(export_metadata);
    options.at = at;

    println!("{}", "Reconstructing directory...".blue().bold());

    let start = Instant::now();
    let progress = if show_progress {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let callback = progress.as_ref().map(|pb| {
        move |p: ReconstructProgress| {
            pb.set_length(p.total as u64);
            pb.set_position(p.processed as u64);
            pb.set_message(truncate_path(&p.current_item, 50));
        }
    });
    let result = extractor.reconstruct_with_progress(source, &output, &options, callback)?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let duration = Duration::from_millis(start.elapsed().as_millis() as u64);

    println!("{} Successfully reconstructed directory", "✓".green().bold());
    if let Some(reconstructed_at) = &result.reconstructed_at {
        println!("  Reconstructed at: {}", reconstructed_at.cyan());
    }
    println!("  Output: {}", result.output_directory.display().to_string().cyan());
    println!("  Files processed: {}", result.files_processed);
    if let Some(skipped) = result.skipped_files.filter(|s| *s > 0) {
        println!("  Files skipped (didn't exist at that time): {}", skipped);
    }
    println!("  Time: {}", format_duration(duration));

    if !result.errors.is_empty() {
        println!(
            "\n{}",
            format!("Warnings ({}):", result.errors.len()).yellow().bold()
        );
        for error in &result.errors {
            println!("  - {}: {}", error.file, error.error.yellow());
        }
    }

    if export_metadata && result.files_processed > 0 {
        println!(
            "\n  Metadata exported to: {}",
            result
                .output_directory
                .join(&extractor.config().manifest_file_name)
                .display()
        );
    }

    Ok(())
}

/// Show every version of one file, newest first
fn cmd_versions(extractor: &TimelineExtractor, file: &Path, json: bool) -> Result<()> {
    let versions = extractor.get_versions(&file.to_string_lossy())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    println!("{} {}", "File:".bold(), versions.original_path.cyan());
    println!("{} {}", "Timeline directory:".bold(), versions.storage_dir.display());
    println!();
    println!("{}", format!("Versions ({}):", versions.versions.len()).blue().bold());
    println!();

    for (i, version) in versions.versions.iter().enumerate() {
        print!(
            "  [{}] {} (ID: {})",
            i.to_string().yellow(),
            version.datetime,
            version.id.dimmed()
        );
        if let Some(source) = &version.source {
            print!(" - {}", source.cyan());
        }
        if let Some(description) = &version.source_description {
            print!(" ({})", description);
        }
        println!();
    }

    Ok(())
}

/// Export one version of a file
fn cmd_export(
    extractor: &TimelineExtractor,
    file: &Path,
    output: &Path,
    version_index: usize,
) -> Result<()> {
    let result = extractor.export_version(&file.to_string_lossy(), output, version_index)?;

    println!(
        "{} Exported file to: {}",
        "✓".green().bold(),
        result.output_path.display().to_string().cyan()
    );
    println!("  Version: {}", result.version.datetime);
    println!("  Hash: {}", result.file_hash.dimmed());

    Ok(())
}

/// Show statistics about the history store
fn cmd_info(extractor: &TimelineExtractor) -> Result<()> {
    let stats = extractor.statistics();

    println!("{}", "Timeline Information".blue().bold());
    println!();
    println!("  Timeline path: {}", extractor.history_root().display().to_string().cyan());
    println!("  Total files: {}", stats.total_files);

    if stats.total_files == 0 {
        return Ok(());
    }

    println!("  Total versions: {}", stats.total_versions);
    println!("  Average versions per file: {:.1}", stats.average_versions);

    let usage = extractor.disk_usage()?;
    println!(
        "  Size on disk: {} ({} files)",
        format_bytes(usage.total_size),
        usage.files
    );

    let catalog = extractor.catalog();

    println!("\n{}", "Files with most versions:".bold());
    for file in catalog.most_versioned(5) {
        println!(
            "  [{}] {}",
            format!("{:3}", file.version_count()).yellow(),
            truncate_path(&file.path, 70)
        );
    }

    println!("\n{}", "Most recently modified:".bold());
    for file in catalog.most_recent(5) {
        if let Some(latest) = file.latest() {
            println!(
                "  {} - {}",
                latest.datetime().dimmed(),
                truncate_path(&file.path, 70)
            );
        }
    }

    Ok(())
}

fn default_output_dir(source: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) => Path::new("output").join(name),
        None => PathBuf::from("output"),
    }
}
