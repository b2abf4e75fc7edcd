//! Batch scanning command for multiple monitor photos.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use bpscan_core::payload::ImagePayload;
use bpscan_core::scan::{ScanReport, Scanner};

use super::config;
use super::extract::OutputFormat;
use super::scan::{build_scanner, format_report, summary_fields};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern (e.g. "photos/*.jpg")
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of scanning a single file.
struct FileResult {
    path: PathBuf,
    report: Option<ScanReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = config::load(config_path)?;

    let files = matching_images(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching images found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} images to scan",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let scanner = build_scanner(&config)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = scan_single_file(&path, &scanner, config.vision.max_image_kb).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(report) => results.push(FileResult {
                path,
                report: Some(report),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to scan {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        report: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to scan {}: {}", path.display(), error_msg);
                    overall_pb.abandon();
                    anyhow::bail!("Scanning failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            let Some(report) = &result.report else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("reading");
            let output_path =
                output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_report(report, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let read = results
        .iter()
        .filter(|r| r.report.as_ref().is_some_and(|r| r.outcome.status() == "read"))
        .count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Scanned {} images in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} read, {} unreadable, {} failed",
        style(read).green(),
        style(results.len() - read - failed.len()).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Expand a glob pattern, keeping only supported image files.
fn matching_images(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

async fn scan_single_file(
    path: &Path,
    scanner: &Scanner,
    max_image_kb: usize,
) -> anyhow::Result<ScanReport> {
    let image = ImagePayload::from_bytes(fs::read(path)?, max_image_kb)?;
    Ok(scanner.scan(&image).await?)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "sys",
        "dia",
        "pulse",
        "strategy",
        "confidence",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let (status, fields) = match &result.report {
            Some(report) => (report.outcome.status(), summary_fields(&report.outcome)),
            None => ("error", Default::default()),
        };
        let [sys, dia, pulse, strategy, confidence, warnings] = fields;

        wtr.write_record([
            filename,
            status,
            &sys,
            &dia,
            &pulse,
            &strategy,
            &confidence,
            &warnings,
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpscan_core::models::config::{PromptMode, ProviderKind};
    use bpscan_core::reading::ReadingExtractor;
    use bpscan_core::scan::ScanOutcome;
    use bpscan_core::vision::Transcription;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn file_result(name: &str, text: Option<&str>) -> FileResult {
        let report = text.map(|text| ScanReport {
            outcome: ScanOutcome::from_transcription(
                Transcription::from_text(text),
                &ReadingExtractor::new(),
                PromptMode::Describe,
            ),
            provider: ProviderKind::Gemini,
            model: "gemini-2.0-flash".to_string(),
            scanned_at: Utc::now(),
            processing_time_ms: 5,
        });
        FileResult {
            path: PathBuf::from(name),
            error: report.is_none().then(|| "HTTP error: timed out".to_string()),
            report,
            processing_time_ms: 7,
        }
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/monitor.JPG")));
        assert!(is_image(Path::new("monitor.webp")));
        assert!(!is_image(Path::new("notes.txt")));
        assert!(!is_image(Path::new("no_extension")));
    }

    #[test]
    fn test_matching_images_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "c.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pattern = format!("{}/*", dir.path().display());
        let files = matching_images(&pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_write_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");
        let results = vec![
            file_result("one.jpg", Some("118/76 PR 64")),
            file_result("two.jpg", Some("blurry")),
            file_result("three.jpg", None),
        ];

        write_summary(&path, &results).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "one.jpg,read,118,76,64,slash_pair,0.90,,7,");
        assert!(lines[2].starts_with("two.jpg,unreadable,,,,,0.00,no numeric content found,7,"));
        assert_eq!(lines[3], "three.jpg,error,,,,,,,7,HTTP error: timed out");
    }
}
