//! Scan command - read a single monitor photo through the vision provider.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use bpscan_core::models::config::{BpscanConfig, PromptMode, ProviderKind};
use bpscan_core::payload::ImagePayload;
use bpscan_core::reading::ReadingExtractor;
use bpscan_core::scan::{ScanOutcome, ScanReport, Scanner};
use bpscan_core::vision::VisionClient;

use super::config;
use super::extract::{csv_row, format_result, OutputFormat};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Monitor photo (JPEG, PNG, WebP, GIF or BMP)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Vision provider (overrides configuration)
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Ask the provider for a description or for JSON
    #[arg(long, value_enum)]
    prompt_mode: Option<PromptModeArg>,

    /// Print the provider's raw text to stderr
    #[arg(long)]
    show_text: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum PromptModeArg {
    /// Free-text description of the display
    Describe,
    /// Structured {"sys","dia","pulse"} reply
    Json,
}

impl From<PromptModeArg> for PromptMode {
    fn from(arg: PromptModeArg) -> Self {
        match arg {
            PromptModeArg::Describe => PromptMode::Describe,
            PromptModeArg::Json => PromptMode::Json,
        }
    }
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = config::load(config_path)?;
    if let Some(provider) = args.provider {
        config.vision.provider = provider;
    }
    if let Some(mode) = args.prompt_mode {
        config.vision.prompt_mode = mode.into();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Scanning file: {}", args.input.display());

    let image = ImagePayload::from_bytes(fs::read(&args.input)?, config.vision.max_image_kb)?;
    let scanner = build_scanner(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Asking {} ({})...",
        scanner.client().provider().name(),
        scanner.client().model()
    ));

    let report = scanner.scan(&image).await;
    pb.finish_and_clear();
    let report = report?;

    if args.show_text {
        if let Some(text) = report.outcome.text() {
            eprintln!("{}", style("Provider text:").dim());
            eprintln!("{}", text);
            eprintln!();
        }
    }

    print_outcome_notice(&report.outcome);

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total scan time: {:?}", start.elapsed());

    Ok(())
}

/// Build a scanner from configuration, reading the API key from the environment.
pub fn build_scanner(config: &BpscanConfig) -> anyhow::Result<Scanner> {
    let provider = config.vision.provider;
    let client = VisionClient::from_env(config.vision.clone()).map_err(|e| {
        anyhow::anyhow!("{} (set {})", e, provider.api_key_env())
    })?;

    Ok(Scanner::new(
        client,
        ReadingExtractor::from_config(&config.extraction),
    ))
}

fn print_outcome_notice(outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::NoText => eprintln!(
            "{} The provider found no text in the image.",
            style("⚠").yellow()
        ),
        ScanOutcome::Unreadable { .. } => eprintln!(
            "{} Could not read the display clearly - try again with a clearer photo.",
            style("⚠").yellow()
        ),
        ScanOutcome::Read { result, .. } if !result.reading.is_complete() => eprintln!(
            "{} Partial reading: {}",
            style("ℹ").blue(),
            result.reading
        ),
        ScanOutcome::Read { .. } => {}
    }
}

/// Render a scan report. JSON carries the full report; CSV and text carry
/// the extraction result, which is empty when the provider returned no text.
pub fn format_report(report: &ScanReport, format: OutputFormat) -> anyhow::Result<String> {
    match (&report.outcome, format) {
        (_, OutputFormat::Json) => Ok(serde_json::to_string_pretty(report)?),
        (ScanOutcome::Unreadable { result, .. } | ScanOutcome::Read { result, .. }, _) => {
            format_result(result, format, false)
        }
        (ScanOutcome::NoText, OutputFormat::Csv) => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["sys", "dia", "pulse", "strategy", "confidence", "warnings"])?;
            wtr.write_record(["", "", "", "", "", "no text returned"])?;
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        (ScanOutcome::NoText, OutputFormat::Text) => Ok("No text found.\n".to_string()),
    }
}

/// Summary fields shared with the batch summary CSV.
pub fn summary_fields(outcome: &ScanOutcome) -> [String; 6] {
    match outcome {
        ScanOutcome::Unreadable { result, .. } | ScanOutcome::Read { result, .. } => {
            csv_row(result)
        }
        ScanOutcome::NoText => Default::default(),
    }
}
