//! Extract command - read SYS/DIA/pulse from recognized text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use bpscan_core::reading::{ExtractionResult, ReadingExtractor};

use super::config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Text file to read (default: stdin, or "-")
    input: Option<PathBuf>,

    /// Text to extract from, instead of a file
    #[arg(short, long, conflicts_with = "input")]
    text: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include strategy, confidence and warnings in JSON output
    #[arg(long)]
    detailed: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = config::load(config_path)?;

    let text = match (&args.text, &args.input) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) if path.as_os_str() != "-" => fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    info!("Extracting from {} characters of text", text.len());

    let extractor = ReadingExtractor::from_config(&config.extraction);
    let result = extractor.extract_detailed(&text);

    if result.reading.is_empty() {
        eprintln!(
            "{} Could not read the display clearly - try again with a clearer photo.",
            style("⚠").yellow()
        );
    }

    let output = format_result(&result, args.format, args.detailed)?;

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

    Ok(())
}

/// Render an extraction result.
pub fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    detailed: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if detailed => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(&result.reading)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["sys", "dia", "pulse", "strategy", "confidence", "warnings"])?;
    wtr.write_record(csv_row(result))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// CSV fields for one result, matching [`format_csv`]'s header.
pub fn csv_row(result: &ExtractionResult) -> [String; 6] {
    let field = |v: Option<u16>| v.map(|v| v.to_string()).unwrap_or_default();
    [
        field(result.reading.sys),
        field(result.reading.dia),
        field(result.reading.pulse),
        result.strategy.map(|s| s.to_string()).unwrap_or_default(),
        format!("{:.2}", result.confidence),
        result
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join("; "),
    ]
}

fn format_text(result: &ExtractionResult) -> String {
    let reading = &result.reading;
    let show = |v: Option<u16>| v.map(|v| v.to_string()).unwrap_or_else(|| "--".to_string());

    let mut output = String::new();
    output.push_str(&format!("Systolic:  {} mmHg\n", show(reading.sys)));
    output.push_str(&format!("Diastolic: {} mmHg\n", show(reading.dia)));
    output.push_str(&format!("Pulse:     {} /min\n", show(reading.pulse)));

    if let Some(strategy) = result.strategy {
        output.push_str(&format!(
            "\nMatched by {} (confidence {:.0}%)\n",
            strategy,
            result.confidence * 100.0
        ));
    }

    for warning in &result.warnings {
        output.push_str(&format!("  - {}\n", warning));
    }

    output
}
