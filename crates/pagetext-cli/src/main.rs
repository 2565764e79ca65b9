// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagetext: command-line front end.
//
// Entry point. Initialises logging, builds the extraction config from a file
// and flags, loads whatever OCR models are available, and prints the pages.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use image::DynamicImage;
use pagetext_core::error::Result;
use pagetext_core::human_errors::humanize_error;
use pagetext_core::{ExtractionConfig, OcrModel, PageTextError};
use pagetext_document::{
    ExtractionOutcome, ImageProcessor, ModelProfiles, OcrModelController, PageTextExtractor,
    PdfReader,
};
use pagetext_text::process_text;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pagetext")]
#[command(version)]
#[command(about = "Extract page text from PDFs and scanned images, with OCR fallback", long_about = None)]
struct Cli {
    /// One PDF, or one or more images (each image is one page)
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// OCR profile to try first
    #[arg(long, value_parser = parse_model)]
    model: Option<OcrModel>,

    /// Texts shorter than this many characters are never accepted
    #[arg(long, value_name = "N")]
    min_text_length: Option<usize>,

    /// Share of characters that must be letters, digits, or ideographs
    #[arg(long, value_name = "R")]
    min_meaningful_ratio: Option<f32>,

    /// Resolution requested when rasterizing pages for OCR
    #[arg(long, value_name = "D")]
    dpi: Option<f32>,

    /// JSON extraction config; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Use native text layers only
    #[arg(long)]
    no_ocr: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Best text of each page under a page banner
    Text,
    /// Pages and the detection report as JSON
    Json,
    /// Reconstructed lines with visible indentation
    Layout,
}

fn parse_model(value: &str) -> std::result::Result<OcrModel, String> {
    value.parse()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {human}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let config = build_config(cli)?;
    let controller = Arc::new(build_controller(cli));
    let extractor = PageTextExtractor::new(config, controller)?;
    info!(
        model = %extractor.config().ocr_model,
        ocr = %extractor.controller().status(),
        inputs = cli.inputs.len(),
        "Starting extraction"
    );

    let outcome = if is_pdf(&cli.inputs) {
        let reader = PdfReader::open(&cli.inputs[0])?;
        // Page rasterization is not bundled: pages without a usable text
        // layer end up in the detection report.
        extractor.extract(reader.page_count(), Some(&reader), None)?
    } else {
        let images = load_images(&cli.inputs)?;
        extractor.extract_images(&images)?
    };

    render(&outcome, cli.format)
}

fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut config = match &cli.config {
        Some(path) => ExtractionConfig::load(path)?,
        None => ExtractionConfig::default(),
    };
    if let Some(model) = cli.model {
        config.ocr_model = model;
    }
    if let Some(length) = cli.min_text_length {
        config.min_text_length = length;
    }
    if let Some(ratio) = cli.min_meaningful_ratio {
        config.min_meaningful_ratio = ratio;
    }
    if let Some(dpi) = cli.dpi {
        config.ocr_dpi = dpi;
    }
    config.validate()?;
    Ok(config)
}

fn build_controller(cli: &Cli) -> OcrModelController {
    if cli.no_ocr {
        return OcrModelController::disabled();
    }
    let profiles = match &cli.model_dir {
        Some(dir) => ModelProfiles::from_dir(dir),
        None => ModelProfiles::default(),
    };
    load_models(&profiles)
}

#[cfg(feature = "ocr")]
fn load_models(profiles: &ModelProfiles) -> OcrModelController {
    let controller = OcrModelController::load(profiles);
    info!(status = %controller.status(), "OCR models");
    controller
}

#[cfg(not(feature = "ocr"))]
fn load_models(profiles: &ModelProfiles) -> OcrModelController {
    tracing::warn!(
        dir = %profiles.fast.model_dir.display(),
        "Built without the `ocr` feature, using native text only"
    );
    OcrModelController::disabled()
}

/// A single input with a `.pdf` extension is a document; anything else is a
/// list of page images.
fn is_pdf(inputs: &[PathBuf]) -> bool {
    matches!(inputs, [single] if has_pdf_extension(single))
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<DynamicImage>> {
    if let Some(pdf) = paths.iter().find(|path| has_pdf_extension(path)) {
        return Err(PageTextError::InvalidConfig(format!(
            "{} is a PDF; pass a PDF on its own, not mixed with images",
            pdf.display()
        )));
    }
    let images = paths
        .iter()
        .map(|path| ImageProcessor::open(path).map(ImageProcessor::into_dynamic))
        .collect::<Result<Vec<_>>>()?;
    info!(pages = images.len(), "Images loaded");
    Ok(images)
}

fn render(outcome: &ExtractionOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => Ok(render_pages(outcome, |text| text.to_string())),
        OutputFormat::Layout => Ok(render_pages(outcome, render_layout)),
    }
}

fn render_pages(outcome: &ExtractionOutcome, body: impl Fn(&str) -> String) -> String {
    let mut out = String::new();
    for page in &outcome.pages {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!(
            "=== Page {} ({}) ===\n",
            page.page_number() + 1,
            page.text_source().display_name()
        ));
        out.push_str(&body(page.best_text()));
        out.push('\n');
    }
    if let Some(summary) = outcome.report.summary() {
        out.push_str(&format!("\n{summary}\n"));
    }
    out.trim_end().to_string()
}

fn render_layout(text: &str) -> String {
    process_text(text)
        .iter()
        .map(|line| format!("{}{}", line.display_indent(), line.content.trim_end()))
        .collect::<Vec<_>>()
        .join("\n")
}
