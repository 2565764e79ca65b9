// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs` recognition backend.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// pagetext-document = { path = "crates/pagetext-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// Both profiles load the same two model files and differ only in decoding:
//
// - **Detection model** (`text-detection.rten`) locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`) decodes characters from detected regions.
//
// Running the `ocrs-cli` tool once downloads them to the default cache
// directory, `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).
//
// The `ocrs` and `rten` crates must be compiled in release mode. Debug builds
// are 10-100x slower.

use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as Ocrs, OcrEngineParams, OcrInput, TextItem};
use pagetext_core::{BlockBounds, OcrModel, PageTextError, RecognitionError, TextBlock};
use rten::Model;
use rten_imageproc::Rect;
use tracing::{debug, info, instrument};

use crate::scan::engine::{DecodeStrategy, OcrEngine, OcrModelProfile};

/// An `ocrs` engine loaded for one profile.
pub struct OcrsEngine {
    model: OcrModel,
    engine: Ocrs,
}

impl OcrsEngine {
    /// Load the detection and recognition models named by `profile`.
    ///
    /// Model loading is the expensive step; keep the engine and reuse it for
    /// every page.
    #[instrument(skip_all, fields(model = %profile.model, dir = %profile.model_dir.display()))]
    pub fn from_profile(profile: &OcrModelProfile) -> Result<Self, PageTextError> {
        profile.validate()?;

        info!("Loading OCR detection model");
        let detection_path = profile.detection_model_path();
        let detection_model = Model::load_file(&detection_path).map_err(|err| {
            PageTextError::ModelLoad(format!(
                "failed to load detection model from {}: {}",
                detection_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_path = profile.recognition_model_path();
        let recognition_model = Model::load_file(&recognition_path).map_err(|err| {
            PageTextError::ModelLoad(format!(
                "failed to load recognition model from {}: {}",
                recognition_path.display(),
                err
            ))
        })?;

        let decode_method = match profile.decode {
            DecodeStrategy::Greedy => DecodeMethod::Greedy,
            DecodeStrategy::BeamSearch { width } => DecodeMethod::BeamSearch { width },
        };

        let engine = Ocrs::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method,
            allowed_chars: profile.allowed_chars.clone(),
            ..Default::default()
        })
        .map_err(|err| {
            PageTextError::ModelLoad(format!("failed to initialise {} OCR engine: {}", profile.model, err))
        })?;

        info!("OCR engine initialised");
        Ok(Self {
            model: profile.model,
            engine,
        })
    }

    fn prepare(&self, image: &DynamicImage) -> Result<OcrInput, RecognitionError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            RecognitionError::engine(
                self.model,
                format!("failed to create image source ({}x{}): {}", width, height, err),
            )
        })?;

        self.engine
            .prepare_input(source)
            .map_err(|err| RecognitionError::engine(self.model, format!("input preparation failed: {err}")))
    }
}

impl OcrEngine for OcrsEngine {
    #[instrument(skip_all, fields(model = %self.model, width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognitionError> {
        let input = self.prepare(image)?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| RecognitionError::engine(self.model, format!("text recognition failed: {err}")))?;

        debug!(line_count = text.lines().count(), "OCR recognition complete");
        Ok(text)
    }

    /// One block per recognised, non-blank text line, positioned by the
    /// line's axis-aligned bounding box.
    #[instrument(skip_all, fields(model = %self.model))]
    fn recognize_blocks(&self, image: &DynamicImage) -> Result<Vec<TextBlock>, RecognitionError> {
        let input = self.prepare(image)?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| RecognitionError::engine(self.model, format!("word detection failed: {err}")))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| RecognitionError::engine(self.model, format!("line recognition failed: {err}")))?;

        let blocks: Vec<TextBlock> = line_texts
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                Some(TextBlock::with_bounds(text, line_bounds(line.bounding_rect())))
            })
            .collect();

        debug!(
            words = word_rects.len(),
            blocks = blocks.len(),
            "Layout-aware OCR complete"
        );
        Ok(blocks)
    }
}

fn line_bounds(rect: Rect) -> BlockBounds {
    BlockBounds {
        x: rect.left() as f32,
        y: rect.top() as f32,
        width: rect.width() as f32,
        height: rect.height() as f32,
    }
}
