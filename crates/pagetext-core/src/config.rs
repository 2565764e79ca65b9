// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction configuration. Read once per batch, never mutated mid-batch.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PageTextError, Result};
use crate::types::OcrModel;

/// How the preprocessor's contrast stage treats pixel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContrastMode {
    /// Linear stretch of the luma range to 0..=255.
    #[default]
    Stretch,
    /// Leave pixel values untouched (legacy output compatibility).
    Passthrough,
}

/// Settings for one batch extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Profile requested for recognition.
    pub ocr_model: OcrModel,
    /// Texts shorter than this (in characters) are never accepted.
    pub min_text_length: usize,
    /// Share of characters that must be letters, digits, or ideographs.
    pub min_meaningful_ratio: f32,
    /// Resolution requested from the rasterizer for OCR.
    pub ocr_dpi: f32,
    /// Emit the batched failed-detection report to the log.
    pub report_detection_failures: bool,
    /// Ask the engine for line-level blocks on OCR pages.
    pub collect_text_blocks: bool,
    /// Contrast stage behaviour of the image preprocessor.
    pub contrast: ContrastMode,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_model: OcrModel::Fast,
            min_text_length: 10,
            min_meaningful_ratio: 0.3,
            ocr_dpi: 300.0,
            report_detection_failures: true,
            collect_text_blocks: false,
            contrast: ContrastMode::Stretch,
        }
    }
}

impl ExtractionConfig {
    /// Reject values that would make the quality gates or rasterizer meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.ocr_dpi.is_finite() || self.ocr_dpi <= 0.0 {
            return Err(PageTextError::InvalidConfig(format!(
                "ocr_dpi must be a positive number, got {}",
                self.ocr_dpi
            )));
        }
        if !(0.0..=1.0).contains(&self.min_meaningful_ratio) {
            return Err(PageTextError::InvalidConfig(format!(
                "min_meaningful_ratio must be within [0, 1], got {}",
                self.min_meaningful_ratio
            )));
        }
        Ok(())
    }

    /// Load a JSON config file. Missing keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Extraction config loaded");
        Ok(config)
    }

    /// Persist the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
