// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine seam and model profiles.
//
// A recognition backend is anything implementing `OcrEngine`. Engines are not
// assumed to be reentrant: each one lives behind a `ModelHandle`, whose mutex
// serialises every call made through it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;
use pagetext_core::{OcrModel, PageTextError, RecognitionError, TextBlock};
use tracing::{debug, instrument};

/// Well-known filenames for the detection and recognition models.
pub const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
pub const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Beam width used by the accurate profile.
pub const BEST_BEAM_WIDTH: u32 = 100;

/// A recognition primitive bound to one model profile.
pub trait OcrEngine: Send {
    /// Recognise all text in `image`, lines separated by `\n`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, RecognitionError>;

    /// Line-level blocks for layout-aware consumers. Engines without layout
    /// information return no blocks.
    fn recognize_blocks(&self, _image: &DynamicImage) -> Result<Vec<TextBlock>, RecognitionError> {
        Ok(Vec::new())
    }
}

/// How the recogniser turns per-frame character scores into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Greedy,
    BeamSearch { width: u32 },
}

/// Recognition parameters of one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrModelProfile {
    pub model: OcrModel,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    pub model_dir: PathBuf,
    pub decode: DecodeStrategy,
    /// Restrict output to these characters; `None` allows the full alphabet.
    pub allowed_chars: Option<String>,
}

impl OcrModelProfile {
    /// Quick greedy decoding.
    pub fn fast(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model: OcrModel::Fast,
            model_dir: model_dir.into(),
            decode: DecodeStrategy::Greedy,
            allowed_chars: None,
        }
    }

    /// Beam-search decoding.
    pub fn best(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model: OcrModel::Best,
            model_dir: model_dir.into(),
            decode: DecodeStrategy::BeamSearch {
                width: BEST_BEAM_WIDTH,
            },
            allowed_chars: None,
        }
    }

    pub fn with_allowed_chars(mut self, chars: impl Into<String>) -> Self {
        self.allowed_chars = Some(chars.into());
        self
    }

    pub fn detection_model_path(&self) -> PathBuf {
        self.model_dir.join(DETECTION_MODEL_FILENAME)
    }

    pub fn recognition_model_path(&self) -> PathBuf {
        self.model_dir.join(RECOGNITION_MODEL_FILENAME)
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<(), PageTextError> {
        for path in [self.detection_model_path(), self.recognition_model_path()] {
            if !path.exists() {
                return Err(PageTextError::ModelLoad(format!(
                    "{} model file not found at {}; run `ocrs-cli` once to download models",
                    self.model,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// The two fixed profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfiles {
    pub fast: OcrModelProfile,
    pub best: OcrModelProfile,
}

impl Default for ModelProfiles {
    /// Both profiles pointing at the default model cache directory.
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl ModelProfiles {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            fast: OcrModelProfile::fast(dir),
            best: OcrModelProfile::best(dir),
        }
    }

    pub fn get(&self, model: OcrModel) -> &OcrModelProfile {
        match model {
            OcrModel::Fast => &self.fast,
            OcrModel::Best => &self.best,
        }
    }
}

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// An engine plus the lock that serialises access to it.
pub struct ModelHandle {
    model: OcrModel,
    engine: Mutex<Box<dyn OcrEngine>>,
}

impl ModelHandle {
    pub fn new(model: OcrModel, engine: Box<dyn OcrEngine>) -> Self {
        Self {
            model,
            engine: Mutex::new(engine),
        }
    }

    pub fn model(&self) -> OcrModel {
        self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    pub fn recognize(&self, image: &DynamicImage) -> Result<String, RecognitionError> {
        let engine = self
            .engine
            .lock()
            .map_err(|_| RecognitionError::Poisoned(self.model))?;
        let text = engine.recognize(image)?;
        debug!(chars = text.chars().count(), "Recognition returned");
        Ok(text)
    }

    pub fn recognize_blocks(&self, image: &DynamicImage) -> Result<Vec<TextBlock>, RecognitionError> {
        let engine = self
            .engine
            .lock()
            .map_err(|_| RecognitionError::Poisoned(self.model))?;
        engine.recognize_blocks(image)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
