// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR model controller: owns the FAST and BEST handles and decides which one
// recognises a page.

use image::DynamicImage;
use pagetext_core::{OcrModel, RecognitionError, TextBlock};
use pagetext_text::{QualityGate, clean_ocr_text};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "ocr")]
use crate::scan::engine::ModelProfiles;
use crate::scan::engine::{ModelHandle, OcrEngine};

/// Which profile recognises first, and which (if any) gets one retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionPlan {
    pub primary: OcrModel,
    pub fallback: Option<OcrModel>,
}

/// Pick the models for one page.
///
/// * FAST requested and loaded: FAST first, BEST as fallback when loaded.
/// * BEST requested and loaded: BEST only.
/// * Requested model missing: whichever is loaded, FAST preferred, no fallback.
/// * Nothing loaded: `None`, OCR is off.
pub fn select_models(requested: OcrModel, fast: bool, best: bool) -> Option<RecognitionPlan> {
    let plan = |primary, fallback| Some(RecognitionPlan { primary, fallback });
    match requested {
        OcrModel::Fast if fast => plan(OcrModel::Fast, best.then_some(OcrModel::Best)),
        OcrModel::Best if best => plan(OcrModel::Best, None),
        _ if fast => plan(OcrModel::Fast, None),
        _ if best => plan(OcrModel::Best, None),
        _ => None,
    }
}

/// Raw recogniser output for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOutcome {
    /// Text as returned by the engine, before cleaning.
    pub text: String,
    /// Model whose result was kept.
    pub model: OcrModel,
    /// Recognition calls made, 1 or 2.
    pub attempts: usize,
}

/// Which profiles are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OcrStatus {
    pub fast: bool,
    pub best: bool,
}

impl std::fmt::Display for OcrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.fast, self.best) {
            (true, true) => f.write_str("fast and best models loaded"),
            (true, false) => f.write_str("fast model loaded"),
            (false, true) => f.write_str("best model loaded"),
            (false, false) => f.write_str("OCR disabled (no model loaded)"),
        }
    }
}

/// Holds the two optional model handles.
///
/// Availability is fixed at construction and changes only through
/// [`reinitialize`](Self::reinitialize).
#[derive(Debug, Default)]
pub struct OcrModelController {
    fast: Option<ModelHandle>,
    best: Option<ModelHandle>,
}

impl OcrModelController {
    /// Build from injected engines. `None` marks a profile as unavailable.
    pub fn with_engines(fast: Option<Box<dyn OcrEngine>>, best: Option<Box<dyn OcrEngine>>) -> Self {
        let controller = Self {
            fast: fast.map(|engine| ModelHandle::new(OcrModel::Fast, engine)),
            best: best.map(|engine| ModelHandle::new(OcrModel::Best, engine)),
        };
        info!(status = %controller.status(), "OCR controller ready");
        controller
    }

    /// A controller with OCR switched off.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Load both `ocrs` profiles. A profile that fails to load is left
    /// unavailable and logged; this never fails as a whole.
    #[cfg(feature = "ocr")]
    #[instrument(skip_all)]
    pub fn load(profiles: &ModelProfiles) -> Self {
        use crate::scan::ocr::OcrsEngine;

        let load = |model: OcrModel| -> Option<Box<dyn OcrEngine>> {
            match OcrsEngine::from_profile(profiles.get(model)) {
                Ok(engine) => Some(Box::new(engine)),
                Err(err) => {
                    warn!(%model, %err, "OCR model unavailable");
                    None
                }
            }
        };
        Self::with_engines(load(OcrModel::Fast), load(OcrModel::Best))
    }

    pub fn is_available(&self, model: OcrModel) -> bool {
        self.handle(model).is_some()
    }

    pub fn any_available(&self) -> bool {
        self.fast.is_some() || self.best.is_some()
    }

    pub fn status(&self) -> OcrStatus {
        OcrStatus {
            fast: self.fast.is_some(),
            best: self.best.is_some(),
        }
    }

    /// Replace one handle, or clear it with `None`.
    pub fn reinitialize(&mut self, model: OcrModel, engine: Option<Box<dyn OcrEngine>>) {
        let handle = engine.map(|engine| ModelHandle::new(model, engine));
        match model {
            OcrModel::Fast => self.fast = handle,
            OcrModel::Best => self.best = handle,
        }
        info!(%model, status = %self.status(), "OCR model re-initialised");
    }

    pub fn plan(&self, requested: OcrModel) -> Option<RecognitionPlan> {
        select_models(
            requested,
            self.is_available(OcrModel::Fast),
            self.is_available(OcrModel::Best),
        )
    }

    /// Recognise a page, escalating at most once.
    ///
    /// When a fallback exists, an engine error on the primary model counts as
    /// an invalid result, and validity is judged on the cleaned text. The
    /// fallback's result is kept whatever its quality. Without a fallback the
    /// primary's error is returned.
    #[instrument(skip_all, fields(requested = %requested))]
    pub fn recognize(
        &self,
        image: &DynamicImage,
        requested: OcrModel,
        gate: &QualityGate,
    ) -> Result<OcrOutcome, RecognitionError> {
        let plan = self
            .plan(requested)
            .ok_or(RecognitionError::Unavailable(requested))?;
        let primary = self.call(plan.primary, image);

        let Some(fallback) = plan.fallback else {
            return primary.map(|text| OcrOutcome {
                text,
                model: plan.primary,
                attempts: 1,
            });
        };

        match primary {
            Ok(text) if gate.is_valid_text(&clean_ocr_text(&text)) => {
                return Ok(OcrOutcome {
                    text,
                    model: plan.primary,
                    attempts: 1,
                });
            }
            Ok(_) => debug!(primary = %plan.primary, %fallback, "Primary result invalid, escalating"),
            Err(err) => warn!(primary = %plan.primary, %fallback, %err, "Primary model failed, escalating"),
        }

        let text = self.call(fallback, image)?;
        Ok(OcrOutcome {
            text,
            model: fallback,
            attempts: 2,
        })
    }

    /// Line blocks from the given model.
    pub fn recognize_blocks(
        &self,
        image: &DynamicImage,
        model: OcrModel,
    ) -> Result<Vec<TextBlock>, RecognitionError> {
        self.handle(model)
            .ok_or(RecognitionError::Unavailable(model))?
            .recognize_blocks(image)
    }

    fn call(&self, model: OcrModel, image: &DynamicImage) -> Result<String, RecognitionError> {
        self.handle(model)
            .ok_or(RecognitionError::Unavailable(model))?
            .recognize(image)
    }

    fn handle(&self, model: OcrModel) -> Option<&ModelHandle> {
        match model {
            OcrModel::Fast => self.fast.as_ref(),
            OcrModel::Best => self.best.as_ref(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pagetext_core::BlockBounds;

    use super::*;

    /// Engine returning a fixed result and counting its calls.
    pub struct ScriptedEngine {
        pub result: Result<String, RecognitionError>,
        pub calls: Arc<AtomicUsize>,
    }

    impl ScriptedEngine {
        pub fn text(text: &str) -> (Box<dyn OcrEngine>, Arc<AtomicUsize>) {
            Self::boxed(Ok(text.to_string()))
        }

        pub fn failing(model: OcrModel) -> (Box<dyn OcrEngine>, Arc<AtomicUsize>) {
            Self::boxed(Err(RecognitionError::engine(model, "scripted failure")))
        }

        fn boxed(result: Result<String, RecognitionError>) -> (Box<dyn OcrEngine>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let engine = Self {
                result,
                calls: calls.clone(),
            };
            (Box::new(engine), calls)
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, RecognitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        /// Lines stacked in 20 px bands from the top-left corner.
        fn recognize_blocks(&self, _image: &DynamicImage) -> Result<Vec<TextBlock>, RecognitionError> {
            let text = self.result.clone()?;
            let blocks = text
                .lines()
                .enumerate()
                .map(|(row, line)| {
                    let bounds = BlockBounds {
                        x: 0.0,
                        y: row as f32 * 20.0,
                        width: line.chars().count() as f32 * 10.0,
                        height: 20.0,
                    };
                    TextBlock::with_bounds(line, bounds)
                })
                .collect();
            Ok(blocks)
        }
    }

    pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }
}
