// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: bitmap preprocessing, the OCR engine seam, model
// selection with fallback, and the optional `ocrs` backend.

pub mod controller;
pub mod engine;
pub mod preprocess;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use controller::{OcrModelController, OcrOutcome, OcrStatus, RecognitionPlan, select_models};
pub use engine::{DecodeStrategy, ModelHandle, ModelProfiles, OcrEngine, OcrModelProfile};
pub use preprocess::OcrPreprocessor;

#[cfg(feature = "ocr")]
pub use ocr::OcrsEngine;
