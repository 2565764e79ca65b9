// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagetext-document: Page-level extraction for pagetext.
//
// Provides the OCR bitmap preprocessor, the recognition engine seam with its
// FAST/BEST model controller, a lopdf-backed native text reader, image page
// sources, and the aggregator that decides per page between native text and
// OCR.

pub mod extract;
pub mod image;
pub mod pdf;
pub mod scan;
pub mod source;

// Re-export the primary structs so callers can use `pagetext_document::PdfReader` etc.
pub use extract::{ExtractionOutcome, PageTextExtractor};
pub use crate::image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use scan::controller::{OcrModelController, OcrOutcome, OcrStatus};
pub use scan::engine::{ModelProfiles, OcrEngine, OcrModelProfile};
pub use scan::preprocess::OcrPreprocessor;
pub use source::{ImagePages, NativeTextReader, Rasterizer};

#[cfg(feature = "async")]
pub use extract::spawn_extraction;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrsEngine;
