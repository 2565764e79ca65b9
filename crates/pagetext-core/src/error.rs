// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for page text extraction.

use thiserror::Error;

use crate::types::OcrModel;

/// Failure of a single recognition call on one OCR handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("{model} OCR model failed: {detail}")]
    Engine { model: OcrModel, detail: String },

    #[error("{0} OCR model is not loaded")]
    Unavailable(OcrModel),

    #[error("{0} OCR model handle was poisoned by an earlier panic")]
    Poisoned(OcrModel),
}

impl RecognitionError {
    pub fn engine(model: OcrModel, detail: impl Into<String>) -> Self {
        Self::Engine {
            model,
            detail: detail.into(),
        }
    }

    /// The profile whose handle produced the error.
    pub fn model(&self) -> OcrModel {
        match self {
            Self::Engine { model, .. } => *model,
            Self::Unavailable(model) | Self::Poisoned(model) => *model,
        }
    }
}

/// Top-level error type for all extraction operations.
#[derive(Debug, Error)]
pub enum PageTextError {
    // -- Per-page collaborators --
    #[error("page {page} could not be rasterized: {detail}")]
    Rasterization { page: usize, detail: String },

    #[error("native text of page {page} could not be read: {detail}")]
    NativeText { page: usize, detail: String },

    #[error("OCR failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("image preprocessing failed: {0}")]
    Preprocessing(String),

    // -- Documents and models --
    #[error("failed to load OCR model: {0}")]
    ModelLoad(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("document unavailable: {0}")]
    DocumentUnavailable(String),

    #[error("extraction cancelled after {completed} page(s)")]
    Cancelled { completed: usize },

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PageTextError>;
