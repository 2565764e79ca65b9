// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for page text extraction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one extraction batch (used in log spans and reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two recognition profiles an OCR handle can be loaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrModel {
    /// Quick greedy decoding. Tried first; may be escalated to `Best`.
    #[default]
    Fast,
    /// Slower, more accurate decoding.
    Best,
}

impl OcrModel {
    /// The other profile (used when picking a fallback).
    pub fn other(self) -> Self {
        match self {
            Self::Fast => Self::Best,
            Self::Best => Self::Fast,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Best => "best",
        }
    }
}

impl std::fmt::Display for OcrModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OcrModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "best" => Ok(Self::Best),
            other => Err(format!("unknown OCR model '{other}' (expected fast or best)")),
        }
    }
}

/// Which extraction path produced the text used for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    /// Embedded text layer of the document.
    Native,
    /// Recognised from the page bitmap.
    Ocr,
    /// OCR text augmenting a native layer.
    Mixed,
}

impl TextSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Native => "native text",
            Self::Ocr => "OCR",
            Self::Mixed => "mixed",
        }
    }
}

/// Axis-aligned bounds of a text block, in bitmap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A structured OCR box. Optional; text output never depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BlockBounds>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bounds: None,
        }
    }

    /// A block positioned on the page bitmap.
    pub fn with_bounds(text: impl Into<String>, bounds: BlockBounds) -> Self {
        Self {
            text: text.into(),
            bounds: Some(bounds),
        }
    }
}

/// Extracted text of one page.
///
/// The text source is fixed by whichever constructor built the value and the
/// fields are only reachable through accessors, so a `PageText` is read-only
/// once the batch that produced it has returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    page_number: usize,
    native_text: String,
    ocr_text: String,
    text_source: TextSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    text_blocks: Vec<TextBlock>,
}

impl PageText {
    /// A page whose text comes from the embedded layer (possibly empty).
    pub fn native(page_number: usize, native_text: impl Into<String>) -> Self {
        Self {
            page_number,
            native_text: native_text.into(),
            ocr_text: String::new(),
            text_source: TextSource::Native,
            text_blocks: Vec::new(),
        }
    }

    /// A page whose text was recognised from its bitmap.
    pub fn ocr(
        page_number: usize,
        native_text: impl Into<String>,
        ocr_text: impl Into<String>,
        text_blocks: Vec<TextBlock>,
    ) -> Self {
        Self {
            page_number,
            native_text: native_text.into(),
            ocr_text: ocr_text.into(),
            text_source: TextSource::Ocr,
            text_blocks,
        }
    }

    /// A page carrying both a native layer and supplementary OCR text.
    pub fn mixed(
        page_number: usize,
        native_text: impl Into<String>,
        ocr_text: impl Into<String>,
    ) -> Self {
        Self {
            page_number,
            native_text: native_text.into(),
            ocr_text: ocr_text.into(),
            text_source: TextSource::Mixed,
            text_blocks: Vec::new(),
        }
    }

    /// 0-based page index within the document.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn native_text(&self) -> &str {
        &self.native_text
    }

    pub fn ocr_text(&self) -> &str {
        &self.ocr_text
    }

    pub fn text_source(&self) -> TextSource {
        self.text_source
    }

    pub fn text_blocks(&self) -> &[TextBlock] {
        &self.text_blocks
    }

    /// The text a consumer should display for this page.
    ///
    /// Prefers the field matching `text_source`, falling back to the other one
    /// when the preferred field is empty.
    pub fn best_text(&self) -> &str {
        let (preferred, fallback) = match self.text_source {
            TextSource::Native => (&self.native_text, &self.ocr_text),
            TextSource::Ocr | TextSource::Mixed => (&self.ocr_text, &self.native_text),
        };
        if preferred.is_empty() {
            fallback
        } else {
            preferred
        }
    }
}
