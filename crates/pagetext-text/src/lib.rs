// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagetext-text: Pure text passes for extracted page text.
//
// Quality gates deciding between native text and OCR, the two cleaning passes
// (OCR output vs. native text layer), and the format-preserving segmenter that
// turns a flattened line back into indentation plus text/whitespace runs.

pub mod normalize;
pub mod paragraphs;
pub mod segment;
pub mod validate;

pub use normalize::{clean_native_text, clean_ocr_text};
pub use paragraphs::{PageTextExt, ParagraphLine, formatted_paragraphs, split_into_paragraphs};
pub use segment::{FormattedLine, LineType, SegmentType, TextSegment, process_line, process_text};
pub use validate::QualityGate;
