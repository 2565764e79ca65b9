// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text quality gates. Both predicates are pure and depend only on the two
// thresholds carried by `QualityGate`.

use pagetext_core::ExtractionConfig;

/// Upper bound on the number of meaningful characters a valid text must carry.
const MEANINGFUL_CHAR_CAP: f32 = 5.0;

/// Thresholds deciding whether a text is usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    pub min_text_length: usize,
    pub min_meaningful_ratio: f32,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl QualityGate {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_text_length: config.min_text_length,
            min_meaningful_ratio: config.min_meaningful_ratio,
        }
    }

    /// True when the native text layer is too weak to stand on its own.
    ///
    /// Holds for empty text, text shorter than `min_text_length` characters,
    /// and text made only of whitespace, punctuation, or symbols.
    pub fn should_use_ocr(&self, native_text: &str) -> bool {
        self.is_insufficient(native_text)
    }

    /// True when a candidate text is good enough to keep.
    ///
    /// Besides passing the same checks as [`should_use_ocr`](Self::should_use_ocr),
    /// the text needs at least `min(5, ratio * length)` letters, digits, or
    /// ideographs.
    pub fn is_valid_text(&self, candidate: &str) -> bool {
        if self.is_insufficient(candidate) {
            return false;
        }
        let trimmed = candidate.trim();
        let length = trimmed.chars().count() as f32;
        let meaningful = trimmed.chars().filter(|c| is_meaningful_char(*c)).count() as f32;
        let required = MEANINGFUL_CHAR_CAP.min(self.min_meaningful_ratio * length);
        meaningful >= required
    }

    fn is_insufficient(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.is_empty()
            || trimmed.chars().count() < self.min_text_length
            || is_meaningless(trimmed)
    }
}

/// Letters, digits, and CJK ideographs count as meaningful.
pub fn is_meaningful_char(c: char) -> bool {
    c.is_alphanumeric() || is_cjk_ideograph(c)
}

/// True when `text` holds no meaningful character at all.
pub fn is_meaningless(text: &str) -> bool {
    !text.chars().any(is_meaningful_char)
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(
        c,
        '\u{3007}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
            | '\u{2A700}'..='\u{2EBEF}'
    )
}
