// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cleaning passes for extracted text.
//
// OCR output and native text layers have different failure modes, so the two
// passes are separate and must not be swapped: only OCR output gets artifact
// removal, whitespace-run paragraph breaks, and the confusable table.

use std::sync::LazyLock;

use regex::Regex;

/// Pipe and box-drawing glyphs the recogniser emits for table rules and gutters.
static OCR_ARTIFACTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|¦\x{2500}-\x{257F}]").expect("valid artifact regex"));

/// Three or more ASCII whitespace characters mark a paragraph gap.
static WHITESPACE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\n\r\x0B\x0C]{3,}").expect("valid gap regex"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid horizontal whitespace regex"));

/// Glyphs the recogniser confuses with Latin letters and digits.
///
/// ASCII `0` is deliberately absent: rewriting it corrupts numbers.
pub const OCR_CONFUSABLES: &[(char, &str)] = &[
    ('\u{FF10}', "O"), // full-width digit zero
    ('丨', "1"),
    ('〇', "O"),
];

/// Clean raw recogniser output.
pub fn clean_ocr_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let without_artifacts = OCR_ARTIFACTS.replace_all(raw, "");
    let gapped = WHITESPACE_GAP.replace_all(&without_artifacts, "\n\n");
    let trimmed_lines = trim_lines(&gapped, |c| c.is_ascii_whitespace());
    let collapsed = EXCESS_NEWLINES.replace_all(&trimmed_lines, "\n\n");
    let substituted = replace_confusables(&collapsed);

    substituted.trim_matches(|c: char| c.is_ascii_whitespace()).to_string()
}

/// Clean a native text layer.
///
/// Blank lines survive untouched because they separate paragraphs.
pub fn clean_native_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = HORIZONTAL_RUN.replace_all(&unified, " ");
    let trimmed_lines = trim_lines(&collapsed, |c| c == ' ' || c == '\t');

    trimmed_lines.trim_matches(|c: char| c.is_ascii_whitespace()).to_string()
}

fn replace_confusables(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match OCR_CONFUSABLES.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

fn trim_lines(text: &str, is_space: impl Fn(char) -> bool + Copy) -> String {
    text.split('\n')
        .map(|line| line.trim_matches(is_space))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_blank_input_becomes_empty() {
        assert_eq!(clean_ocr_text(""), "");
        assert_eq!(clean_ocr_text("  \n \t"), "");
    }

    #[test]
    fn ocr_removes_pipes_and_box_drawing() {
        assert_eq!(clean_ocr_text("│名稱|年齡┃"), "名稱年齡");
    }

    #[test]
    fn ocr_turns_wide_gaps_into_paragraph_breaks() {
        assert_eq!(clean_ocr_text("first   second"), "first\n\nsecond");
        assert_eq!(clean_ocr_text("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn ocr_strips_each_line() {
        assert_eq!(clean_ocr_text("  one\n two "), "one\ntwo");
    }

    #[test]
    fn ocr_applies_confusable_table_but_keeps_ascii_zero() {
        assert_eq!(clean_ocr_text("２０２４年 丨月 ０K"), "２O２４年 1月 OK");
        assert_eq!(clean_ocr_text("Room 101"), "Room 101");
        assert_eq!(clean_ocr_text("二〇二四"), "二O二四");
    }

    #[test]
    fn ocr_keeps_full_width_indent() {
        // U+3000 is not ASCII whitespace, so it is neither a gap nor stripped.
        assert_eq!(clean_ocr_text("　　段落"), "　　段落");
    }

    #[test]
    fn native_normalizes_line_endings() {
        assert_eq!(clean_native_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn native_collapses_horizontal_whitespace() {
        assert_eq!(clean_native_text("名稱 \t  年齡\t\t職業"), "名稱 年齡 職業");
    }

    #[test]
    fn native_keeps_blank_lines() {
        assert_eq!(
            clean_native_text("  para one  \n\n\n  para two\t"),
            "para one\n\n\npara two"
        );
    }

    #[test]
    fn native_skips_confusable_table() {
        assert_eq!(clean_native_text("丨 and ０ and |"), "丨 and ０ and |");
    }
}
