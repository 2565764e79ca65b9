// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format-preserving segmentation of a single text line.
//
// A line is split into its indentation prefix and a run of text / whitespace
// segments so a renderer can reproduce the original alignment. Concatenating
// `indent_text` and every segment's text gives back the line with trailing
// whitespace removed (tabs inside aligned content come back as four spaces).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// CJK full-width space, used for paragraph indentation in Chinese text.
pub const FULL_WIDTH_SPACE: char = '\u{3000}';

/// Width a tab expands to inside aligned text.
const TAB_WIDTH: usize = 4;

/// Headings longer than this are treated as body text.
const MAX_HEADER_CHARS: usize = 100;

const BULLET_MARKERS: &[char] = &['•', '·', '-', '‧', '○', '●'];

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:第[一二三四五六七八九十百千零〇0-9０-９]+[章節节回部段]|Chapter\s+[0-9]+|CHAPTER\s+[0-9]+)")
        .expect("valid header regex")
});

static NUMBERED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[.)、]").expect("valid numbered list regex"));

static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid space run regex"));

/// Structural role of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    Empty,
    Header,
    NumberedList,
    BulletList,
    /// Internal spacing is significant (tables, column layouts).
    AlignedText,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    NormalText,
    SingleSpace,
    MultipleSpaces,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub kind: SegmentType,
}

impl TextSegment {
    fn new(text: impl Into<String>, kind: SegmentType) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    fn spaces(count: usize) -> Self {
        let kind = if count == 1 {
            SegmentType::SingleSpace
        } else {
            SegmentType::MultipleSpaces
        };
        Self::new(" ".repeat(count), kind)
    }
}

/// A line decomposed into indentation and segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedLine {
    /// The line as passed in.
    pub original_text: String,
    /// Line without its indentation prefix.
    pub content: String,
    pub indent_level: usize,
    pub line_type: LineType,
    /// Raw indentation prefix.
    pub indent_text: String,
    pub segments: Vec<TextSegment>,
}

impl FormattedLine {
    /// Indentation prefix followed by every segment, in order.
    pub fn reconstruct(&self) -> String {
        let mut out = self.indent_text.clone();
        for segment in &self.segments {
            out.push_str(&segment.text);
        }
        out
    }

    /// Indentation made visible for monospace display.
    ///
    /// A tab becomes four spaces and a full-width space becomes two.
    pub fn display_indent(&self) -> String {
        let mut out = String::with_capacity(self.indent_text.len() * 2);
        for c in self.indent_text.chars() {
            match c {
                '\t' => out.push_str(&" ".repeat(TAB_WIDTH)),
                FULL_WIDTH_SPACE => out.push_str("  "),
                other => out.push(other),
            }
        }
        out
    }
}

impl std::fmt::Display for FormattedLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[indent={}, type={:?}] {}",
            self.indent_level, self.line_type, self.content
        )
    }
}

/// Split off the indentation prefix of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indentation<'a> {
    pub indent_text: &'a str,
    pub content: &'a str,
    pub level: usize,
}

/// Measure a line's indentation. The first matching rule wins:
///
/// 1. a run of full-width spaces: one level each;
/// 2. a run of ASCII spaces and tabs: one level per tab, a quarter per space,
///    rounded to the nearest level;
/// 3. otherwise no indentation.
pub fn analyze_indentation(line: &str) -> Indentation<'_> {
    let full_width = line.len() - line.trim_start_matches(FULL_WIDTH_SPACE).len();
    if full_width > 0 {
        let (indent_text, content) = line.split_at(full_width);
        return Indentation {
            indent_text,
            content,
            level: indent_text.chars().count(),
        };
    }

    let ascii = line.len() - line.trim_start_matches([' ', '\t']).len();
    if ascii > 0 {
        let (indent_text, content) = line.split_at(ascii);
        let units: f32 = indent_text
            .chars()
            .map(|c| if c == '\t' { 1.0 } else { 0.25 })
            .sum();
        return Indentation {
            indent_text,
            content,
            level: units.round() as usize,
        };
    }

    Indentation {
        indent_text: "",
        content: line,
        level: 0,
    }
}

type LineRule = (LineType, fn(&str) -> bool);

/// Classification rules in priority order. Anything unmatched is `Normal`.
pub const LINE_RULES: &[LineRule] = &[
    (LineType::Empty, is_blank),
    (LineType::Header, is_header),
    (LineType::NumberedList, is_numbered_item),
    (LineType::BulletList, is_bullet_item),
    (LineType::AlignedText, is_aligned),
];

pub fn classify_line(content: &str) -> LineType {
    LINE_RULES
        .iter()
        .find(|(_, matches)| matches(content))
        .map(|(line_type, _)| *line_type)
        .unwrap_or(LineType::Normal)
}

pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

/// Chapter or section heading such as `第一章`, `第3節`, or `Chapter 7`.
pub fn is_header(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.chars().count() <= MAX_HEADER_CHARS && HEADER_PATTERN.is_match(trimmed)
}

pub fn is_numbered_item(content: &str) -> bool {
    NUMBERED_PATTERN.is_match(content)
}

pub fn is_bullet_item(content: &str) -> bool {
    content.starts_with(BULLET_MARKERS)
}

pub fn is_aligned(content: &str) -> bool {
    content.contains("    ") || content.contains('\t')
}

/// Split line content into text and whitespace segments.
pub fn segment_content(content: &str, line_type: LineType) -> Vec<TextSegment> {
    if content.is_empty() {
        return Vec::new();
    }
    if line_type == LineType::AlignedText {
        return segment_aligned(content);
    }

    let mut segments = Vec::new();
    let mut last_end = 0;
    for run in SPACE_RUN.find_iter(content) {
        if run.start() > last_end {
            segments.push(TextSegment::new(
                &content[last_end..run.start()],
                SegmentType::NormalText,
            ));
        }
        segments.push(TextSegment::new(run.as_str(), SegmentType::MultipleSpaces));
        last_end = run.end();
    }
    if last_end < content.len() {
        segments.push(TextSegment::new(&content[last_end..], SegmentType::NormalText));
    }
    segments
}

/// Every space run becomes its own segment, single spaces included.
fn segment_aligned(content: &str) -> Vec<TextSegment> {
    let expanded = content.replace('\t', &" ".repeat(TAB_WIDTH));
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut spaces = 0usize;

    for c in expanded.chars() {
        if c == ' ' {
            if !text.is_empty() {
                segments.push(TextSegment::new(std::mem::take(&mut text), SegmentType::NormalText));
            }
            spaces += 1;
        } else {
            if spaces > 0 {
                segments.push(TextSegment::spaces(spaces));
                spaces = 0;
            }
            text.push(c);
        }
    }

    if !text.is_empty() {
        segments.push(TextSegment::new(text, SegmentType::NormalText));
    }
    if spaces > 0 {
        segments.push(TextSegment::spaces(spaces));
    }
    segments
}

/// Analyse one line: indentation, classification, then segmentation.
///
/// Trailing whitespace (including a stray `\r`) is ignored.
pub fn process_line(line: &str) -> FormattedLine {
    let trimmed = line.trim_end();
    let indentation = analyze_indentation(trimmed);
    let line_type = classify_line(indentation.content);
    let segments = segment_content(indentation.content, line_type);

    FormattedLine {
        original_text: line.to_string(),
        content: indentation.content.to_string(),
        indent_level: indentation.level,
        line_type,
        indent_text: indentation.indent_text.to_string(),
        segments,
    }
}

pub fn process_lines<S: AsRef<str>>(lines: &[S]) -> Vec<FormattedLine> {
    lines.iter().map(|line| process_line(line.as_ref())).collect()
}

/// Process every line of a text, keeping blank lines as `Empty` entries.
pub fn process_text(text: &str) -> Vec<FormattedLine> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(process_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &FormattedLine) -> Vec<SegmentType> {
        line.segments.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn chapter_heading_is_header() {
        let line = process_line("第一章  概述");
        assert_eq!(line.line_type, LineType::Header);
        assert_eq!(line.indent_level, 0);
        assert_eq!(line.reconstruct(), "第一章  概述");
    }

    #[test]
    fn english_chapter_headings() {
        assert_eq!(classify_line("Chapter 12 The End"), LineType::Header);
        assert_eq!(classify_line("CHAPTER 3"), LineType::Header);
        assert_eq!(classify_line("chapter 3"), LineType::Normal);
        assert_eq!(classify_line("第3節 方法"), LineType::Header);
    }

    #[test]
    fn overlong_heading_is_not_header() {
        let long = format!("第一章{}", "字".repeat(120));
        assert_ne!(classify_line(&long), LineType::Header);
    }

    #[test]
    fn four_ascii_spaces_are_one_level() {
        let line = process_line("    縮排文字");
        assert_eq!(line.indent_level, 1);
        assert_eq!(line.content, "縮排文字");
        assert_eq!(line.indent_text, "    ");
        assert_eq!(line.line_type, LineType::Normal);
    }

    #[test]
    fn tabs_and_spaces_accumulate() {
        assert_eq!(process_line("\t\t兩個Tab縮排").indent_level, 2);
        assert_eq!(process_line("        八個空格縮排").indent_level, 2);
        assert_eq!(process_line("    \t混合縮排").indent_level, 2);
        assert_eq!(process_line("  兩個空格").indent_level, 1);
        assert_eq!(process_line(" 一個空格").indent_level, 0);
    }

    #[test]
    fn full_width_spaces_count_one_level_each() {
        for n in 1..=4 {
            let raw = format!("{}中文縮排", FULL_WIDTH_SPACE.to_string().repeat(n));
            let line = process_line(&raw);
            assert_eq!(line.indent_level, n);
            assert_eq!(line.content, "中文縮排");
        }
    }

    #[test]
    fn aligned_table_row_keeps_exact_runs() {
        let line = process_line("名稱    年齡    職業");
        assert_eq!(line.line_type, LineType::AlignedText);
        assert_eq!(
            kinds(&line),
            vec![
                SegmentType::NormalText,
                SegmentType::MultipleSpaces,
                SegmentType::NormalText,
                SegmentType::MultipleSpaces,
                SegmentType::NormalText,
            ]
        );
        for segment in line.segments.iter().filter(|s| s.kind == SegmentType::MultipleSpaces) {
            assert_eq!(segment.text.len(), 4);
        }
        assert_eq!(line.reconstruct(), "名稱    年齡    職業");
    }

    #[test]
    fn aligned_text_marks_single_spaces() {
        let line = process_line("a b    c");
        assert_eq!(
            kinds(&line),
            vec![
                SegmentType::NormalText,
                SegmentType::SingleSpace,
                SegmentType::NormalText,
                SegmentType::MultipleSpaces,
                SegmentType::NormalText,
            ]
        );
    }

    #[test]
    fn aligned_text_expands_tabs() {
        let line = process_line("名稱\t年齡");
        assert_eq!(line.line_type, LineType::AlignedText);
        assert_eq!(line.segments[1].text, "    ");
        assert_eq!(line.reconstruct(), "名稱    年齡");
    }

    #[test]
    fn line_without_double_space_is_one_segment() {
        for raw in ["普通段落文字，沒有特殊格式。", "one two three", "x"] {
            let line = process_line(raw);
            assert_eq!(line.segments.len(), 1);
            assert_eq!(line.segments[0].kind, SegmentType::NormalText);
            assert_eq!(line.segments[0].text, raw);
        }
    }

    #[test]
    fn normal_line_splits_only_on_double_spaces() {
        let line = process_line("第二部分  內容 說明");
        assert_eq!(
            kinds(&line),
            vec![
                SegmentType::NormalText,
                SegmentType::MultipleSpaces,
                SegmentType::NormalText,
            ]
        );
        assert_eq!(line.segments[2].text, "內容 說明");
    }

    #[test]
    fn list_markers_are_classified() {
        assert_eq!(process_line("1. 第一項").line_type, LineType::NumberedList);
        assert_eq!(process_line("12) twelfth").line_type, LineType::NumberedList);
        assert_eq!(process_line("3、第三項").line_type, LineType::NumberedList);
        assert_eq!(process_line("• 項目符號").line_type, LineType::BulletList);
        assert_eq!(process_line("   - 嵌套項目").line_type, LineType::BulletList);
        assert_eq!(process_line("  ○ 子項目").line_type, LineType::BulletList);
    }

    #[test]
    fn numbered_item_beats_aligned_text() {
        assert_eq!(process_line("1. 名稱    年齡").line_type, LineType::NumberedList);
    }

    #[test]
    fn blank_lines_are_empty() {
        let line = process_line("   \r");
        assert_eq!(line.line_type, LineType::Empty);
        assert!(line.segments.is_empty());
        assert_eq!(line.reconstruct(), "");
    }

    #[test]
    fn reconstruction_matches_trimmed_line() {
        let lines = [
            "第一章  概述",
            "    這是一個有縮排的段落。",
            "1. 這是編號列表的第一項",
            "   - 這是嵌套的項目符號",
            "名稱        年齡    職業",
            "　　中文全形空格縮排的段落。",
            "這是包含    多個    空格    的文字",
            "ends with spaces   ",
            "  two  runs  here",
        ];
        for raw in lines {
            let line = process_line(raw);
            assert_eq!(line.reconstruct(), raw.trim_end(), "round trip of {raw:?}");
        }
    }

    #[test]
    fn display_indent_widens_tabs_and_full_width() {
        let line = process_line("\t項目");
        assert_eq!(line.display_indent(), "    ");
        let line = process_line("　　項目");
        assert_eq!(line.display_indent(), "    ");
    }

    #[test]
    fn process_text_keeps_blank_lines() {
        let lines = process_text("第一章\n\n    內容");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].line_type, LineType::Empty);
        assert_eq!(lines[2].indent_level, 1);
        assert!(process_text("").is_empty());
    }

    #[test]
    fn rule_table_order_is_priority_order() {
        let order: Vec<LineType> = LINE_RULES.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            order,
            vec![
                LineType::Empty,
                LineType::Header,
                LineType::NumberedList,
                LineType::BulletList,
                LineType::AlignedText,
            ]
        );
    }
}
