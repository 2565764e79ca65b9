// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paragraph-level views over page text.

use std::sync::LazyLock;

use pagetext_core::PageText;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::segment::{self, FULL_WIDTH_SPACE, FormattedLine, LineType};

static INNER_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One entry of a paragraph-formatted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParagraphLine {
    Text { text: String, line_type: LineType },
    /// Paragraph separator. Never leads, trails, or repeats.
    Break,
}

impl ParagraphLine {
    pub fn is_break(&self) -> bool {
        matches!(self, Self::Break)
    }
}

/// Re-flow text into cleaned lines separated by paragraph breaks.
///
/// Headings always stand alone between breaks. Other lines have whitespace
/// runs collapsed and stray pipes removed; lines left empty are dropped.
pub fn formatted_paragraphs(text: &str) -> Vec<ParagraphLine> {
    let mut out: Vec<ParagraphLine> = Vec::new();

    for raw in text.split('\n') {
        let line = raw.trim();
        if line.is_empty() {
            push_break(&mut out);
            continue;
        }

        if segment::is_header(line) {
            push_break(&mut out);
            out.push(ParagraphLine::Text {
                text: line.to_string(),
                line_type: LineType::Header,
            });
            push_break(&mut out);
            continue;
        }

        let cleaned = clean_paragraph_line(line);
        if !cleaned.is_empty() {
            let line_type = segment::classify_line(&cleaned);
            out.push(ParagraphLine::Text {
                text: cleaned,
                line_type,
            });
        }
    }

    while out.last().is_some_and(ParagraphLine::is_break) {
        out.pop();
    }
    let leading = out.iter().take_while(|line| line.is_break()).count();
    out.drain(..leading);
    out
}

fn push_break(out: &mut Vec<ParagraphLine>) {
    if matches!(out.last(), Some(ParagraphLine::Text { .. })) {
        out.push(ParagraphLine::Break);
    }
}

fn clean_paragraph_line(line: &str) -> String {
    let without_pipes = line.replace('|', "");
    INNER_WHITESPACE
        .replace_all(&without_pipes, " ")
        .trim()
        .to_string()
}

/// Group lines into paragraphs.
///
/// A line indented with at least two spaces, tabs, or full-width spaces opens
/// a new paragraph. Blank lines are skipped; lines within a paragraph are
/// joined with a single space.
pub fn split_into_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if opens_paragraph(line) && !current.is_empty() {
            paragraphs.push(current.join(" "));
            current.clear();
        }
        current.push(trimmed);
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs
}

fn opens_paragraph(line: &str) -> bool {
    line.chars()
        .take_while(|c| matches!(*c, ' ' | '\t' | FULL_WIDTH_SPACE))
        .count()
        >= 2
}

/// Formatting views over a page's best text.
pub trait PageTextExt {
    fn formatted_paragraphs(&self) -> Vec<ParagraphLine>;
    fn formatted_lines(&self) -> Vec<FormattedLine>;
    fn paragraphs(&self) -> Vec<String>;
}

impl PageTextExt for PageText {
    fn formatted_paragraphs(&self) -> Vec<ParagraphLine> {
        formatted_paragraphs(self.best_text())
    }

    fn formatted_lines(&self) -> Vec<FormattedLine> {
        segment::process_text(self.best_text())
    }

    fn paragraphs(&self) -> Vec<String> {
        split_into_paragraphs(self.best_text())
    }
}
