// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batched failed-detection report, surfaced once per extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::BatchId;

/// Outcome summary of one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub batch_id: BatchId,
    pub total_pages: usize,
    /// 0-based indices of pages where OCR was needed but produced no usable text.
    pub failed_pages: Vec<usize>,
    /// False when no OCR model was available for the batch.
    pub ocr_enabled: bool,
    pub generated_at: DateTime<Utc>,
}

impl DetectionReport {
    pub fn new(batch_id: BatchId, total_pages: usize, ocr_enabled: bool) -> Self {
        Self {
            batch_id,
            total_pages,
            failed_pages: Vec::new(),
            ocr_enabled,
            generated_at: Utc::now(),
        }
    }

    pub fn record_failure(&mut self, page: usize) {
        self.failed_pages.push(page);
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_pages.is_empty()
    }

    /// One-line summary listing failed pages 1-based, or `None` when clean.
    pub fn summary(&self) -> Option<String> {
        if self.failed_pages.is_empty() {
            return None;
        }
        let pages = self
            .failed_pages
            .iter()
            .map(|page| (page + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "Text detection failed on {} of {} page(s): {}",
            self.failed_pages.len(),
            self.total_pages,
            pages
        ))
    }
}
