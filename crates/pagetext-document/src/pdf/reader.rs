// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open existing PDF documents and read their embedded text
// layers using the `lopdf` crate.

use std::path::Path;

use lopdf::Document;
use pagetext_core::PageTextError;
use tracing::{debug, info, instrument};

use crate::source::NativeTextReader;

/// Read-only access to an existing PDF.
pub struct PdfReader {
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PageTextError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PageTextError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PageTextError> {
        let document = Document::load_mem(data).map_err(|err| {
            PageTextError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }
}

impl NativeTextReader for PdfReader {
    /// Text layer of the 0-based `page`.
    #[instrument(skip(self))]
    fn extract(&self, page: usize) -> Result<String, PageTextError> {
        let count = self.page_count();
        if page >= count {
            return Err(PageTextError::NativeText {
                page,
                detail: format!("page out of range (document has {} pages)", count),
            });
        }

        // lopdf pages are keyed by 1-indexed page number.
        let number = u32::try_from(page + 1).map_err(|_| PageTextError::NativeText {
            page,
            detail: "page index exceeds PDF page numbering".into(),
        })?;

        let text = self
            .document
            .extract_text(&[number])
            .map_err(|err| PageTextError::NativeText {
                page,
                detail: err.to_string(),
            })?;

        debug!(chars = text.chars().count(), "Native text extracted");
        Ok(text)
    }
}
