// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page sources consumed by the aggregator. Page indices are 0-based.

use image::DynamicImage;
use pagetext_core::PageTextError;

/// Renders a page to a bitmap at a requested resolution.
pub trait Rasterizer {
    fn render(&self, page: usize, dpi: f32) -> Result<DynamicImage, PageTextError>;
}

/// Reads the embedded text layer of a page. Pages without one yield `""`.
pub trait NativeTextReader {
    fn extract(&self, page: usize) -> Result<String, PageTextError>;
}

/// Already-decoded scanned images, one per page.
///
/// The images are used at their native resolution; the requested DPI is
/// ignored.
#[derive(Debug, Clone, Copy)]
pub struct ImagePages<'a> {
    images: &'a [DynamicImage],
}

impl<'a> ImagePages<'a> {
    pub fn new(images: &'a [DynamicImage]) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Rasterizer for ImagePages<'_> {
    fn render(&self, page: usize, _dpi: f32) -> Result<DynamicImage, PageTextError> {
        self.images
            .get(page)
            .cloned()
            .ok_or_else(|| PageTextError::Rasterization {
                page,
                detail: format!("no image for page (have {})", self.images.len()),
            })
    }
}
