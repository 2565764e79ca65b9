// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR preprocessing: the fixed filter chain applied to a page bitmap before
// recognition.

use image::DynamicImage;
use pagetext_core::{ContrastMode, ExtractionConfig, PageTextError};
use tracing::{debug, instrument, warn};

use crate::image::processor::ImageProcessor;

/// Prepares page bitmaps for the recogniser.
///
/// ## Pipeline
///
/// 1. Grayscale conversion
/// 2. Contrast stage (see [`ContrastMode`])
/// 3. Sharpen (3×3 Laplacian-style kernel)
/// 4. Denoise (3×3 box blur)
///
/// Every stage runs on the previous stage's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct OcrPreprocessor {
    contrast: ContrastMode,
}

impl OcrPreprocessor {
    pub fn new(contrast: ContrastMode) -> Self {
        Self { contrast }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.contrast)
    }

    /// Run the pipeline. Never fails: on any internal error the input bitmap
    /// is returned unchanged.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn preprocess(&self, image: &DynamicImage) -> DynamicImage {
        match self.try_preprocess(image) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(%err, "Preprocessing failed, using original bitmap");
                image.clone()
            }
        }
    }

    /// Run the pipeline, reporting failures instead of absorbing them.
    pub fn try_preprocess(&self, image: &DynamicImage) -> Result<DynamicImage, PageTextError> {
        let processor = ImageProcessor::from_dynamic(image.clone());
        if processor.width() == 0 || processor.height() == 0 {
            return Err(PageTextError::Preprocessing(format!(
                "bitmap has no pixels ({}x{})",
                processor.width(),
                processor.height()
            )));
        }

        let prepared = processor
            .grayscale()
            .stretch_contrast(self.contrast)
            .sharpen()
            .denoise()
            .into_dynamic();

        debug!(contrast = ?self.contrast, "Bitmap preprocessed");
        Ok(prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn output_is_grayscale_with_same_dimensions() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([10, 200, 30, 255])));
        let out = OcrPreprocessor::default().preprocess(&img);
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
        assert_eq!((out.width(), out.height()), (40, 30));
    }

    #[test]
    fn empty_bitmap_is_returned_unchanged() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        let pre = OcrPreprocessor::default();
        assert!(matches!(
            pre.try_preprocess(&img),
            Err(PageTextError::Preprocessing(_))
        ));
        let out = pre.preprocess(&img);
        assert!(matches!(out, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn passthrough_keeps_flat_page_values() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 12, Luma([77])));
        let out = OcrPreprocessor::new(ContrastMode::Passthrough).preprocess(&img);
        assert!(out.to_luma8().pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn stretch_widens_low_contrast_scan() {
        let mut gray = GrayImage::from_pixel(20, 20, Luma([140]));
        for x in 5..15 {
            for y in 5..15 {
                gray.put_pixel(x, y, Luma([110]));
            }
        }
        let out = OcrPreprocessor::default()
            .preprocess(&DynamicImage::ImageLuma8(gray))
            .to_luma8();
        // Background maps to white, the interior of the dark block to black.
        assert_eq!(out.get_pixel(1, 1).0[0], 255);
        assert_eq!(out.get_pixel(10, 10).0[0], 0);
    }
}
