// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding, grayscale conversion, contrast stretching,
// sharpening, and denoising of page bitmaps. Operates on in-memory images
// using the `image` and `imageproc` crates.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::filter::{box_filter, sharpen3x3};
use pagetext_core::{ContrastMode, PageTextError};
use tracing::{debug, info, instrument};

/// Filter chain operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining:
///
/// ```ignore
/// let prepared = ImageProcessor::open("scan.png")?
///     .grayscale()
///     .stretch_contrast(ContrastMode::Stretch)
///     .sharpen()
///     .denoise()
///     .into_dynamic();
/// ```
///
/// The 3×3 filters leave the outermost row and column of pixels untouched.
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PageTextError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            PageTextError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, TIFF, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PageTextError> {
        let img = image::load_from_memory(data).map_err(|err| {
            PageTextError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Filters --------------------------------------------------------------

    /// Convert to single-channel 8-bit luma.
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Linearly map the darkest pixel to 0 and the brightest to 255.
    ///
    /// Flat images and [`ContrastMode::Passthrough`] leave pixel values as they
    /// are. The result is always single-channel.
    #[instrument(skip(self))]
    pub fn stretch_contrast(self, mode: ContrastMode) -> Self {
        let gray = self.image.to_luma8();
        if mode == ContrastMode::Passthrough {
            return Self::from_gray(gray);
        }

        let (low, high) = luma_range(&gray);
        if high <= low {
            debug!(low, high, "Flat image, contrast unchanged");
            return Self::from_gray(gray);
        }

        let span = f32::from(high - low);
        let stretched = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
            let Luma([value]) = *gray.get_pixel(x, y);
            let scaled = f32::from(value - low) * 255.0 / span;
            Luma([scaled.round().clamp(0.0, 255.0) as u8])
        });
        debug!(low, high, "Contrast stretched");
        Self::from_gray(stretched)
    }

    /// Sharpen with the kernel `[0,-1,0; -1,5,-1; 0,-1,0]`.
    pub fn sharpen(self) -> Self {
        let gray = self.image.to_luma8();
        let mut sharpened = sharpen3x3(&gray);
        restore_border(&mut sharpened, &gray);
        Self::from_gray(sharpened)
    }

    /// Denoise with a uniform 3×3 box blur.
    pub fn denoise(self) -> Self {
        let gray = self.image.to_luma8();
        let mut blurred = box_filter(&gray, 1, 1);
        restore_border(&mut blurred, &gray);
        Self::from_gray(blurred)
    }

    fn from_gray(gray: GrayImage) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(gray),
        }
    }
}

/// Darkest and brightest luma values of an image.
fn luma_range(gray: &GrayImage) -> (u8, u8) {
    gray.pixels()
        .fold((u8::MAX, u8::MIN), |(low, high), Luma([value])| {
            (low.min(*value), high.max(*value))
        })
}

/// Copy the outermost ring of pixels from `source` back into `filtered`.
fn restore_border(filtered: &mut GrayImage, source: &GrayImage) {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    for x in 0..width {
        filtered.put_pixel(x, 0, *source.get_pixel(x, 0));
        filtered.put_pixel(x, height - 1, *source.get_pixel(x, height - 1));
    }
    for y in 0..height {
        filtered.put_pixel(0, y, *source.get_pixel(0, y));
        filtered.put_pixel(width - 1, y, *source.get_pixel(width - 1, y));
    }
}
