// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page text aggregator: runs every page of a document through the native /
// OCR decision and assembles the batch result.
//
// Per-page problems (unreadable text layer, missing bitmap, engine errors) are
// absorbed and end up in the batch's `DetectionReport`. Only a document from
// which nothing at all could be read, or a cancellation, fails the batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;
use pagetext_core::error::Result;
use pagetext_core::{BatchId, DetectionReport, ExtractionConfig, PageText, PageTextError};
use pagetext_text::{QualityGate, clean_native_text, clean_ocr_text};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::scan::controller::OcrModelController;
use crate::scan::preprocess::OcrPreprocessor;
use crate::source::{ImagePages, NativeTextReader, Rasterizer};

/// Everything one batch produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    /// One entry per page, in page order.
    pub pages: Vec<PageText>,
    pub report: DetectionReport,
}

/// Result of a single page before it joins the batch.
struct PageResult {
    page: PageText,
    failed: bool,
    /// Whether any source (text layer or bitmap) could be read for the page.
    accessible: bool,
}

/// Drives extraction of whole documents.
///
/// The configuration is fixed at construction. The controller is shared, so
/// several extractors (or threads) can use the same model handles; each handle
/// serialises its own calls.
pub struct PageTextExtractor {
    config: ExtractionConfig,
    gate: QualityGate,
    controller: Arc<OcrModelController>,
    preprocessor: OcrPreprocessor,
    cancel: Option<Arc<AtomicBool>>,
}

impl PageTextExtractor {
    pub fn new(config: ExtractionConfig, controller: Arc<OcrModelController>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gate: QualityGate::from_config(&config),
            preprocessor: OcrPreprocessor::from_config(&config),
            config,
            controller,
            cancel: None,
        })
    }

    /// Stop between pages once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn controller(&self) -> &OcrModelController {
        &self.controller
    }

    /// Extract `page_count` pages.
    ///
    /// `native` supplies text layers and `raster` supplies bitmaps for OCR;
    /// either may be absent. Pages are processed in index order.
    #[instrument(skip(self, native, raster), fields(batch_id = tracing::field::Empty))]
    pub fn extract(
        &self,
        page_count: usize,
        native: Option<&dyn NativeTextReader>,
        raster: Option<&dyn Rasterizer>,
    ) -> Result<ExtractionOutcome> {
        let batch_id = BatchId::new();
        tracing::Span::current().record("batch_id", tracing::field::display(batch_id));
        let ocr_enabled = self.controller.any_available();
        info!(
            %batch_id,
            ocr_enabled,
            model = %self.config.ocr_model,
            "Starting page text extraction"
        );

        if native.is_none() && !ocr_enabled {
            return Err(PageTextError::DocumentUnavailable(
                "no text layer to read and OCR is disabled".into(),
            ));
        }

        let mut report = DetectionReport::new(batch_id, page_count, ocr_enabled);
        let mut pages = Vec::with_capacity(page_count);
        let mut accessible = false;

        for index in 0..page_count {
            if self.is_cancelled() {
                info!(completed = pages.len(), "Extraction cancelled");
                return Err(PageTextError::Cancelled {
                    completed: pages.len(),
                });
            }

            let result = self.extract_page(index, native, raster, ocr_enabled);
            accessible |= result.accessible;
            if result.failed {
                report.record_failure(index);
            }
            pages.push(result.page);
        }

        if page_count > 0 && !accessible {
            return Err(PageTextError::DocumentUnavailable(format!(
                "none of the {} page(s) could be read",
                page_count
            )));
        }

        if let Some(summary) = report.summary()
            && self.config.report_detection_failures
        {
            warn!(%batch_id, failed = ?report.failed_pages, "{summary}");
        }

        info!(
            %batch_id,
            pages = pages.len(),
            failed = report.failed_pages.len(),
            "Page text extraction complete"
        );
        Ok(ExtractionOutcome { pages, report })
    }

    /// Extract standalone scanned images, one page each.
    pub fn extract_images(&self, images: &[DynamicImage]) -> Result<ExtractionOutcome> {
        let pages = ImagePages::new(images);
        self.extract(images.len(), None, Some(&pages))
    }

    /// Cleaned OCR text of a single image, or `""` when recognition fails or
    /// no model is loaded.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_image(&self, image: &DynamicImage) -> String {
        let prepared = self.preprocessor.preprocess(image);
        match self
            .controller
            .recognize(&prepared, self.config.ocr_model, &self.gate)
        {
            Ok(outcome) => clean_ocr_text(&outcome.text),
            Err(err) => {
                warn!(%err, "Image recognition failed");
                String::new()
            }
        }
    }

    #[instrument(skip(self, native, raster, ocr_enabled))]
    fn extract_page(
        &self,
        index: usize,
        native: Option<&dyn NativeTextReader>,
        raster: Option<&dyn Rasterizer>,
        ocr_enabled: bool,
    ) -> PageResult {
        let (native_raw, mut accessible) = match native.map(|reader| reader.extract(index)) {
            Some(Ok(text)) => (text, true),
            Some(Err(err)) => {
                warn!(%err, "Native text unreadable, treating as empty");
                (String::new(), false)
            }
            None => (String::new(), false),
        };
        let native_text = clean_native_text(&native_raw);

        if !ocr_enabled || !self.gate.should_use_ocr(&native_raw) {
            debug!(chars = native_text.chars().count(), "Using native text");
            return PageResult {
                page: PageText::native(index, native_text),
                failed: false,
                accessible,
            };
        }

        let bitmap = match raster.map(|source| source.render(index, self.config.ocr_dpi)) {
            Some(Ok(bitmap)) => {
                accessible = true;
                bitmap
            }
            Some(Err(err)) => {
                warn!(%err, "Page bitmap unavailable, keeping native text");
                return Self::failed(index, native_text, accessible);
            }
            None => {
                debug!("No rasterizer, keeping native text");
                return Self::failed(index, native_text, accessible);
            }
        };

        let prepared = self.preprocessor.preprocess(&bitmap);
        let outcome = match self
            .controller
            .recognize(&prepared, self.config.ocr_model, &self.gate)
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "Recognition failed, keeping native text");
                return Self::failed(index, native_text, accessible);
            }
        };

        let ocr_text = clean_ocr_text(&outcome.text);
        if !self.gate.is_valid_text(&ocr_text) {
            debug!(
                model = %outcome.model,
                chars = ocr_text.chars().count(),
                "OCR text rejected"
            );
            return Self::failed(index, native_text, accessible);
        }

        let blocks = if self.config.collect_text_blocks {
            self.controller
                .recognize_blocks(&prepared, outcome.model)
                .unwrap_or_else(|err| {
                    warn!(%err, "Text blocks unavailable");
                    Vec::new()
                })
        } else {
            Vec::new()
        };

        debug!(
            model = %outcome.model,
            attempts = outcome.attempts,
            chars = ocr_text.chars().count(),
            "Using OCR text"
        );
        PageResult {
            page: PageText::ocr(index, native_text, ocr_text, blocks),
            failed: false,
            accessible,
        }
    }

    /// A native-text page recorded as a failed detection. The OCR text is not
    /// kept.
    fn failed(index: usize, native_text: String, accessible: bool) -> PageResult {
        PageResult {
            page: PageText::native(index, native_text),
            failed: true,
            accessible,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Run an image batch on tokio's blocking pool.
#[cfg(feature = "async")]
pub async fn spawn_extraction(
    extractor: Arc<PageTextExtractor>,
    images: Vec<DynamicImage>,
) -> Result<ExtractionOutcome> {
    tokio::task::spawn_blocking(move || extractor.extract_images(&images))
        .await
        .map_err(|err| {
            PageTextError::DocumentUnavailable(format!("extraction task did not complete: {err}"))
        })?
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    use pagetext_core::{OcrModel, TextSource};

    use super::*;
    use crate::scan::controller::testing::{ScriptedEngine, calls};

    const VALID: &str = "這是一段包含超過十個字元的有效文字";
    const NATIVE: &str = "Native text layer with plenty of readable words.";

    /// Text layer backed by a map; missing pages read as empty, listed pages
    /// in `broken` fail.
    #[derive(Default)]
    struct FakeText {
        pages: HashMap<usize, String>,
        broken: Vec<usize>,
        calls: AtomicUsize,
    }

    impl FakeText {
        fn with(pages: &[(usize, &str)]) -> Self {
            Self {
                pages: pages.iter().map(|(i, t)| (*i, t.to_string())).collect(),
                ..Default::default()
            }
        }
    }

    impl NativeTextReader for FakeText {
        fn extract(&self, page: usize) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(&page) {
                return Err(PageTextError::NativeText {
                    page,
                    detail: "corrupt stream".into(),
                });
            }
            Ok(self.pages.get(&page).cloned().unwrap_or_default())
        }
    }

    /// Bitmaps for every page except those listed as missing.
    #[derive(Default)]
    struct FakeRaster {
        missing: Vec<usize>,
        calls: AtomicUsize,
    }

    impl Rasterizer for FakeRaster {
        fn render(&self, page: usize, dpi: f32) -> Result<DynamicImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!((dpi - 300.0).abs() < f32::EPSILON);
            if self.missing.contains(&page) {
                return Err(PageTextError::Rasterization {
                    page,
                    detail: "render failed".into(),
                });
            }
            Ok(DynamicImage::new_luma8(16, 16))
        }
    }

    fn extractor(fast: Option<&str>, best: Option<&str>) -> PageTextExtractor {
        let fast = fast.map(|text| ScriptedEngine::text(text).0);
        let best = best.map(|text| ScriptedEngine::text(text).0);
        let controller = OcrModelController::with_engines(fast, best);
        PageTextExtractor::new(ExtractionConfig::default(), Arc::new(controller)).expect("config")
    }

    #[test]
    fn extractor_exposes_config_and_models() {
        let extractor = extractor(Some(VALID), None);
        assert_eq!(extractor.config(), &ExtractionConfig::default());
        assert!(extractor.controller().is_available(OcrModel::Fast));
        assert!(!extractor.controller().is_available(OcrModel::Best));
    }

    #[test]
    fn good_native_text_skips_ocr() {
        let (fast, fast_calls) = ScriptedEngine::text(VALID);
        let controller = OcrModelController::with_engines(Some(fast), None);
        let extractor =
            PageTextExtractor::new(ExtractionConfig::default(), Arc::new(controller)).expect("config");
        let text = FakeText::with(&[(0, "  Native   text layer with\tplenty of words.  ")]);
        let raster = FakeRaster::default();

        let outcome = extractor
            .extract(1, Some(&text), Some(&raster))
            .expect("extract");
        let page = &outcome.pages[0];
        assert_eq!(page.text_source(), TextSource::Native);
        assert_eq!(page.best_text(), "Native text layer with plenty of words.");
        assert_eq!(raster.calls.load(Ordering::SeqCst), 0);
        assert_eq!(calls(&fast_calls), 0);
        assert!(!outcome.report.has_failures());
    }

    #[test]
    fn scanned_page_uses_ocr() {
        let extractor = extractor(Some(VALID), None);
        let text = FakeText::default();
        let raster = FakeRaster::default();

        let outcome = extractor
            .extract(1, Some(&text), Some(&raster))
            .expect("extract");
        let page = &outcome.pages[0];
        assert_eq!(page.text_source(), TextSource::Ocr);
        assert_eq!(page.ocr_text(), VALID);
        assert_eq!(page.best_text(), VALID);
    }

    #[test]
    fn invalid_fast_result_is_replaced_by_best() {
        let (fast, fast_calls) = ScriptedEngine::text("OK");
        let (best, best_calls) = ScriptedEngine::text(VALID);
        let controller = OcrModelController::with_engines(Some(fast), Some(best));
        let extractor =
            PageTextExtractor::new(ExtractionConfig::default(), Arc::new(controller)).expect("config");

        let outcome = extractor
            .extract(1, Some(&FakeText::default()), Some(&FakeRaster::default()))
            .expect("extract");
        let page = &outcome.pages[0];
        assert_eq!(page.text_source(), TextSource::Ocr);
        assert_eq!(page.best_text(), VALID);
        assert_eq!((calls(&fast_calls), calls(&best_calls)), (1, 1));
    }

    #[test]
    fn short_ocr_result_is_recorded_as_failed() {
        let extractor = extractor(Some("OK"), None);

        let outcome = extractor
            .extract(1, Some(&FakeText::default()), Some(&FakeRaster::default()))
            .expect("extract");
        let page = &outcome.pages[0];
        assert_eq!(page.text_source(), TextSource::Native);
        assert_eq!(page.best_text(), "");
        assert_eq!(page.ocr_text(), "");
        assert_eq!(outcome.report.failed_pages, vec![0]);
    }

    #[test]
    fn failures_are_collected_across_pages() {
        let extractor = extractor(Some(VALID), None);
        let text = FakeText::with(&[(1, NATIVE)]);
        let raster = FakeRaster {
            missing: vec![2],
            ..Default::default()
        };

        let outcome = extractor
            .extract(4, Some(&text), Some(&raster))
            .expect("extract");
        let sources: Vec<TextSource> = outcome.pages.iter().map(PageText::text_source).collect();
        assert_eq!(
            sources,
            vec![
                TextSource::Ocr,
                TextSource::Native,
                TextSource::Native,
                TextSource::Ocr
            ]
        );
        assert_eq!(outcome.report.failed_pages, vec![2]);
        assert_eq!(
            outcome.report.summary().as_deref(),
            Some("Text detection failed on 1 of 4 page(s): 3")
        );
        let numbers: Vec<usize> = outcome.pages.iter().map(PageText::page_number).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3]);
    }

    #[test]
    fn engine_error_without_fallback_fails_page_only() {
        let (fast, _) = ScriptedEngine::failing(OcrModel::Fast);
        let controller = OcrModelController::with_engines(Some(fast), None);
        let extractor =
            PageTextExtractor::new(ExtractionConfig::default(), Arc::new(controller)).expect("config");
        let text = FakeText::with(&[(0, "short")]);

        let outcome = extractor
            .extract(2, Some(&text), Some(&FakeRaster::default()))
            .expect("batch survives");
        assert_eq!(outcome.pages[0].best_text(), "short");
        assert_eq!(outcome.report.failed_pages, vec![0, 1]);
    }

    #[test]
    fn no_models_means_native_only_without_failures() {
        let extractor = extractor(None, None);
        let raster = FakeRaster::default();

        let outcome = extractor
            .extract(2, Some(&FakeText::with(&[(0, "tiny")])), Some(&raster))
            .expect("extract");
        assert_eq!(outcome.pages[0].best_text(), "tiny");
        assert!(!outcome.report.ocr_enabled);
        assert!(!outcome.report.has_failures());
        assert_eq!(raster.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unreadable_document_is_fatal() {
        let extractor = extractor(Some(VALID), None);
        let text = FakeText {
            broken: vec![0, 1],
            ..Default::default()
        };
        let raster = FakeRaster {
            missing: vec![0, 1],
            ..Default::default()
        };

        let result = extractor.extract(2, Some(&text), Some(&raster));
        assert!(matches!(result, Err(PageTextError::DocumentUnavailable(_))));
    }

    #[test]
    fn one_broken_text_layer_is_absorbed() {
        let extractor = extractor(Some(VALID), None);
        let text = FakeText {
            pages: [(1, NATIVE.to_string())].into(),
            broken: vec![0],
            ..Default::default()
        };

        let outcome = extractor
            .extract(2, Some(&text), Some(&FakeRaster::default()))
            .expect("extract");
        assert_eq!(outcome.pages[0].text_source(), TextSource::Ocr);
        assert_eq!(outcome.pages[1].text_source(), TextSource::Native);
    }

    #[test]
    fn image_batch_without_models_is_unavailable() {
        let extractor = extractor(None, None);
        let result = extractor.extract_images(&[DynamicImage::new_luma8(4, 4)]);
        assert!(matches!(result, Err(PageTextError::DocumentUnavailable(_))));
    }

    #[test]
    fn image_batch_runs_every_page_through_ocr() {
        let extractor = extractor(Some(VALID), None);
        let images = vec![DynamicImage::new_luma8(8, 8); 3];
        let outcome = extractor.extract_images(&images).expect("extract");
        assert_eq!(outcome.pages.len(), 3);
        assert!(
            outcome
                .pages
                .iter()
                .all(|page| page.text_source() == TextSource::Ocr)
        );
    }

    #[test]
    fn empty_document_is_empty_outcome() {
        let extractor = extractor(None, None);
        let outcome = extractor
            .extract(0, Some(&FakeText::default()), None)
            .expect("extract");
        assert!(outcome.pages.is_empty());
        assert_eq!(outcome.report.total_pages, 0);
    }

    #[test]
    fn cancellation_stops_between_pages() {
        let flag = Arc::new(AtomicBool::new(true));
        let extractor = extractor(Some(VALID), None).with_cancel_flag(flag);
        let text = FakeText::default();

        let result = extractor.extract(3, Some(&text), None);
        assert!(matches!(result, Err(PageTextError::Cancelled { completed: 0 })));
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn text_blocks_are_collected_when_enabled() {
        let (fast, _) = ScriptedEngine::text("第一行文字內容\n第二行文字內容");
        let controller = OcrModelController::with_engines(Some(fast), None);
        let config = ExtractionConfig {
            collect_text_blocks: true,
            ..Default::default()
        };
        let extractor = PageTextExtractor::new(config, Arc::new(controller)).expect("config");

        let outcome = extractor
            .extract_images(&[DynamicImage::new_luma8(8, 8)])
            .expect("extract");
        let blocks = outcome.pages[0].text_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text, "第二行文字內容");
        let bounds = blocks[1].bounds.expect("positioned block");
        assert!((bounds.y - 20.0).abs() < f32::EPSILON);
        assert!((bounds.width - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn recognize_image_returns_cleaned_text_or_empty() {
        let enabled = extractor(Some("  |第一行文字內容|  "), None);
        assert_eq!(enabled.recognize_image(&DynamicImage::new_luma8(8, 8)), "第一行文字內容");

        let disabled = extractor(None, None);
        assert_eq!(disabled.recognize_image(&DynamicImage::new_luma8(8, 8)), "");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ExtractionConfig {
            ocr_dpi: -1.0,
            ..Default::default()
        };
        let result = PageTextExtractor::new(config, Arc::new(OcrModelController::disabled()));
        assert!(matches!(result, Err(PageTextError::InvalidConfig(_))));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn spawned_extraction_completes() {
        let extractor = Arc::new(extractor(Some(VALID), None));
        let outcome = spawn_extraction(extractor, vec![DynamicImage::new_luma8(8, 8)])
            .await
            .expect("extract");
        assert_eq!(outcome.pages[0].best_text(), VALID);
    }
}
