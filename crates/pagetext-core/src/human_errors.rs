// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people running an extraction.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the caller presents it.

use crate::error::{PageTextError, RecognitionError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth simply running again.
    Transient,
    /// The user must change something (a path, a setting, a model file).
    ActionRequired,
    /// Retrying will not help with this input.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether re-running the same extraction may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `PageTextError` into a `HumanError`.
pub fn humanize_error(err: &PageTextError) -> HumanError {
    match err {
        PageTextError::Rasterization { page, .. } => HumanError {
            message: format!("Page {} couldn't be turned into an image.", page + 1),
            suggestion: "Text recognition was skipped for that page. Check the document opens correctly in a viewer.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        PageTextError::NativeText { page, .. } => HumanError {
            message: format!("The text of page {} couldn't be read.", page + 1),
            suggestion: "The document's text layer may be damaged. Recognition from the page image can still work.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        PageTextError::Recognition(inner) => humanize_recognition_error(inner),
        PageTextError::Preprocessing(_) => HumanError {
            message: "The page image couldn't be cleaned up before recognition.".into(),
            suggestion: "The original image was used instead. No action is needed.".into(),
            retriable: false,
            severity: Severity::Transient,
        },
        PageTextError::ModelLoad(detail) => HumanError {
            message: "A text recognition model couldn't be loaded.".into(),
            suggestion: format!(
                "Download the OCR models (text-detection.rten and text-recognition.rten) into the model directory. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        PageTextError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged or encrypted. Try opening it in a PDF viewer first, or try a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        PageTextError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a PNG or JPEG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        PageTextError::DocumentUnavailable(_) => HumanError {
            message: "Nothing in this document could be read.".into(),
            suggestion: "Check that the file is a complete, readable document.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        PageTextError::Cancelled { completed } => HumanError {
            message: format!("Extraction was stopped after {completed} page(s)."),
            suggestion: "Run it again to process the remaining pages.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        PageTextError::InvalidConfig(detail) => HumanError {
            message: "The extraction settings aren't valid.".into(),
            suggestion: format!("Fix the setting and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        PageTextError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "There's no permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere readable first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }
        PageTextError::Serialization(_) => HumanError {
            message: "A settings or output file isn't valid JSON.".into(),
            suggestion: "Check the file contents, or delete it to fall back to defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_recognition_error(err: &RecognitionError) -> HumanError {
    match err {
        RecognitionError::Engine { .. } => HumanError {
            message: "Text recognition didn't work on this page.".into(),
            suggestion: "Try a higher resolution scan, or make sure the text is clear and in focus.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
        RecognitionError::Unavailable(model) => HumanError {
            message: format!("The {model} recognition model isn't loaded."),
            suggestion: "Install the model files or pick the other model.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        RecognitionError::Poisoned(model) => HumanError {
            message: format!("The {model} recognition model stopped working."),
            suggestion: "Restart the program to reload the model.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
