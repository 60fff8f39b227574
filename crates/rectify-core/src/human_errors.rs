// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the correction front end.
//
// Every technical error is mapped to plain English with a concrete next step.
// Severity drives how the front end presents it.

use crate::error::RectifyError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user has to pick different points or enter different values.
    ActionRequired,
    /// The file itself is the problem; retrying with the same file won't help.
    Permanent,
    /// Something inside the engine failed.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `RectifyError` into a `HumanError` suitable for a message box.
pub fn humanize_error(err: &RectifyError) -> HumanError {
    match err {
        RectifyError::InvalidInput(detail) => HumanError {
            message: "Some of the values entered aren't valid.".into(),
            suggestion: format!(
                "Check that exactly four points are marked and that the reference width and height are positive numbers. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        RectifyError::NoImage => HumanError {
            message: "No image is open.".into(),
            suggestion: "Open an image first, then mark the four reference points.".into(),
            severity: Severity::ActionRequired,
        },

        RectifyError::InvalidGeometry(_) => HumanError {
            message: "The four points couldn't be sorted into corners.".into(),
            suggestion: "Mark four separate points, one near each corner of the object, and keep the object roughly upright in the photo.".into(),
            severity: Severity::ActionRequired,
        },

        RectifyError::DegenerateQuad { .. } => HumanError {
            message: "The marked points are too close together.".into(),
            suggestion: "Reset the points and mark the corners of a larger area.".into(),
            severity: Severity::ActionRequired,
        },

        RectifyError::DegenerateTransform(_) => HumanError {
            message: "The perspective couldn't be calculated from these points.".into(),
            suggestion: "Three of the points may lie on one line. Reset and mark the four corners of a flat, rectangular object.".into(),
            severity: Severity::ActionRequired,
        },

        RectifyError::DegenerateOutput { .. } => HumanError {
            message: "The corrected image would have no size.".into(),
            suggestion: "Try different points, or use the crop mode instead of fitting the whole image.".into(),
            severity: Severity::ActionRequired,
        },

        RectifyError::RasterizationFailed(_) => HumanError {
            message: "The corrected image is too large to create.".into(),
            suggestion: "Mark points that cover more of the object, or use the crop mode.".into(),
            severity: Severity::ActionRequired,
        },

        RectifyError::NoCalibration => HumanError {
            message: "Measurements need a calibrated image.".into(),
            suggestion: "Enter the reference object's real width and height and apply the correction first.".into(),
            severity: Severity::ActionRequired,
        },

        RectifyError::Decode(_) => HumanError {
            message: "This image couldn't be opened.".into(),
            suggestion: "The file may be damaged or in an unsupported format. Try a PNG, JPEG, BMP or TIFF file.".into(),
            severity: Severity::Permanent,
        },

        RectifyError::Encode(_) => HumanError {
            message: "The corrected image couldn't be saved in that format.".into(),
            suggestion: "Try saving as PNG instead.".into(),
            severity: Severity::Permanent,
        },

        RectifyError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "The app doesn't have permission to use that file.".into(),
                suggestion: "Check the file permissions, or choose a different folder.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                severity: Severity::Internal,
            },
        },

        RectifyError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Delete the settings file to restore the defaults.".into(),
            severity: Severity::Internal,
        },
    }
}
