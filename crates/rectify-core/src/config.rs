// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{RectifyError, Result};
use crate::types::{FillPolicy, FitMode, PointOrdering};

/// Persistent correction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Pixels per physical unit used for calibrated output when the
    /// reference object is small enough.
    pub preferred_density: f64,
    /// Upper bound on either edge of the calibrated reference rectangle, in
    /// pixels. Keeps tiny reference units from producing huge canvases.
    pub max_reference_edge_px: f64,
    /// Fit mode used when a request doesn't name one.
    pub default_fit_mode: FitMode,
    /// Fill policy override. `None` picks the per-mode default.
    pub fill_policy: Option<FillPolicy>,
    /// How clicked points are turned into corners.
    pub point_ordering: PointOrdering,
    /// Largest output canvas the rasterizer will allocate, in pixels.
    pub max_output_pixels: u64,
    /// JPEG quality (1-100) when saving as JPEG.
    pub jpeg_quality: u8,
    /// Appended to the source file stem when suggesting an output name.
    pub output_suffix: String,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            preferred_density: 75.0,
            max_reference_edge_px: 1500.0,
            default_fit_mode: FitMode::ContentFit,
            fill_policy: None,
            point_ordering: PointOrdering::Heuristic,
            max_output_pixels: 200_000_000,
            jpeg_quality: 95,
            output_suffix: "_corrected".into(),
        }
    }
}

impl RectifyConfig {
    /// Check that every numeric setting is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.preferred_density.is_finite() || self.preferred_density <= 0.0 {
            return Err(RectifyError::InvalidInput(format!(
                "preferred_density must be positive, got {}",
                self.preferred_density
            )));
        }
        if !self.max_reference_edge_px.is_finite() || self.max_reference_edge_px <= 0.0 {
            return Err(RectifyError::InvalidInput(format!(
                "max_reference_edge_px must be positive, got {}",
                self.max_reference_edge_px
            )));
        }
        if self.max_output_pixels == 0 {
            return Err(RectifyError::InvalidInput(
                "max_output_pixels must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(RectifyError::InvalidInput(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Read settings from a JSON file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read settings if the file exists. `Ok(None)` when it doesn't; a file
    /// that exists but is unreadable, malformed, or invalid is an error.
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(RectifyError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Read settings, falling back to defaults when the file is missing.
    /// A broken file also falls back to defaults, with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_optional(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(path = %path.display(), "No settings file; using defaults");
                Self::default()
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "Ignoring unusable settings file");
                Self::default()
            }
        }
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
