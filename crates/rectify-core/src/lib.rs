// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectify — Core types, error definitions, and settings shared across crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::RectifyConfig;
pub use error::{RectifyError, Result};
pub use types::*;
