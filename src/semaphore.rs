// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};

use crate::models::SemaphoreColor;

/// Lower bounds (in percent of 1-year change) for the green and yellow buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemaphoreThresholds {
    pub green_min: f64,
    pub yellow_min: f64,
}

impl Default for SemaphoreThresholds {
    fn default() -> Self {
        Self {
            green_min: 20.0,
            yellow_min: 0.0,
        }
    }
}

/// Classify a company by its 1-year price change.
///
/// A missing (or NaN) change is `Gray`, never a risk level.
pub fn classify(change_1y: Option<f64>, thresholds: &SemaphoreThresholds) -> SemaphoreColor {
    match change_1y {
        None => SemaphoreColor::Gray,
        Some(change) if change.is_nan() => SemaphoreColor::Gray,
        Some(change) if change >= thresholds.green_min => SemaphoreColor::Green,
        Some(change) if change >= thresholds.yellow_min => SemaphoreColor::Yellow,
        Some(_) => SemaphoreColor::Red,
    }
}
