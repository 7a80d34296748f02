//! Descriptive statistics for numeric columns.
//!
//! Values are folded in one pass using Welford's update, so mean and variance
//! stay stable for long columns with large magnitudes. Standard deviation is
//! the sample estimate (N−1 divisor); it is undefined below two values.
//!
//! Finite values enter the update divided by a power-of-two `scale`, raised
//! only when a magnitude would leave less than `2^HEADROOM_EXP` of headroom.
//! Division by a power of two is exact, so ordinary columns see plain Welford
//! arithmetic while values near `f64::MAX` cannot overflow the differences.
//! Any infinite value makes mean and standard deviation undefined.

use serde::Serialize;

use crate::data::{Cell, json_safe};

const HEADROOM_EXP: i32 = 480;

/// Per-column statistics. Every field is `None` when undefined or not
/// finite and serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericStats {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ColumnStats {
    count: usize,
    non_finite: usize,
    scale: f64,
    mean: f64,
    m2: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            count: 0,
            non_finite: 0,
            scale: 1.0,
            mean: 0.0,
            m2: 0.0,
            min: None,
            max: None,
        }
    }
}

impl ColumnStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut stats = Self::new();
        for value in cells.into_iter().filter_map(Cell::as_f64) {
            stats.add_value(value);
        }
        stats
    }

    pub fn add_value(&mut self, value: f64) {
        self.min = Some(match self.min {
            Some(current) => current.min(value),
            None => value,
        });
        self.max = Some(match self.max {
            Some(current) => current.max(value),
            None => value,
        });
        if !value.is_finite() {
            self.non_finite += 1;
            return;
        }

        self.rescale_for(value.abs());
        self.count += 1;
        let scaled = value / self.scale;
        let delta = scaled - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (scaled - self.mean);
    }

    fn rescale_for(&mut self, magnitude: f64) {
        if magnitude <= 2f64.powi(HEADROOM_EXP) * self.scale {
            return;
        }
        let next = 2f64.powi(magnitude.log2().ceil() as i32 - HEADROOM_EXP);
        let ratio = self.scale / next;
        self.mean *= ratio;
        self.m2 *= ratio * ratio;
        self.scale = next;
    }

    pub fn count(&self) -> usize {
        self.count + self.non_finite
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0 && self.non_finite == 0).then(|| self.mean * self.scale)
    }

    pub fn std_dev(&self) -> Option<f64> {
        if self.count < 2 || self.non_finite > 0 {
            return None;
        }
        let variance = self.m2 / (self.count as f64 - 1.0);
        if !variance.is_finite() {
            return None;
        }
        // Rounding can leave a tiny negative m2 for constant columns.
        let variance = if variance < 0.0 { 0.0 } else { variance };
        Some(variance.sqrt() * self.scale)
    }

    pub fn finish(&self) -> NumericStats {
        NumericStats {
            mean: self.mean().and_then(json_safe),
            min: self.min.and_then(json_safe),
            max: self.max.and_then(json_safe),
            std: self.std_dev().and_then(json_safe),
        }
    }
}
