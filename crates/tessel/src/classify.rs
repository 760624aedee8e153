// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Natural-breaks classification of one attribute into colour classes.
//!
//! Breaks come from an optimal univariate k-means (ckmeans) over the sorted
//! values: the dynamic program minimises the summed within-cluster squared
//! deviation, and each break is the smallest value of a cluster after the
//! first.

use crate::catalog::AttributeName;
use crate::color::Rgb;
use crate::error::{ConfigError, ConfigResult};
use crate::record::Feature;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CLASS_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub class_count: usize,
    pub palette: Vec<Rgb>,
    pub no_data: Rgb,
}
impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            class_count: DEFAULT_CLASS_COUNT,
            palette: vec![
                Rgb::new(0xed, 0xf8, 0xfb),
                Rgb::new(0xb2, 0xe2, 0xe2),
                Rgb::new(0x66, 0xc2, 0xa4),
                Rgb::new(0x2c, 0xa2, 0x5f),
                Rgb::new(0x00, 0x6d, 0x2c),
            ],
            no_data: Rgb::new(0x6b, 0x6b, 0x6b),
        }
    }
}
impl ClassificationConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.class_count < 2 {
            return Err(ConfigError::InvalidValue {
                field: "classification.class_count".to_string(),
                value: self.class_count.to_string(),
            });
        }
        if self.palette.len() != self.class_count {
            return Err(ConfigError::PaletteSize {
                expected: self.class_count,
                found: self.palette.len(),
            });
        }
        if self.palette.contains(&self.no_data) {
            return Err(ConfigError::InvalidValue {
                field: "classification.no_data".to_string(),
                value: format!("{} duplicates a class colour", self.no_data),
            });
        }
        Ok(())
    }
}

/// A threshold step function from values to class colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBreaks {
    pub attribute: AttributeName,
    /// `class_count - 1` non-decreasing thresholds, empty when there was no
    /// input.
    pub thresholds: Vec<f64>,
    pub colors: Vec<Rgb>,
    pub no_data: Rgb,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sample_count: usize,
}
impl ClassBreaks {
    pub fn class_count(&self) -> usize {
        self.colors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
    /// Index of the highest class whose threshold is `<= value`.
    pub fn class_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || self.is_empty() {
            return None;
        }
        let idx = self.thresholds.partition_point(|t| *t <= value);
        Some(idx.min(self.colors.len().saturating_sub(1)))
    }
    pub fn color_for(&self, value: Option<f64>) -> Rgb {
        value
            .and_then(|v| self.class_of(v))
            .and_then(|idx| self.colors.get(idx).copied())
            .unwrap_or(self.no_data)
    }
    /// Value range covered by each class; `None` for classes no value can
    /// fall into (duplicate thresholds).
    pub fn class_ranges(&self) -> Vec<Option<(f64, f64)>> {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            return vec![None; self.class_count()];
        };
        (0..self.class_count())
            .map(|idx| {
                let lower = if idx == 0 { min } else { self.thresholds[idx - 1] };
                match self.thresholds.get(idx) {
                    Some(upper) if lower >= *upper => None,
                    Some(upper) => Some((lower, *upper)),
                    None => Some((lower, max.max(lower))),
                }
            })
            .collect()
    }
}

pub struct Classifier<'a> {
    config: &'a ClassificationConfig,
}
impl<'a> Classifier<'a> {
    pub fn new(config: &'a ClassificationConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, attribute: &AttributeName, values: &[f64]) -> ClassBreaks {
        let class_count = self.config.class_count.max(1);
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let thresholds = if sorted.is_empty() {
            Vec::new()
        } else {
            let breaks = natural_breaks(&sorted, class_count);
            pad_thresholds(breaks, &sorted, class_count - 1)
        };
        let mut colors = self.config.palette.clone();
        colors.resize(class_count, self.config.no_data);
        ClassBreaks {
            attribute: attribute.clone(),
            thresholds,
            colors,
            no_data: self.config.no_data,
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            sample_count: sorted.len(),
        }
    }

    pub fn build_for_features(
        &self,
        attribute: &AttributeName,
        features: &[Feature],
    ) -> ClassBreaks {
        let values: Vec<f64> = features.iter().filter_map(|f| f.value(attribute)).collect();
        self.build(attribute, &values)
    }
}

/// Short break lists are extended with the last break (or the single value)
/// so the result always has `wanted` entries.
fn pad_thresholds(mut breaks: Vec<f64>, sorted: &[f64], wanted: usize) -> Vec<f64> {
    let fill = breaks.last().copied().unwrap_or(sorted[sorted.len() - 1]);
    breaks.resize(wanted, fill);
    breaks
}

/// Cluster lower bounds (excluding the first cluster) for sorted input.
pub fn natural_breaks(sorted: &[f64], class_count: usize) -> Vec<f64> {
    ckmeans(sorted, class_count)
        .iter()
        .skip(1)
        .map(|range| sorted[range.start])
        .collect()
}

/// Optimal partition of `sorted` into at most `k` contiguous clusters. The
/// cluster count drops to the number of distinct values when that is smaller.
pub fn ckmeans(sorted: &[f64], k: usize) -> Vec<std::ops::Range<usize>> {
    let n = sorted.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }
    let distinct = 1 + sorted.windows(2).filter(|w| w[0] != w[1]).count();
    let k = k.min(distinct);
    if k == 1 {
        return vec![0..n];
    }

    // Prefix sums are taken over values shifted by the median.
    let shift = sorted[n / 2];
    let mut sum = vec![0.0; n + 1];
    let mut sum_sq = vec![0.0; n + 1];
    for (i, v) in sorted.iter().enumerate() {
        let d = v - shift;
        sum[i + 1] = sum[i] + d;
        sum_sq[i + 1] = sum_sq[i] + d * d;
    }
    let ssq = |j: usize, i: usize| -> f64 {
        let count = (i - j + 1) as f64;
        let s = sum[i + 1] - sum[j];
        (sum_sq[i + 1] - sum_sq[j] - s * s / count).max(0.0)
    };

    // cost[c][i]: best cost of splitting sorted[..=i] into c + 1 clusters;
    // start[c][i]: first index of the last of those clusters.
    let mut cost = vec![vec![f64::INFINITY; n]; k];
    let mut start = vec![vec![0usize; n]; k];
    for i in 0..n {
        cost[0][i] = ssq(0, i);
    }
    for c in 1..k {
        for i in c..n {
            for j in c..=i {
                let candidate = cost[c - 1][j - 1] + ssq(j, i);
                if candidate < cost[c][i] {
                    cost[c][i] = candidate;
                    start[c][i] = j;
                }
            }
        }
    }

    let mut clusters = Vec::with_capacity(k);
    let mut end = n;
    for c in (0..k).rev() {
        let first = if c == 0 { 0 } else { start[c][end - 1] };
        clusters.push(first..end);
        end = first;
    }
    clusters.reverse();
    clusters
}
