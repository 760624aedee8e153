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

//! Ranked bar chart model: the joined features sorted by the expressed
//! attribute plus the value and rank scales used to lay out bars and axes.

use crate::catalog::AttributeName;
use crate::classify::ClassBreaks;
use crate::color::Rgb;
use crate::format::ValueFormat;
use crate::record::Feature;
use crate::scale::LinearScale;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const VALUE_TICK_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    /// Horizontal gap between neighbouring bars.
    pub bar_gap: f64,
}
impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 460.0,
            margin_top: 50.0,
            margin_right: 20.0,
            margin_bottom: 40.0,
            margin_left: 90.0,
            bar_gap: 2.0,
        }
    }
}
impl ChartLayout {
    pub fn inner_width(&self) -> f64 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }
    pub fn inner_height(&self) -> f64 {
        (self.height - self.margin_top - self.margin_bottom).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedEntry {
    pub code: String,
    pub name: String,
    pub value: Option<f64>,
    /// Position of the feature in the controller's feature list.
    pub index: usize,
}

/// Joined features ranked by one attribute, largest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartModel {
    pub attribute: AttributeName,
    pub sorted: Vec<SortedEntry>,
    pub value_scale: LinearScale,
    pub rank_scale: LinearScale,
    pub layout: ChartLayout,
}
impl ChartModel {
    /// Unjoined features are left out. Ties keep feature order and features
    /// missing the attribute follow every valued one.
    pub fn build(features: &[Feature], attribute: &AttributeName, layout: &ChartLayout) -> Self {
        let mut sorted: Vec<SortedEntry> = features
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_joined())
            .map(|(index, f)| SortedEntry {
                code: f.code.clone(),
                name: f.name.clone(),
                value: f.value(attribute),
                index,
            })
            .collect();
        sorted.sort_by(|a, b| descending(a.value, b.value));

        let max = sorted
            .iter()
            .filter_map(|e| e.value)
            .fold(0.0_f64, f64::max);
        let value_scale = LinearScale::guarded((0.0, max), (layout.inner_height(), 0.0));
        let rank_scale =
            LinearScale::guarded((0.0, sorted.len() as f64), (0.0, layout.inner_width()));
        Self {
            attribute: attribute.clone(),
            sorted,
            value_scale,
            rank_scale,
            layout: *layout,
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
    pub fn codes(&self) -> Vec<&str> {
        self.sorted.iter().map(|e| e.code.as_str()).collect()
    }
    pub fn rank_of(&self, code: &str) -> Option<usize> {
        self.sorted.iter().position(|e| e.code == code)
    }

    pub fn snapshot(
        &self,
        breaks: &ClassBreaks,
        title: &str,
        format: &ValueFormat,
    ) -> ChartSnapshot {
        let inner_height = self.layout.inner_height();
        let bars = self
            .sorted
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                let x = self.rank_scale.map(rank as f64);
                let slot = self.rank_scale.map(rank as f64 + 1.0) - x;
                let y = self.value_scale.map(entry.value.unwrap_or(0.0).max(0.0));
                Bar {
                    code: entry.code.clone(),
                    name: entry.name.clone(),
                    value: entry.value,
                    rank,
                    x: x + self.layout.bar_gap / 2.0,
                    y,
                    width: (slot - self.layout.bar_gap).max(0.0),
                    height: (inner_height - y).max(0.0),
                    color: breaks.color_for(entry.value),
                }
            })
            .collect();
        let value_ticks = self
            .value_scale
            .ticks(VALUE_TICK_COUNT)
            .into_iter()
            .map(|v| Tick {
                position: self.value_scale.map(v),
                label: format.format(v),
            })
            .collect();
        let rank_ticks = self
            .sorted
            .iter()
            .enumerate()
            .map(|(rank, entry)| Tick {
                position: self.rank_scale.map(rank as f64 + 0.5),
                label: entry.code.clone(),
            })
            .collect();
        ChartSnapshot {
            title: title.to_string(),
            layout: self.layout,
            bars,
            value_ticks,
            rank_ticks,
        }
    }
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub code: String,
    pub name: String,
    pub value: Option<f64>,
    pub rank: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Everything the chart view needs to redraw, in inner-plot coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub title: String,
    pub layout: ChartLayout,
    pub bars: Vec<Bar>,
    pub value_ticks: Vec<Tick>,
    pub rank_ticks: Vec<Tick>,
}
