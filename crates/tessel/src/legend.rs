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

use crate::classify::ClassBreaks;
use crate::color::Rgb;
use crate::format::ValueFormat;
use serde::{Deserialize, Serialize};

pub const NO_DATA_LABEL: &str = "No data";
const EMPTY_CLASS_LABEL: &str = "(no values)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendRow {
    pub color: Rgb,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendSnapshot {
    pub title: String,
    /// One row per class in ascending order, then the no-data row.
    pub rows: Vec<LegendRow>,
}
impl LegendSnapshot {
    pub fn build(breaks: &ClassBreaks, title: impl Into<String>, format: &ValueFormat) -> Self {
        let mut rows: Vec<LegendRow> = breaks
            .class_ranges()
            .into_iter()
            .zip(&breaks.colors)
            .map(|(range, color)| LegendRow {
                color: *color,
                label: match range {
                    Some((lower, upper)) => {
                        format!("{} - {}", format.format(lower), format.format(upper))
                    }
                    None => EMPTY_CLASS_LABEL.to_string(),
                },
            })
            .collect();
        rows.push(LegendRow {
            color: breaks.no_data,
            label: NO_DATA_LABEL.to_string(),
        });
        Self {
            title: title.into(),
            rows,
        }
    }
    pub fn class_rows(&self) -> &[LegendRow] {
        &self.rows[..self.rows.len().saturating_sub(1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttributeName;
    use crate::classify::{ClassificationConfig, Classifier};

    fn breaks(values: &[f64]) -> ClassBreaks {
        Classifier::new(&ClassificationConfig::default())
            .build(&AttributeName::new("Total_Taxes"), values)
    }

    #[test]
    fn one_row_per_class_plus_no_data() {
        let b = breaks(&[1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 50.0, 51.0, 90.0, 2000.0]);
        let legend = LegendSnapshot::build(&b, "Total Taxes", &ValueFormat::default());
        assert_eq!(legend.rows.len(), 6);
        assert_eq!(legend.class_rows().len(), 5);
        assert_eq!(legend.rows[0].label, "$1 - $10");
        assert_eq!(legend.rows[4].label, "$2,000 - $2,000");
        assert_eq!(legend.rows[5].label, NO_DATA_LABEL);
        assert_eq!(legend.rows[5].color, b.no_data);
    }

    #[test]
    fn empty_classes_are_marked() {
        let legend = LegendSnapshot::build(&breaks(&[]), "Total Taxes", &ValueFormat::plain());
        assert!(legend
            .class_rows()
            .iter()
            .all(|row| row.label == EMPTY_CLASS_LABEL));
    }
}
