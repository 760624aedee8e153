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

use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

pub const NO_DATA_TEXT: &str = "no data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueFormat {
    pub prefix: String,
    pub suffix: String,
    pub decimals: usize,
}
impl Default for ValueFormat {
    fn default() -> Self {
        Self {
            prefix: "$".to_string(),
            suffix: String::new(),
            decimals: 0,
        }
    }
}
impl ValueFormat {
    pub fn plain() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            decimals: 0,
        }
    }
    pub fn format(&self, value: f64) -> String {
        let fixed = format!("{:.*}", self.decimals, value.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };
        let grouped = int_part
            .parse::<u128>()
            .map_or_else(|_| int_part.to_string(), |n| n.to_formatted_string(&Locale::en));
        let sign = if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
            "-"
        } else {
            ""
        };
        match frac_part {
            Some(frac) => format!("{sign}{}{grouped}.{frac}{}", self.prefix, self.suffix),
            None => format!("{sign}{}{grouped}{}", self.prefix, self.suffix),
        }
    }
    pub fn format_opt(&self, value: Option<f64>) -> String {
        value.map_or_else(|| NO_DATA_TEXT.to_string(), |v| self.format(v))
    }
}
