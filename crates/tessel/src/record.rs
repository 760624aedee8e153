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

//! Tabular records, geographic features and the property bags that join them.

use crate::catalog::AttributeName;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static GROUPED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?\$?(\d{1,3}(?:,\d{3})+)(\.\d+)?$").expect("grouped number pattern")
});

/// A cell as it arrived from the tabular source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}
impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}
impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}
impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// A joined attribute value. Only finite numbers are stored as `Number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}
impl AttributeValue {
    pub fn parse(raw: &RawValue) -> Self {
        match raw {
            RawValue::Number(n) if n.is_finite() => AttributeValue::Number(*n),
            RawValue::Number(n) => AttributeValue::Text(n.to_string()),
            RawValue::Text(text) => match parse_number(text) {
                Some(n) => AttributeValue::Number(n),
                None => AttributeValue::Text(text.clone()),
            },
        }
    }
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }
    pub fn is_numeric(&self) -> bool {
        matches!(self, AttributeValue::Number(_))
    }
}

/// Accepts plain numbers and thousands-grouped figures such as `$1,234.50`.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    let caps = GROUPED_NUMBER.captures(trimmed)?;
    let mut plain = String::with_capacity(trimmed.len());
    if caps.get(1).is_some() {
        plain.push('-');
    }
    plain.extend(caps[2].chars().filter(|c| *c != ','));
    if let Some(frac) = caps.get(3) {
        plain.push_str(frac.as_str());
    }
    plain.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    values: IndexMap<String, RawValue>,
}
impl Record {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.values.get(column)
    }
    /// The join-key cell rendered as text; numbers are printed without a
    /// fractional part when they have none.
    pub fn key(&self, join_key: &AttributeName) -> Option<String> {
        match self.values.get(join_key.as_str())? {
            RawValue::Text(t) => Some(t.clone()),
            RawValue::Number(n) if n.fract() == 0.0 => Some(format!("{n:.0}")),
            RawValue::Number(n) => Some(n.to_string()),
        }
    }
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyBag {
    values: IndexMap<AttributeName, AttributeValue>,
}
impl PropertyBag {
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_number)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeName, &AttributeValue)> {
        self.values.iter()
    }
    /// Replaces the whole bag. Joins write every catalog entry at once so a
    /// bag is never left half-populated.
    pub(crate) fn replace(&mut self, values: IndexMap<AttributeName, AttributeValue>) {
        self.values = values;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub code: String,
    pub geometry: Option<geojson::Geometry>,
    pub properties: PropertyBag,
}
impl Feature {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            geometry: None,
            properties: PropertyBag::default(),
        }
    }
    pub fn with_geometry(mut self, geometry: geojson::Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
    pub fn is_joined(&self) -> bool {
        !self.properties.is_empty()
    }
    pub fn value(&self, attribute: &AttributeName) -> Option<f64> {
        self.properties.number(attribute.as_str())
    }
}
