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

use crate::error::{ConfigError, ConfigResult, SelectionError, SelectionResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeName(String);
impl AttributeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// Human-readable form used in titles, legends and the selector.
    pub fn label(&self) -> String {
        self.0.replace('_', " ")
    }
}
impl Borrow<str> for AttributeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl From<&str> for AttributeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOption {
    pub name: AttributeName,
    pub label: String,
}

/// Ordered attribute list. The join key is always the first entry; the
/// remaining entries keep the order they were declared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCatalog {
    entries: Vec<AttributeName>,
    default: AttributeName,
}
impl AttributeCatalog {
    pub fn new(
        join_key: AttributeName,
        attributes: Vec<AttributeName>,
        default: AttributeName,
    ) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        seen.insert(join_key.clone());
        for attr in &attributes {
            if !seen.insert(attr.clone()) {
                return Err(ConfigError::DuplicateAttribute {
                    name: attr.to_string(),
                });
            }
        }
        if !attributes.contains(&default) {
            return Err(ConfigError::UnknownDefault {
                name: default.to_string(),
            });
        }
        let mut entries = Vec::with_capacity(attributes.len() + 1);
        entries.push(join_key);
        entries.extend(attributes);
        Ok(Self { entries, default })
    }
    pub fn join_key(&self) -> &AttributeName {
        &self.entries[0]
    }
    pub fn default_attribute(&self) -> &AttributeName {
        &self.default
    }
    /// Every catalog entry, join key included.
    pub fn entries(&self) -> &[AttributeName] {
        &self.entries
    }
    pub fn selectable(&self) -> &[AttributeName] {
        &self.entries[1..]
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.as_str() == name)
    }
    pub fn selector_options(&self) -> Vec<SelectorOption> {
        self.selectable()
            .iter()
            .map(|name| SelectorOption {
                name: name.clone(),
                label: name.label(),
            })
            .collect()
    }
    pub fn validate_selection(&self, name: &str) -> SelectionResult<&AttributeName> {
        if self.join_key().as_str() == name {
            return Err(SelectionError::JoinKeySelected {
                name: name.to_string(),
            });
        }
        self.selectable()
            .iter()
            .find(|e| e.as_str() == name)
            .ok_or_else(|| SelectionError::UnknownAttribute {
                name: name.to_string(),
            })
    }
}
