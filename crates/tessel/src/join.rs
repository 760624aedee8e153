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

use crate::catalog::{AttributeCatalog, AttributeName};
use crate::record::{AttributeValue, Feature, RawValue, Record};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinPolicy {
    /// Join-key values treated as aggregate rows (e.g. a national total) and
    /// kept out of the map, the classification and the ranking.
    pub excluded_codes: Vec<String>,
}
impl JoinPolicy {
    pub fn excluding<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_codes: codes.into_iter().map(Into::into).collect(),
        }
    }
    pub fn is_excluded(&self, code: &str) -> bool {
        self.excluded_codes.iter().any(|c| c == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinReport {
    pub matched: usize,
    /// Join-key values with no feature carrying that code.
    pub unmatched_records: Vec<String>,
    /// Codes of features no record matched.
    pub unmatched_features: Vec<String>,
    pub excluded_records: Vec<String>,
    /// Records whose join-key cell is missing or blank, by row index.
    pub keyless_records: Vec<usize>,
    /// Codes matched by more than one record; the later record wins.
    pub duplicate_codes: Vec<String>,
}
impl JoinReport {
    pub fn unmatched_record_count(&self) -> usize {
        self.unmatched_records.len() + self.keyless_records.len()
    }
    pub fn is_complete(&self) -> bool {
        self.unmatched_record_count() == 0 && self.unmatched_features.is_empty()
    }
    pub fn summary(&self) -> String {
        format!(
            "{} matched, {} unmatched records, {} unmatched features, {} excluded",
            self.matched,
            self.unmatched_record_count(),
            self.unmatched_features.len(),
            self.excluded_records.len()
        )
    }
}

pub struct RecordJoiner<'a> {
    catalog: &'a AttributeCatalog,
    policy: &'a JoinPolicy,
}
impl<'a> RecordJoiner<'a> {
    pub fn new(catalog: &'a AttributeCatalog, policy: &'a JoinPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn join(&self, features: &mut [Feature], records: &[Record]) -> JoinReport {
        let join_key = self.catalog.join_key();
        let mut report = JoinReport::default();
        let mut hit = vec![false; features.len()];

        for (row, record) in records.iter().enumerate() {
            let Some(key) = record.key(join_key).filter(|k| !k.trim().is_empty()) else {
                warn!(row, column = %join_key, "Record has no join key");
                report.keyless_records.push(row);
                continue;
            };
            if self.policy.is_excluded(&key) {
                debug!(code = %key, "Skipping aggregate record");
                report.excluded_records.push(key);
                continue;
            }
            let Some(idx) = features
                .iter()
                .position(|f| !f.code.is_empty() && f.code == key)
            else {
                debug!(code = %key, "No feature for record");
                report.unmatched_records.push(key);
                continue;
            };
            if hit[idx] {
                warn!(code = %key, "Feature matched by more than one record");
                report.duplicate_codes.push(key);
            } else {
                report.matched += 1;
            }
            hit[idx] = true;
            features[idx].properties.replace(self.bag_for(record));
        }

        report.unmatched_features = features
            .iter()
            .zip(&hit)
            .filter(|(f, matched)| !**matched && !self.policy.is_excluded(&f.code))
            .map(|(f, _)| f.code.clone())
            .collect();
        report
    }

    fn bag_for(&self, record: &Record) -> IndexMap<AttributeName, AttributeValue> {
        self.catalog
            .entries()
            .iter()
            .map(|name| {
                let value = match record.get(name.as_str()) {
                    Some(RawValue::Text(t)) if name == self.catalog.join_key() => {
                        AttributeValue::Text(t.clone())
                    }
                    Some(raw) => AttributeValue::parse(raw),
                    None => AttributeValue::Text(String::new()),
                };
                (name.clone(), value)
            })
            .collect()
    }
}
