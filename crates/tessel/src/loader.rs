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

//! Reading the two data sources. Both loads run on the blocking pool and
//! are joined before anything else happens; a failure of either one fails
//! the whole acquisition.

use crate::catalog::AttributeName;
use crate::config::{IdentityConfig, TesselConfig};
use crate::error::{LoadError, LoadResult};
use crate::record::{Feature, Record};
use geojson::GeoJson;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub features: Vec<Feature>,
}

pub fn load_records(path: &Path, join_key: &AttributeName) -> LoadResult<Vec<Record>> {
    let csv_error = |source: csv::Error| LoadError::RecordFile {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();
    if !headers.iter().any(|h| h == join_key.as_str()) {
        return Err(LoadError::MissingColumn {
            path: path.display().to_string(),
            column: join_key.to_string(),
        });
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        records.push(Record::from_pairs(headers.iter().zip(row.iter())));
    }
    debug!(path = %path.display(), rows = records.len(), columns = headers.len(), "Loaded records");
    Ok(records)
}

pub fn load_features(path: &Path, identity: &IdentityConfig) -> LoadResult<Vec<Feature>> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::FeatureFile {
        path: path.display().to_string(),
        source,
    })?;
    let geojson = content
        .parse::<GeoJson>()
        .map_err(|source| LoadError::GeoJson {
            path: path.display().to_string(),
            source,
        })?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(LoadError::NotFeatureCollection {
            path: path.display().to_string(),
        });
    };

    let features: Vec<Feature> = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let property = |key: &str| {
                feature
                    .properties
                    .as_ref()
                    .and_then(|props| props.get(key))
                    .and_then(property_text)
            };
            let code = property(&identity.code_property).unwrap_or_else(|| {
                warn!(
                    index = idx,
                    property = %identity.code_property,
                    "Feature has no code and will not join"
                );
                String::new()
            });
            let name = property(&identity.name_property).unwrap_or_else(|| code.clone());
            let mut out = Feature::new(name, code);
            out.geometry = feature.geometry;
            out
        })
        .collect();
    debug!(path = %path.display(), features = features.len(), "Loaded features");
    Ok(features)
}

fn property_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Loads both sources concurrently and waits for both.
pub async fn load_dataset(
    records_path: PathBuf,
    features_path: PathBuf,
    join_key: AttributeName,
    identity: IdentityConfig,
) -> LoadResult<Dataset> {
    let started = Instant::now();
    let records_task = tokio::task::spawn_blocking(move || load_records(&records_path, &join_key));
    let features_task =
        tokio::task::spawn_blocking(move || load_features(&features_path, &identity));
    let (records, features) = tokio::join!(records_task, features_task);

    let records = records
        .map_err(|e| task_failed("records", &e))
        .and_then(|r| r);
    let features = features
        .map_err(|e| task_failed("features", &e))
        .and_then(|f| f);

    match (records, features) {
        (Ok(records), Ok(features)) => {
            info!(
                records = records.len(),
                features = features.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Dataset loaded"
            );
            Ok(Dataset { records, features })
        }
        (Err(records), Err(features)) => Err(LoadError::BothSources {
            records: Box::new(records),
            features: Box::new(features),
        }),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
    }
}

pub async fn load_configured(config: &TesselConfig) -> LoadResult<Dataset> {
    load_dataset(
        config.data.records.clone(),
        config.data.features.clone(),
        config.catalog.join_key.clone(),
        config.identity.clone(),
    )
    .await
}

fn task_failed(source_kind: &str, error: &tokio::task::JoinError) -> LoadError {
    LoadError::TaskFailed {
        source_kind: source_kind.to_string(),
        reason: error.to_string(),
    }
}
