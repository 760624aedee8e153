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

pub mod catalog;
pub mod chart;
pub mod classify;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod interaction;
pub mod join;
pub mod legend;
pub mod loader;
pub mod logging;
pub mod projection;
pub mod record;
pub mod scale;
pub mod svg;

pub use catalog::{AttributeCatalog, AttributeName, SelectorOption};
pub use chart::{ChartLayout, ChartModel, ChartSnapshot, SortedEntry};
pub use classify::{ClassBreaks, ClassificationConfig, Classifier};
pub use color::Rgb;
pub use config::TesselConfig;
pub use controller::{
    ControllerState, CoordinationController, FeatureFill, MapSnapshot, TitleSnapshot, ViewEvent,
    ViewInstruction, ViewSink,
};
pub use error::{
    ConfigError, ErrorReporter, ErrorSeverity, LoadError, RenderError, Result, SelectionError,
    TesselError,
};
pub use format::ValueFormat;
pub use interaction::{HoverInstruction, InteractionState, Label, Point};
pub use join::{JoinPolicy, JoinReport, RecordJoiner};
pub use legend::LegendSnapshot;
pub use loader::{load_configured, load_dataset, Dataset};
pub use record::{AttributeValue, Feature, Record};
pub use svg::SvgScene;

/// Loads both data sources named by `config` and builds a controller over
/// the joined result.
pub async fn open(config: &TesselConfig) -> Result<CoordinationController> {
    let dataset = load_configured(config).await?;
    Ok(CoordinationController::from_dataset(config, dataset)?)
}
