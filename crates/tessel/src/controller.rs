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

//! The coordination controller owns the expressed attribute and the current
//! classification. Views never read either directly: every change reaches
//! them as an ordered list of owned [`ViewInstruction`]s.

use crate::catalog::{AttributeCatalog, AttributeName, SelectorOption};
use crate::chart::{ChartLayout, ChartModel, ChartSnapshot};
use crate::classify::{ClassBreaks, ClassificationConfig, Classifier};
use crate::color::Rgb;
use crate::config::{TesselConfig, TitleConfig};
use crate::error::{ConfigResult, SelectionResult};
use crate::format::ValueFormat;
use crate::interaction::{HoverInstruction, InteractionState, Label, Point};
use crate::join::{JoinPolicy, JoinReport, RecordJoiner};
use crate::legend::LegendSnapshot;
use crate::loader::Dataset;
use crate::logging::{
    log_classification, log_error, log_join_report, log_transition, log_view_event,
};
use crate::record::{Feature, Record};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    Idle,
    Transitioning,
}
impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "idle",
            ControllerState::Transitioning => "transitioning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewEvent {
    AttributeChanged(String),
    Hover(String),
    Unhover(String),
    PointerMoved(Point),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFill {
    pub code: String,
    pub name: String,
    pub value: Option<f64>,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub attribute: AttributeName,
    /// One fill per feature, in feature order.
    pub fills: Vec<FeatureFill>,
}
impl MapSnapshot {
    pub fn fill(&self, code: &str) -> Option<&FeatureFill> {
        self.fills.iter().find(|f| f.code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSnapshot {
    pub map_title: String,
    pub chart_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewInstruction {
    RecolorMap(MapSnapshot),
    RebuildChart(ChartSnapshot),
    RebuildLegend(LegendSnapshot),
    UpdateTitles(TitleSnapshot),
    Hover(HoverInstruction),
}
impl ViewInstruction {
    pub fn kind(&self) -> &'static str {
        match self {
            ViewInstruction::RecolorMap(_) => "recolor_map",
            ViewInstruction::RebuildChart(_) => "rebuild_chart",
            ViewInstruction::RebuildLegend(_) => "rebuild_legend",
            ViewInstruction::UpdateTitles(_) => "update_titles",
            ViewInstruction::Hover(_) => "hover",
        }
    }
}

/// Anything that draws: receives instructions in the order they were issued.
pub trait ViewSink {
    fn apply(&mut self, instruction: &ViewInstruction);

    fn apply_all(&mut self, instructions: &[ViewInstruction]) {
        for instruction in instructions {
            self.apply(instruction);
        }
    }
}

pub struct CoordinationController {
    catalog: AttributeCatalog,
    policy: JoinPolicy,
    classification: ClassificationConfig,
    titles: TitleConfig,
    chart_layout: ChartLayout,
    format: ValueFormat,
    features: Vec<Feature>,
    report: JoinReport,
    expressed: AttributeName,
    breaks: ClassBreaks,
    chart: ChartModel,
    interaction: InteractionState,
    state: ControllerState,
}
impl CoordinationController {
    /// Joins `records` into `features` once; later attribute changes reuse
    /// the joined set.
    pub fn new(
        config: &TesselConfig,
        mut features: Vec<Feature>,
        records: &[Record],
    ) -> ConfigResult<Self> {
        config.validate()?;
        let catalog = config.build_catalog()?;
        let report = RecordJoiner::new(&catalog, &config.join).join(&mut features, records);
        log_join_report(&report);

        let expressed = catalog.default_attribute().clone();
        let breaks =
            Classifier::new(&config.classification).build_for_features(&expressed, &features);
        log_classification(&breaks);
        let chart = ChartModel::build(&features, &expressed, &config.chart);
        Ok(Self {
            catalog,
            policy: config.join.clone(),
            classification: config.classification.clone(),
            titles: config.titles.clone(),
            chart_layout: config.chart,
            format: config.format.clone(),
            features,
            report,
            expressed,
            breaks,
            chart,
            interaction: InteractionState::new(config.label, config.map.viewport()),
            state: ControllerState::Idle,
        })
    }

    pub fn from_dataset(config: &TesselConfig, dataset: Dataset) -> ConfigResult<Self> {
        Self::new(config, dataset.features, &dataset.records)
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }
    pub fn expressed(&self) -> &AttributeName {
        &self.expressed
    }
    pub fn breaks(&self) -> &ClassBreaks {
        &self.breaks
    }
    pub fn chart(&self) -> &ChartModel {
        &self.chart
    }
    pub fn join_report(&self) -> &JoinReport {
        &self.report
    }
    pub fn state(&self) -> ControllerState {
        self.state
    }
    pub fn features(&self) -> &[Feature] {
        &self.features
    }
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }
    pub fn selector_options(&self) -> Vec<SelectorOption> {
        self.catalog.selector_options()
    }

    pub fn initial_render(&self) -> Vec<ViewInstruction> {
        self.render_views()
    }

    /// Rejects names outside the selectable catalog without touching any
    /// state.
    pub fn change_attribute(&mut self, name: &str) -> SelectionResult<Vec<ViewInstruction>> {
        let next = match self.catalog.validate_selection(name) {
            Ok(next) => next.clone(),
            Err(error) => {
                log_error("change_attribute", &error);
                return Err(error);
            }
        };
        self.state = ControllerState::Transitioning;
        let previous = std::mem::replace(&mut self.expressed, next);

        self.breaks = Classifier::new(&self.classification)
            .build_for_features(&self.expressed, &self.features);
        log_classification(&self.breaks);
        self.chart = ChartModel::build(&self.features, &self.expressed, &self.chart_layout);

        let mut out = self.render_views();
        let refreshed = self
            .interaction
            .highlighted()
            .and_then(|code| self.feature(code))
            .and_then(|feature| self.interaction.refresh(self.label_for(feature)));
        if let Some(instruction) = refreshed {
            out.push(ViewInstruction::Hover(instruction));
        }
        self.state = ControllerState::Idle;
        log_transition(previous.as_str(), self.expressed.as_str(), out.len());
        Ok(out)
    }

    pub fn dispatch(&mut self, event: ViewEvent) -> SelectionResult<Vec<ViewInstruction>> {
        log_view_event("dispatch", json!({ "event": event }));
        let hover = match event {
            ViewEvent::AttributeChanged(name) => return self.change_attribute(&name),
            ViewEvent::Hover(code) => match self.feature(&code) {
                Some(feature) => {
                    let label = self.label_for(feature);
                    self.interaction.enter(label)
                }
                None => {
                    debug!(code = %code, "Hover on unknown code");
                    Vec::new()
                }
            },
            ViewEvent::Unhover(code) => self.interaction.leave(&code),
            ViewEvent::PointerMoved(point) => self.interaction.move_to(point),
        };
        Ok(hover.into_iter().map(ViewInstruction::Hover).collect())
    }

    /// Dispatches and forwards the resulting instructions to `sink`.
    pub fn dispatch_to(
        &mut self,
        event: ViewEvent,
        sink: &mut dyn ViewSink,
    ) -> SelectionResult<usize> {
        let instructions = self.dispatch(event)?;
        sink.apply_all(&instructions);
        Ok(instructions.len())
    }

    pub fn map_snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            attribute: self.expressed.clone(),
            fills: self
                .features
                .iter()
                .filter(|f| !self.policy.is_excluded(&f.code))
                .map(|f| {
                    let value = f.value(&self.expressed);
                    FeatureFill {
                        code: f.code.clone(),
                        name: f.name.clone(),
                        value,
                        color: self.breaks.color_for(value),
                    }
                })
                .collect(),
        }
    }
    pub fn titles(&self) -> TitleSnapshot {
        TitleSnapshot {
            map_title: self.titles.map_title(&self.expressed),
            chart_title: self.titles.chart_title(&self.expressed),
        }
    }
    pub fn legend_snapshot(&self) -> LegendSnapshot {
        LegendSnapshot::build(&self.breaks, self.expressed.label(), &self.format)
    }
    pub fn chart_snapshot(&self) -> ChartSnapshot {
        self.chart
            .snapshot(&self.breaks, &self.titles.chart_title(&self.expressed), &self.format)
    }

    fn render_views(&self) -> Vec<ViewInstruction> {
        vec![
            ViewInstruction::RecolorMap(self.map_snapshot()),
            ViewInstruction::RebuildChart(self.chart_snapshot()),
            ViewInstruction::RebuildLegend(self.legend_snapshot()),
            ViewInstruction::UpdateTitles(self.titles()),
        ]
    }

    fn feature(&self, code: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.code == code)
    }

    fn label_for(&self, feature: &Feature) -> Label {
        Label {
            code: feature.code.clone(),
            name: feature.name.clone(),
            text: self.format.format_opt(feature.value(&self.expressed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;

    fn config() -> TesselConfig {
        TesselConfig {
            catalog: CatalogConfig {
                join_key: "Abbreviation".into(),
                attributes: vec!["Total_Taxes".into(), "Severance_Taxes".into()],
                default: "Total_Taxes".into(),
            },
            ..Default::default()
        }
    }

    fn controller() -> CoordinationController {
        let features = vec![
            Feature::new("California", "CA"),
            Feature::new("Texas", "TX"),
            Feature::new("New York", "NY"),
        ];
        let records = vec![
            Record::from_pairs([
                ("Abbreviation", "CA"),
                ("Total_Taxes", "100"),
                ("Severance_Taxes", "1"),
            ]),
            Record::from_pairs([
                ("Abbreviation", "TX"),
                ("Total_Taxes", "50"),
                ("Severance_Taxes", "90"),
            ]),
            Record::from_pairs([
                ("Abbreviation", "NY"),
                ("Total_Taxes", "75"),
                ("Severance_Taxes", "(X)"),
            ]),
        ];
        CoordinationController::new(&config(), features, &records).unwrap()
    }

    #[test]
    fn initial_render_is_ordered_and_uses_default() {
        let c = controller();
        let kinds: Vec<_> = c.initial_render().iter().map(ViewInstruction::kind).collect();
        assert_eq!(kinds, vec!["recolor_map", "rebuild_chart", "rebuild_legend", "update_titles"]);
        assert_eq!(c.expressed().as_str(), "Total_Taxes");
        assert_eq!(c.chart().codes(), vec!["CA", "NY", "TX"]);
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[test]
    fn invalid_selection_leaves_state_untouched() {
        let mut c = controller();
        let before = (c.expressed().clone(), c.breaks().clone(), c.chart().clone());
        assert!(c.change_attribute("Abbreviation").is_err());
        assert!(c.dispatch(ViewEvent::AttributeChanged("Bogus".into())).is_err());
        assert_eq!((c.expressed().clone(), c.breaks().clone(), c.chart().clone()), before);
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[test]
    fn visible_label_is_refreshed_after_titles() {
        let mut c = controller();
        c.dispatch(ViewEvent::Hover("NY".into())).unwrap();
        let out = c.change_attribute("Severance_Taxes").unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(
            out.last(),
            Some(&ViewInstruction::Hover(HoverInstruction::ShowLabel(Label {
                code: "NY".to_string(),
                name: "New York".to_string(),
                text: "no data".to_string(),
            })))
        );
    }

    #[test]
    fn hover_on_unknown_code_is_ignored() {
        let mut c = controller();
        assert!(c.dispatch(ViewEvent::Hover("ZZ".into())).unwrap().is_empty());
        assert_eq!(c.interaction().highlighted(), None);
    }

    #[derive(Default)]
    struct Recorder(Vec<&'static str>);
    impl ViewSink for Recorder {
        fn apply(&mut self, instruction: &ViewInstruction) {
            self.0.push(instruction.kind());
        }
    }

    #[test]
    fn dispatch_to_forwards_in_order() {
        let mut c = controller();
        let mut sink = Recorder::default();
        let n = c
            .dispatch_to(ViewEvent::AttributeChanged("Severance_Taxes".into()), &mut sink)
            .unwrap();
        assert_eq!(n, 4);
        assert_eq!(sink.0, vec!["recolor_map", "rebuild_chart", "rebuild_legend", "update_titles"]);
    }
}
