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

use std::path::PathBuf;

use proptest::prelude::*;
use tessel::config::{CatalogConfig, IdentityConfig};
use tessel::loader::{load_features, load_records};
use tessel::{
    AttributeName, CoordinationController, Feature, HoverInstruction, Point, Record, SvgScene,
    TesselConfig, ViewEvent, ViewInstruction, ViewSink,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_config() -> TesselConfig {
    let mut config = TesselConfig::from_yaml_file(fixture("tessel.yml")).unwrap();
    config.data.records = fixture("taxes.csv");
    config.data.features = fixture("states.geojson");
    config
}

fn fixture_controller() -> (TesselConfig, CoordinationController) {
    let config = fixture_config();
    let records = load_records(&config.data.records, &config.catalog.join_key).unwrap();
    let features = load_features(&config.data.features, &config.identity).unwrap();
    let controller = CoordinationController::new(&config, features, &records).unwrap();
    (config, controller)
}

fn single_attribute_config() -> TesselConfig {
    TesselConfig {
        catalog: CatalogConfig {
            join_key: "Abbreviation".into(),
            attributes: vec!["Total_Taxes".into()],
            default: "Total_Taxes".into(),
        },
        ..Default::default()
    }
}

fn controller_for(values: &[(&str, &str)]) -> CoordinationController {
    let features: Vec<Feature> = values
        .iter()
        .map(|(code, _)| Feature::new(*code, *code))
        .collect();
    let records: Vec<Record> = values
        .iter()
        .map(|(code, value)| Record::from_pairs([("Abbreviation", *code), ("Total_Taxes", *value)]))
        .collect();
    CoordinationController::new(&single_attribute_config(), features, &records).unwrap()
}

fn titles_of(instructions: &[ViewInstruction]) -> (String, String) {
    instructions
        .iter()
        .find_map(|i| match i {
            ViewInstruction::UpdateTitles(t) => Some((t.map_title.clone(), t.chart_title.clone())),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_fixture_join_reports_aggregate_and_unmatched_rows() {
    let (config, controller) = fixture_controller();
    let report = controller.join_report();
    assert_eq!(report.matched, 6);
    assert_eq!(report.excluded_records, vec!["US".to_string()]);
    assert_eq!(report.unmatched_records, vec!["ZZ".to_string()]);
    assert_eq!(report.unmatched_features, vec!["PR".to_string()]);

    let catalog = config.build_catalog().unwrap();
    for feature in controller.features().iter().filter(|f| f.is_joined()) {
        for name in catalog.entries() {
            assert!(feature.properties.contains(name.as_str()), "{} lacks {name}", feature.code);
        }
    }
    assert!(controller.features().iter().all(|f| f.code != "ZZ"));
    let pr = controller.features().iter().find(|f| f.code == "PR").unwrap();
    assert!(!pr.is_joined());
}

#[test]
fn test_default_ranking_is_descending() {
    let (_, controller) = fixture_controller();
    assert_eq!(controller.expressed().as_str(), "Total_Taxes");
    assert_eq!(controller.chart().codes(), vec!["CA", "NY", "TX", "FL", "WA", "OH"]);
}

#[test]
fn test_three_states_sort_ca_ny_tx() {
    let controller = controller_for(&[("CA", "100"), ("TX", "50"), ("NY", "75")]);
    assert_eq!(controller.chart().codes(), vec!["CA", "NY", "TX"]);
}

#[test]
fn test_unmatched_record_enriches_nothing() {
    let features = vec![Feature::new("Texas", "TX")];
    let records = vec![
        Record::from_pairs([("Abbreviation", "TX"), ("Total_Taxes", "5")]),
        Record::from_pairs([("Abbreviation", "ZZ"), ("Total_Taxes", "9")]),
    ];
    let controller =
        CoordinationController::new(&single_attribute_config(), features, &records).unwrap();
    assert_eq!(controller.join_report().unmatched_record_count(), 1);
    assert_eq!(controller.join_report().unmatched_records, vec!["ZZ".to_string()]);
    assert_eq!(
        controller.features()[0].value(&AttributeName::new("Total_Taxes")),
        Some(5.0)
    );
}

#[test]
fn test_identical_values_share_one_colour() {
    let controller = controller_for(&[
        ("AA", "1"),
        ("BB", "1"),
        ("CC", "1"),
        ("DD", "1"),
        ("EE", "1"),
    ]);
    let map = controller.map_snapshot();
    let first = map.fills[0].color;
    assert!(map.fills.iter().all(|f| f.color == first));
    assert_ne!(first, controller.breaks().no_data);
}

#[test]
fn test_attribute_change_updates_titles_and_recolours_with_new_breaks() {
    let (_, mut controller) = fixture_controller();
    let out = controller.change_attribute("Severance_Taxes").unwrap();
    let kinds: Vec<_> = out.iter().map(ViewInstruction::kind).collect();
    assert_eq!(kinds, vec!["recolor_map", "rebuild_chart", "rebuild_legend", "update_titles"]);

    let (map_title, chart_title) = titles_of(&out);
    assert_eq!(map_title, "2024 U.S. State Government Taxes: Severance Taxes");
    assert_eq!(chart_title, "Severance Taxes by State");

    let breaks = controller.breaks();
    assert_eq!(breaks.attribute.as_str(), "Severance_Taxes");
    let ViewInstruction::RecolorMap(map) = &out[0] else {
        panic!("first instruction must recolour the map");
    };
    for fill in &map.fills {
        assert_eq!(fill.color, breaks.color_for(fill.value));
    }
    assert_eq!(map.fill("NY").map(|f| f.color), Some(breaks.no_data));
    assert_eq!(map.fill("PR").map(|f| f.color), Some(breaks.no_data));
    assert_eq!(controller.chart().codes(), vec!["TX", "CA", "OH", "FL", "WA", "NY"]);
}

#[test]
fn test_round_trip_restores_breaks_and_ranking() {
    let (_, mut controller) = fixture_controller();
    let breaks = controller.breaks().clone();
    let chart = controller.chart().clone();
    let first = controller.initial_render();

    controller.change_attribute("Income_Taxes").unwrap();
    assert_ne!(controller.breaks(), &breaks);
    let again = controller.change_attribute("Total_Taxes").unwrap();

    assert_eq!(controller.breaks(), &breaks);
    assert_eq!(controller.chart(), &chart);
    assert_eq!(again, first);
}

#[test]
fn test_hover_switch_without_leave_keeps_one_label() {
    let (config, mut controller) = fixture_controller();
    let mut scene = SvgScene::new(&config, controller.features());
    scene.apply_all(&controller.initial_render());

    controller.dispatch_to(ViewEvent::Hover("TX".into()), &mut scene).unwrap();
    let out = controller.dispatch(ViewEvent::Hover("CA".into())).unwrap();
    scene.apply_all(&out);

    assert_eq!(controller.interaction().highlighted(), Some("CA"));
    assert_eq!(scene.highlighted(), Some("CA"));
    assert_eq!(scene.label().map(|l| l.code.as_str()), Some("CA"));
    let shown = out
        .iter()
        .filter(|i| matches!(i, ViewInstruction::Hover(HoverInstruction::ShowLabel(_))))
        .count();
    let hidden = out
        .iter()
        .filter(|i| matches!(i, ViewInstruction::Hover(HoverInstruction::HideLabel)))
        .count();
    assert_eq!((shown, hidden), (1, 1));

    assert!(controller.dispatch(ViewEvent::Unhover("TX".into())).unwrap().is_empty());
    assert_eq!(controller.interaction().highlighted(), Some("CA"));
}

#[test]
fn test_label_reads_no_data_for_unjoined_feature() {
    let (_, mut controller) = fixture_controller();
    let out = controller.dispatch(ViewEvent::Hover("PR".into())).unwrap();
    let label = out
        .iter()
        .find_map(|i| match i {
            ViewInstruction::Hover(HoverInstruction::ShowLabel(label)) => Some(label.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(label.name, "Puerto Rico");
    assert_eq!(label.text, "no data");
}

#[test]
fn test_pointer_moves_keep_label_inside_map() {
    let (config, mut controller) = fixture_controller();
    controller.dispatch(ViewEvent::Hover("WA".into())).unwrap();
    for (x, y) in [(0.0, 0.0), (1199.0, 5.0), (600.0, 649.0), (1199.0, 649.0)] {
        let out = controller.dispatch(ViewEvent::PointerMoved(Point::new(x, y))).unwrap();
        let [ViewInstruction::Hover(HoverInstruction::MoveLabel { x: lx, y: ly })] =
            out.as_slice()
        else {
            panic!("expected a single move");
        };
        assert!(*lx >= config.label.margin);
        assert!(*ly >= config.label.margin);
        assert!(lx + config.label.width <= config.map.width - config.label.margin);
        assert!(ly + config.label.height <= config.map.height - config.label.margin);
    }
}

#[test]
fn test_svg_document_contains_every_view() {
    let (config, mut controller) = fixture_controller();
    let mut scene = SvgScene::new(&config, controller.features());
    scene.apply_all(&controller.initial_render());
    controller.dispatch_to(ViewEvent::Hover("NY".into()), &mut scene).unwrap();
    controller
        .dispatch_to(ViewEvent::PointerMoved(Point::new(400.0, 300.0)), &mut scene)
        .unwrap();

    let svg = scene.render().unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("2024 U.S. State Government Taxes: Total Taxes"));
    assert!(svg.contains("Total Taxes by State"));
    assert_eq!(svg.matches("<path class=\"state ").count(), 7);
    assert_eq!(svg.matches("<rect class=\"bar ").count(), 6);
    assert!(svg.contains("No data"));
    assert!(svg.contains("id=\"NY_label\""));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.svg");
    scene.write_to(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), svg);
}

#[test]
fn test_selector_lists_catalog_without_join_key() {
    let (_, controller) = fixture_controller();
    let labels: Vec<_> = controller.selector_options().into_iter().map(|o| o.label).collect();
    assert_eq!(labels, vec!["Total Taxes", "Severance Taxes", "Income Taxes"]);
    assert_eq!(IdentityConfig::default().code_property, "postal");
}

proptest! {
    #[test]
    fn test_sorted_view_is_descending_and_deterministic(
        values in prop::collection::vec(prop::option::of(0u32..1_000_000), 1..30)
    ) {
        let features: Vec<Feature> = (0..values.len())
            .map(|i| Feature::new(format!("State {i}"), format!("S{i}")))
            .collect();
        let records: Vec<Record> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let cell = v.map_or_else(|| "(X)".to_string(), |v| v.to_string());
                Record::from_pairs([
                    ("Abbreviation".to_string(), format!("S{i}")),
                    ("Total_Taxes".to_string(), cell),
                ])
            })
            .collect();
        let config = single_attribute_config();
        let a = CoordinationController::new(&config, features.clone(), &records).unwrap();
        let b = CoordinationController::new(&config, features, &records).unwrap();
        prop_assert_eq!(a.chart(), b.chart());

        let sorted = &a.chart().sorted;
        for pair in sorted.windows(2) {
            match (pair[0].value, pair[1].value) {
                (Some(x), Some(y)) => prop_assert!(x >= y),
                (None, Some(_)) => prop_assert!(false, "missing value ranked above a number"),
                _ => {}
            }
        }
    }
}
