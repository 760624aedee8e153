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

//! A [`ViewSink`] that keeps the latest snapshot for each view and writes
//! the map, legend and chart as one SVG document.

use crate::chart::ChartSnapshot;
use crate::config::{MapSize, TesselConfig};
use crate::controller::{MapSnapshot, TitleSnapshot, ViewInstruction, ViewSink};
use crate::error::{RenderError, RenderResult};
use crate::interaction::{HoverInstruction, Label, LabelLayout, Point};
use crate::legend::LegendSnapshot;
use crate::projection::{geometry_path, FitProjection};
use crate::record::Feature;
use std::fmt::Write;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const BACKGROUND: &str = "#061023";
const INK: &str = "#f2f2f2";
const HIGHLIGHT: &str = "#ffb000";
const SWATCH: f64 = 18.0;

pub struct SvgScene {
    map_size: MapSize,
    label_layout: LabelLayout,
    paths: Vec<(String, String)>,
    map: Option<MapSnapshot>,
    chart: Option<ChartSnapshot>,
    legend: Option<LegendSnapshot>,
    titles: Option<TitleSnapshot>,
    highlighted: Option<String>,
    label: Option<Label>,
    label_at: Option<Point>,
    applied: usize,
}
impl SvgScene {
    /// Projects every feature's geometry once; features without polygonal
    /// geometry are drawn in the chart only.
    pub fn new(config: &TesselConfig, features: &[Feature]) -> Self {
        let projection = FitProjection::fit(features, &config.map);
        let paths: Vec<(String, String)> = features
            .iter()
            .filter_map(|f| {
                let path = geometry_path(f.geometry.as_ref()?, &projection)?;
                Some((f.code.clone(), path))
            })
            .collect();
        debug!(paths = paths.len(), "Projected feature geometry");
        Self {
            map_size: config.map,
            label_layout: config.label,
            paths,
            map: None,
            chart: None,
            legend: None,
            titles: None,
            highlighted: None,
            label: None,
            label_at: None,
            applied: 0,
        }
    }

    pub fn applied(&self) -> usize {
        self.applied
    }
    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }
    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }
    pub fn titles(&self) -> Option<&TitleSnapshot> {
        self.titles.as_ref()
    }

    pub fn render(&self) -> RenderResult<String> {
        let map = self.map.as_ref().ok_or_else(|| RenderError::EmptyScene {
            reason: "no map recolor has been applied".to_string(),
        })?;
        let chart_height = self.chart.as_ref().map_or(0.0, |c| c.layout.height);
        let chart_width = self.chart.as_ref().map_or(0.0, |c| c.layout.width);
        let width = self.map_size.width.max(chart_width);
        let height = self.map_size.height + chart_height;

        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
        )?;
        writeln!(
            out,
            r#"<rect class="background" width="{width}" height="{height}" fill="{BACKGROUND}"/>"#
        )?;
        self.write_map(&mut out, map)?;
        if let Some(legend) = &self.legend {
            self.write_legend(&mut out, legend)?;
        }
        if let Some(chart) = &self.chart {
            self.write_chart(&mut out, chart)?;
        }
        self.write_label(&mut out)?;
        writeln!(out, "</svg>")?;
        Ok(out)
    }

    pub fn write_to(&self, path: &Path) -> RenderResult<()> {
        let document = self.render()?;
        fs::write(path, document).map_err(|source| RenderError::Output {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Wrote SVG");
        Ok(())
    }

    fn write_map(&self, out: &mut String, map: &MapSnapshot) -> RenderResult<()> {
        writeln!(out, r#"<g class="map">"#)?;
        for (code, path) in &self.paths {
            let Some(fill) = map.fill(code) else {
                continue;
            };
            let stroke = self.stroke_for(code);
            writeln!(
                out,
                r#"<path class="state {code}" d="{path}" fill="{}" stroke="{}" stroke-width="{}"><title>{}</title></path>"#,
                fill.color,
                stroke.0,
                stroke.1,
                escape(&fill.name)
            )?;
        }
        if let Some(titles) = &self.titles {
            writeln!(
                out,
                r#"<text class="title" text-anchor="middle" x="{}" y="30" fill="{INK}" font-size="24">{}</text>"#,
                self.map_size.width / 2.0,
                escape(&titles.map_title)
            )?;
        }
        writeln!(out, "</g>")?;
        Ok(())
    }

    fn write_legend(&self, out: &mut String, legend: &LegendSnapshot) -> RenderResult<()> {
        let row_height = SWATCH + 4.0;
        let x = self.map_size.padding.max(10.0);
        let top = self.map_size.height - 10.0 - row_height * (legend.rows.len() as f64 + 1.0);
        writeln!(out, r#"<g class="legend" transform="translate({x},{top})">"#)?;
        writeln!(
            out,
            r#"<text y="{}" fill="{INK}" font-size="14">{}</text>"#,
            SWATCH - 4.0,
            escape(&legend.title)
        )?;
        for (i, row) in legend.rows.iter().enumerate() {
            let y = row_height * (i as f64 + 1.0);
            writeln!(
                out,
                r#"<rect y="{y}" width="{SWATCH}" height="{SWATCH}" fill="{}"/><text x="{}" y="{}" fill="{INK}" font-size="12">{}</text>"#,
                row.color,
                SWATCH + 6.0,
                y + SWATCH - 5.0,
                escape(&row.label)
            )?;
        }
        writeln!(out, "</g>")?;
        Ok(())
    }

    fn write_chart(&self, out: &mut String, chart: &ChartSnapshot) -> RenderResult<()> {
        let layout = &chart.layout;
        let inner_height = layout.inner_height();
        writeln!(out, r#"<g class="chart" transform="translate(0,{})">"#, self.map_size.height)?;
        writeln!(
            out,
            r#"<text class="chart-title" x="{}" y="{}" fill="{INK}" font-size="18">{}</text>"#,
            layout.margin_left,
            layout.margin_top / 2.0 + 6.0,
            escape(&chart.title)
        )?;
        writeln!(
            out,
            r#"<g class="plot" transform="translate({},{})">"#,
            layout.margin_left, layout.margin_top
        )?;
        for bar in &chart.bars {
            let stroke = self.stroke_for(&bar.code);
            writeln!(
                out,
                r#"<rect class="bar {}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="{}" stroke-width="{}"><title>{}</title></rect>"#,
                bar.code,
                bar.x,
                bar.y,
                bar.width,
                bar.height,
                bar.color,
                stroke.0,
                stroke.1,
                escape(&bar.name)
            )?;
        }
        writeln!(out, r#"<g class="axis value-axis">"#)?;
        for tick in &chart.value_ticks {
            writeln!(
                out,
                r#"<line x1="-4" x2="0" y1="{p:.2}" y2="{p:.2}" stroke="{INK}"/><text x="-8" y="{:.2}" text-anchor="end" fill="{INK}" font-size="11">{}</text>"#,
                tick.position + 4.0,
                escape(&tick.label),
                p = tick.position
            )?;
        }
        writeln!(out, "</g>")?;
        writeln!(out, r#"<g class="axis rank-axis" transform="translate(0,{inner_height})">"#)?;
        for tick in &chart.rank_ticks {
            writeln!(
                out,
                r#"<text x="{:.2}" y="14" text-anchor="middle" fill="{INK}" font-size="9">{}</text>"#,
                tick.position,
                escape(&tick.label)
            )?;
        }
        writeln!(out, "</g>")?;
        writeln!(out, "</g>\n</g>")?;
        Ok(())
    }

    fn write_label(&self, out: &mut String) -> RenderResult<()> {
        let (Some(label), Some(at)) = (&self.label, self.label_at) else {
            return Ok(());
        };
        let LabelLayout { width, height, .. } = self.label_layout;
        writeln!(
            out,
            r##"<g class="infolabel" id="{}_label" transform="translate({:.1},{:.1})"><rect width="{width}" height="{height}" fill="#000000" fill-opacity="0.8" stroke="{HIGHLIGHT}"/><text x="8" y="22" fill="{INK}" font-size="16">{}</text><text x="8" y="{}" fill="{INK}" font-size="12">{}</text></g>"##,
            escape(&label.code),
            at.x,
            at.y,
            escape(&label.text),
            height - 10.0,
            escape(&label.name)
        )?;
        Ok(())
    }

    fn stroke_for(&self, code: &str) -> (&'static str, f64) {
        if self.highlighted.as_deref() == Some(code) {
            (HIGHLIGHT, 2.5)
        } else {
            ("#ffffff", 0.5)
        }
    }

    fn apply_hover(&mut self, hover: &HoverInstruction) {
        match hover {
            HoverInstruction::Highlight { code } => self.highlighted = Some(code.clone()),
            HoverInstruction::Dehighlight { code } => {
                if self.highlighted.as_ref() == Some(code) {
                    self.highlighted = None;
                }
            }
            HoverInstruction::ShowLabel(label) => {
                self.label = Some(label.clone());
            }
            HoverInstruction::MoveLabel { x, y } => self.label_at = Some(Point::new(*x, *y)),
            HoverInstruction::HideLabel => {
                self.label = None;
                self.label_at = None;
            }
        }
    }
}
impl ViewSink for SvgScene {
    fn apply(&mut self, instruction: &ViewInstruction) {
        self.applied += 1;
        match instruction {
            ViewInstruction::RecolorMap(map) => self.map = Some(map.clone()),
            ViewInstruction::RebuildChart(chart) => self.chart = Some(chart.clone()),
            ViewInstruction::RebuildLegend(legend) => self.legend = Some(legend.clone()),
            ViewInstruction::UpdateTitles(titles) => self.titles = Some(titles.clone()),
            ViewInstruction::Hover(hover) => self.apply_hover(hover),
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"A & <B> "C""#), "A &amp; &lt;B&gt; &quot;C&quot;");
    }

    #[test]
    fn rendering_before_any_recolor_fails() {
        let scene = SvgScene::new(&TesselConfig::default(), &[]);
        assert!(matches!(scene.render(), Err(RenderError::EmptyScene { .. })));
    }

    #[test]
    fn hover_instructions_track_label() {
        let mut scene = SvgScene::new(&TesselConfig::default(), &[]);
        let label = Label {
            code: "TX".to_string(),
            name: "Texas".to_string(),
            text: "$1".to_string(),
        };
        scene.apply(&ViewInstruction::Hover(HoverInstruction::Highlight { code: "TX".into() }));
        scene.apply(&ViewInstruction::Hover(HoverInstruction::ShowLabel(label.clone())));
        assert_eq!(scene.highlighted(), Some("TX"));
        assert_eq!(scene.label(), Some(&label));
        scene.apply(&ViewInstruction::Hover(HoverInstruction::Dehighlight { code: "CA".into() }));
        assert_eq!(scene.highlighted(), Some("TX"));
        scene.apply(&ViewInstruction::Hover(HoverInstruction::HideLabel));
        assert_eq!(scene.label(), None);
        assert_eq!(scene.applied(), 4);
    }
}
