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

//! Hover highlight and the floating label that follows the pointer.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}
impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelLayout {
    pub width: f64,
    pub height: f64,
    /// Distance between the pointer and the nearest label corner.
    pub offset: f64,
    /// Minimum gap kept between the label and the viewport edges.
    pub margin: f64,
}
impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            width: 220.0,
            height: 56.0,
            offset: 12.0,
            margin: 8.0,
        }
    }
}
impl LabelLayout {
    /// Top-left corner for a label near `pointer`: right of and above the
    /// pointer by default, flipped when that would cross an edge, then
    /// clamped into the viewport.
    pub fn place(&self, pointer: Point, viewport: Viewport) -> Point {
        let right = pointer.x + self.offset;
        let x = if right + self.width > viewport.width - self.margin {
            pointer.x - self.offset - self.width
        } else {
            right
        };
        let above = pointer.y - self.offset - self.height;
        let y = if above < self.margin {
            pointer.y + self.offset
        } else {
            above
        };
        Point::new(
            clamp_span(x, self.width, viewport.width, self.margin),
            clamp_span(y, self.height, viewport.height, self.margin),
        )
    }
}

fn clamp_span(start: f64, size: f64, extent: f64, margin: f64) -> f64 {
    let max = (extent - margin - size).max(margin);
    start.clamp(margin, max)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub code: String,
    pub name: String,
    /// Formatted value of the expressed attribute, or the no-data text.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HoverInstruction {
    /// Highlight every map and chart element carrying `code`.
    Highlight { code: String },
    Dehighlight { code: String },
    ShowLabel(Label),
    MoveLabel { x: f64, y: f64 },
    HideLabel,
}

/// At most one highlighted entity and one label at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    highlighted: Option<String>,
    pointer: Option<Point>,
    layout: LabelLayout,
    viewport: Viewport,
}
impl InteractionState {
    pub fn new(layout: LabelLayout, viewport: Viewport) -> Self {
        Self {
            highlighted: None,
            pointer: None,
            layout,
            viewport,
        }
    }
    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }
    pub fn label_visible(&self) -> bool {
        self.highlighted.is_some()
    }
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn enter(&mut self, label: Label) -> Vec<HoverInstruction> {
        if self.highlighted.as_deref() == Some(label.code.as_str()) {
            return Vec::new();
        }
        let mut out = self.clear();
        debug!(code = %label.code, "Highlight");
        self.highlighted = Some(label.code.clone());
        out.push(HoverInstruction::Highlight {
            code: label.code.clone(),
        });
        out.push(HoverInstruction::ShowLabel(label));
        if let Some(pointer) = self.pointer {
            out.push(self.move_instruction(pointer));
        }
        out
    }

    /// Leave events for anything but the current entity are ignored.
    pub fn leave(&mut self, code: &str) -> Vec<HoverInstruction> {
        if self.highlighted.as_deref() != Some(code) {
            debug!(code, "Ignoring stale leave");
            return Vec::new();
        }
        self.clear()
    }

    pub fn move_to(&mut self, pointer: Point) -> Vec<HoverInstruction> {
        self.pointer = Some(pointer);
        if self.highlighted.is_none() {
            return Vec::new();
        }
        vec![self.move_instruction(pointer)]
    }

    /// Replaces the visible label's contents when it still belongs to the
    /// same entity.
    pub fn refresh(&self, label: Label) -> Option<HoverInstruction> {
        (self.highlighted.as_deref() == Some(label.code.as_str()))
            .then(|| HoverInstruction::ShowLabel(label))
    }

    fn clear(&mut self) -> Vec<HoverInstruction> {
        match self.highlighted.take() {
            Some(code) => vec![
                HoverInstruction::Dehighlight { code },
                HoverInstruction::HideLabel,
            ],
            None => Vec::new(),
        }
    }

    fn move_instruction(&self, pointer: Point) -> HoverInstruction {
        let at = self.layout.place(pointer, self.viewport);
        HoverInstruction::MoveLabel { x: at.x, y: at.y }
    }
}
