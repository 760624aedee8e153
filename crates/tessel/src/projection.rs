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

use crate::config::MapSize;
use crate::interaction::Point;
use crate::record::Feature;
use geojson::{Geometry, Value};

/// Maps longitude/latitude to screen coordinates.
pub trait Projection {
    fn project(&self, lon: f64, lat: f64) -> Point;
}

/// Equirectangular projection scaled and centred so the extent of a feature
/// set fills the map area. Longitudes are shrunk by the cosine of the
/// extent's middle latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitProjection {
    scale: f64,
    lon_factor: f64,
    origin: (f64, f64),
    offset: (f64, f64),
}
impl FitProjection {
    pub fn fit(features: &[Feature], size: &MapSize) -> Self {
        let mut extent: Option<(f64, f64, f64, f64)> = None;
        for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
            visit_positions(&geometry.value, &mut |lon: f64, lat: f64| {
                extent = Some(match extent {
                    None => (lon, lat, lon, lat),
                    Some((x0, y0, x1, y1)) => (x0.min(lon), y0.min(lat), x1.max(lon), y1.max(lat)),
                });
            });
        }
        let (min_lon, min_lat, max_lon, max_lat) = extent.unwrap_or((-1.0, -1.0, 1.0, 1.0));
        let lon_factor = ((min_lat + max_lat) / 2.0).to_radians().cos().abs().max(0.05);

        let span_x = ((max_lon - min_lon) * lon_factor).max(f64::EPSILON);
        let span_y = (max_lat - min_lat).max(f64::EPSILON);
        let avail_x = (size.width - 2.0 * size.padding).max(1.0);
        let avail_y = (size.height - 2.0 * size.padding).max(1.0);
        let scale = (avail_x / span_x).min(avail_y / span_y);
        let offset = (
            size.padding + (avail_x - span_x * scale) / 2.0,
            size.padding + (avail_y - span_y * scale) / 2.0,
        );
        Self {
            scale,
            lon_factor,
            origin: (min_lon, max_lat),
            offset,
        }
    }
}
impl Projection for FitProjection {
    fn project(&self, lon: f64, lat: f64) -> Point {
        Point::new(
            self.offset.0 + (lon - self.origin.0) * self.lon_factor * self.scale,
            self.offset.1 + (self.origin.1 - lat) * self.scale,
        )
    }
}

fn ring(positions: &[Vec<f64>], visit: &mut dyn FnMut(f64, f64)) {
    for p in positions.iter().filter(|p| p.len() >= 2) {
        visit(p[0], p[1]);
    }
}

fn visit_positions(value: &Value, visit: &mut dyn FnMut(f64, f64)) {
    match value {
        Value::Point(p) if p.len() >= 2 => visit(p[0], p[1]),
        Value::Point(_) => {}
        Value::MultiPoint(points) | Value::LineString(points) => ring(points, visit),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                ring(line, visit);
            }
        }
        Value::MultiPolygon(polygons) => {
            for line in polygons.iter().flatten() {
                ring(line, visit);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                visit_positions(&g.value, visit);
            }
        }
    }
}

/// SVG path data for polygonal geometry; `None` for anything that has no
/// fillable area.
pub fn geometry_path(geometry: &Geometry, projection: &dyn Projection) -> Option<String> {
    let mut path = String::new();
    append_value(&geometry.value, projection, &mut path);
    (!path.is_empty()).then_some(path)
}

fn append_value(value: &Value, projection: &dyn Projection, path: &mut String) {
    match value {
        Value::Polygon(rings) => append_polygon(rings, projection, path),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                append_polygon(rings, projection, path);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                append_value(&g.value, projection, path);
            }
        }
        _ => {}
    }
}

fn append_polygon(rings: &[Vec<Vec<f64>>], projection: &dyn Projection, path: &mut String) {
    for ring in rings {
        let mut points = ring
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| projection.project(p[0], p[1]));
        let Some(first) = points.next() else {
            continue;
        };
        path.push_str(&format!("M{:.1},{:.1}", first.x, first.y));
        for p in points {
            path.push_str(&format!("L{:.1},{:.1}", p.x, p.y));
        }
        path.push('Z');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, side: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![x0, y0],
            vec![x0 + side, y0],
            vec![x0 + side, y0 + side],
            vec![x0, y0 + side],
            vec![x0, y0],
        ]]))
    }

    struct Identity;
    impl Projection for Identity {
        fn project(&self, lon: f64, lat: f64) -> Point {
            Point::new(lon, lat)
        }
    }

    #[test]
    fn polygon_path_closes_each_ring() {
        let path = geometry_path(&square(0.0, 0.0, 2.0), &Identity).unwrap();
        assert_eq!(path, "M0.0,0.0L2.0,0.0L2.0,2.0L0.0,2.0L0.0,0.0Z");
        let multi = Geometry::new(Value::MultiPolygon(vec![
            vec![vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]]],
            vec![vec![vec![5.0, 5.0], vec![6.0, 5.0], vec![6.0, 6.0]]],
        ]));
        let path = geometry_path(&multi, &Identity).unwrap();
        assert_eq!(path.matches('Z').count(), 2);
    }

    #[test]
    fn non_areal_geometry_has_no_path() {
        let point = Geometry::new(Value::Point(vec![1.0, 2.0]));
        assert_eq!(geometry_path(&point, &Identity), None);
    }

    #[test]
    fn fit_keeps_extent_inside_padding() {
        let features = vec![
            Feature::new("West", "WW").with_geometry(square(-120.0, 30.0, 10.0)),
            Feature::new("East", "EE").with_geometry(square(-80.0, 40.0, 5.0)),
        ];
        let size = MapSize {
            width: 800.0,
            height: 400.0,
            padding: 20.0,
        };
        let projection = FitProjection::fit(&features, &size);
        for (lon, lat) in [(-120.0, 30.0), (-75.0, 45.0), (-120.0, 45.0), (-75.0, 30.0)] {
            let p = projection.project(lon, lat);
            assert!(p.x >= 20.0 - 1e-9 && p.x <= 780.0 + 1e-9, "x {}", p.x);
            assert!(p.y >= 20.0 - 1e-9 && p.y <= 380.0 + 1e-9, "y {}", p.y);
        }
        let north = projection.project(-100.0, 45.0);
        let south = projection.project(-100.0, 30.0);
        assert!(north.y < south.y);
    }

    #[test]
    fn fit_without_geometry_is_finite() {
        let projection = FitProjection::fit(&[Feature::new("A", "AA")], &MapSize::default());
        let p = projection.project(0.0, 0.0);
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
