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

use serde::{Deserialize, Serialize};

/// A linear mapping from a continuous domain to a continuous range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}
impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }
    /// Builds a scale whose domain is never zero-length: a collapsed or
    /// non-finite domain is widened to `[d0, d0 + 1]`.
    pub fn guarded(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (d0, d1) = domain;
        let d0 = if d0.is_finite() { d0 } else { 0.0 };
        let d1 = if d1.is_finite() && d1 != d0 { d1 } else { d0 + 1.0 };
        Self::new((d0, d1), range)
    }
    pub fn map(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = d1 - d0;
        if denom == 0.0 {
            return r0;
        }
        let t = (x - d0) / denom;
        r0 + t * (r1 - r0)
    }
    pub fn invert(&self, y: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = r1 - r0;
        if denom == 0.0 {
            return d0;
        }
        d0 + (y - r0) / denom * (d1 - d0)
    }
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }
    pub fn range(&self) -> (f64, f64) {
        self.range
    }
    /// Round-number ticks inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        nice_ticks(self.domain.0, self.domain.1, count)
    }
}

fn nice_ticks(mut min: f64, mut max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if min == max {
        return vec![min];
    }
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }
    let step = nice_step((max - min) / count as f64);
    if step == 0.0 {
        return vec![min, max];
    }
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn nice_step(step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    let power = step.log10().floor();
    let base = 10_f64.powf(power);
    let error = step / base;
    let nice = if error >= 7.5 {
        10.0
    } else if error >= 3.5 {
        5.0
    } else if error >= 1.5 {
        2.0
    } else {
        1.0
    };
    nice * base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_inverted_value_axis() {
        let s = LinearScale::new((0.0, 100.0), (400.0, 0.0));
        assert_eq!(s.map(0.0), 400.0);
        assert_eq!(s.map(100.0), 0.0);
        assert_eq!(s.map(25.0), 300.0);
        assert_eq!(s.invert(300.0), 25.0);
    }

    #[test]
    fn guarded_never_collapses() {
        let s = LinearScale::guarded((0.0, 0.0), (400.0, 0.0));
        assert_eq!(s.domain(), (0.0, 1.0));
        assert!(s.map(0.0).is_finite());
        let s = LinearScale::guarded((0.0, f64::NAN), (0.0, 10.0));
        assert_eq!(s.domain(), (0.0, 1.0));
    }

    #[test]
    fn ticks_are_round_and_inside_domain() {
        let s = LinearScale::new((0.0, 87.0), (0.0, 1.0));
        assert_eq!(s.ticks(5), vec![0.0, 20.0, 40.0, 60.0, 80.0]);
        let s = LinearScale::new((0.0, 1_000_000.0), (0.0, 1.0));
        assert_eq!(s.ticks(4).last(), Some(&1_000_000.0));
    }
}
