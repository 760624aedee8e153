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

use crate::classify::ClassBreaks;
use crate::join::JoinReport;
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub fn log_view_event(event: &str, payload: Value) {
    debug!(
        event = event,
        payload = %serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string()),
        "View event"
    );
}
pub fn log_join_report(report: &JoinReport) {
    info!(
        matched = report.matched,
        unmatched_records = report.unmatched_record_count(),
        unmatched_features = report.unmatched_features.len(),
        excluded = report.excluded_records.len(),
        "Join complete"
    );
    if !report.unmatched_records.is_empty() {
        warn!(codes = ?report.unmatched_records, "Records without a matching feature");
    }
    if !report.unmatched_features.is_empty() {
        warn!(codes = ?report.unmatched_features, "Features without a matching record");
    }
    if !report.duplicate_codes.is_empty() {
        warn!(codes = ?report.duplicate_codes, "Codes matched more than once");
    }
}
pub fn log_classification(breaks: &ClassBreaks) {
    debug!(
        attribute = %breaks.attribute,
        samples = breaks.sample_count,
        thresholds = ?breaks.thresholds,
        "Classification built"
    );
    if breaks.is_empty() {
        warn!(attribute = %breaks.attribute, "No numeric values; every feature shows no data");
    }
}
pub fn log_transition(from: &str, to: &str, instructions: usize) {
    info!(
        from = from,
        to = to,
        instructions = instructions,
        "Expressed attribute changed"
    );
}
pub fn log_error(context: &str, error: &dyn std::error::Error) {
    error!(
        context = context,
        error = %error,
        "Operation failed"
    );
}
