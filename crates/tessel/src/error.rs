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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum TesselError {
    #[error("Data loading error: {0}")]
    Load(#[from] LoadError),
    #[error("Attribute selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read record file '{path}': {source}")]
    RecordFile {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to read feature file '{path}': {source}")]
    FeatureFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse GeoJSON in '{path}': {source}")]
    GeoJson {
        path: String,
        #[source]
        source: geojson::Error,
    },
    #[error("'{path}' is not a GeoJSON FeatureCollection")]
    NotFeatureCollection { path: String },
    #[error("Column '{column}' not found in '{path}'")]
    MissingColumn { path: String, column: String },
    #[error("Loader task for {source_kind} did not complete: {reason}")]
    TaskFailed { source_kind: String, reason: String },
    #[error("Both data sources failed: records: {records}; features: {features}")]
    BothSources {
        records: Box<LoadError>,
        features: Box<LoadError>,
    },
}
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Attribute '{name}' is not in the catalog")]
    UnknownAttribute { name: String },
    #[error("Attribute '{name}' is the join key and cannot be expressed")]
    JoinKeySelected { name: String },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParse {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {field} = {value}")]
    InvalidValue { field: String, value: String },
    #[error("Palette has {found} colours but {expected} classes are configured")]
    PaletteSize { expected: usize, found: usize },
    #[error("Default attribute '{name}' is not a selectable catalog entry")]
    UnknownDefault { name: String },
    #[error("Catalog attribute '{name}' appears more than once")]
    DuplicateAttribute { name: String },
    #[error("Invalid colour '{value}': expected #rrggbb")]
    InvalidColour { value: String },
}
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write output '{path}': {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Nothing to render: {reason}")]
    EmptyScene { reason: String },
    #[error("Formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}
pub type Result<T> = std::result::Result<T, TesselError>;
pub type LoadResult<T> = std::result::Result<T, LoadError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type SelectionResult<T> = std::result::Result<T, SelectionError>;
pub type RenderResult<T> = std::result::Result<T, RenderError>;
impl TesselError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TesselError::Selection(_) | TesselError::Render(_))
    }
    pub fn category(&self) -> &'static str {
        match self {
            TesselError::Load(_) => "Load",
            TesselError::Selection(_) => "Selection",
            TesselError::Config(_) => "Configuration",
            TesselError::Render(_) => "Render",
            TesselError::Io(_) => "I/O",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            TesselError::Load(LoadError::MissingColumn { column, .. }) => vec![
                format!("Add a '{column}' column to the record file"),
                "Check catalog.join_key in the configuration".to_string(),
            ],
            TesselError::Load(LoadError::NotFeatureCollection { .. })
            | TesselError::Load(LoadError::GeoJson { .. }) => vec![
                "Convert the geometry to a GeoJSON FeatureCollection".to_string(),
                "TopoJSON input must be converted before loading".to_string(),
            ],
            TesselError::Load(_) => vec![
                "Check the data paths in the configuration".to_string(),
                "Set TESSEL_RECORDS_PATH / TESSEL_FEATURES_PATH to override them".to_string(),
            ],
            TesselError::Selection(_) => vec![
                "List the selectable attributes to see valid options".to_string(),
                "Attribute names are case-sensitive".to_string(),
            ],
            TesselError::Config(ConfigError::PaletteSize { .. }) => vec![
                "Provide exactly one palette colour per class".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            TesselError::Load(LoadError::BothSources { .. }) => {
                "Neither the tax records nor the state boundaries could be loaded.".to_string()
            }
            TesselError::Load(_) => {
                "The map cannot be drawn because a data source failed to load.".to_string()
            }
            TesselError::Selection(SelectionError::UnknownAttribute { name }) => {
                format!("'{name}' is not one of the available tax categories.")
            }
            _ => self.to_string(),
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn of(error: &TesselError) -> Self {
        match error {
            TesselError::Selection(_) => ErrorSeverity::Warning,
            TesselError::Render(RenderError::EmptyScene { .. }) => ErrorSeverity::Warning,
            TesselError::Load(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "\x1b[36m",
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}
pub struct ErrorReporter {
    pub show_suggestions: bool,
    pub colored_output: bool,
}
impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
            colored_output: true,
        }
    }
    pub fn plain() -> Self {
        Self {
            show_suggestions: true,
            colored_output: false,
        }
    }
    pub fn report(&self, error: &TesselError) -> String {
        let severity = ErrorSeverity::of(error);
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!(
            "[{}] {}: {}\n",
            severity.as_str(),
            error.category(),
            error
        ));
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}
impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_errors_are_recoverable_warnings() {
        let err = TesselError::from(SelectionError::UnknownAttribute {
            name: "Bogus".to_string(),
        });
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "Selection");
        assert_eq!(ErrorSeverity::of(&err), ErrorSeverity::Warning);
        assert!(err.user_message().contains("Bogus"));
    }

    #[test]
    fn load_errors_are_critical() {
        let err = TesselError::from(LoadError::MissingColumn {
            path: "rows.csv".to_string(),
            column: "Abbreviation".to_string(),
        });
        assert!(!err.is_recoverable());
        assert_eq!(ErrorSeverity::of(&err), ErrorSeverity::Critical);
        let report = ErrorReporter::plain().report(&err);
        assert!(report.starts_with("[CRITICAL] Load:"));
        assert!(report.contains("Add a 'Abbreviation' column"));
    }
}
