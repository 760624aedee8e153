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

use crate::catalog::{AttributeCatalog, AttributeName};
use crate::chart::ChartLayout;
use crate::classify::ClassificationConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::format::ValueFormat;
use crate::interaction::{LabelLayout, Viewport};
use crate::join::JoinPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_RECORDS_PATH: &str = "TESSEL_RECORDS_PATH";
pub const ENV_FEATURES_PATH: &str = "TESSEL_FEATURES_PATH";
pub const ENV_DEFAULT_ATTRIBUTE: &str = "TESSEL_DEFAULT_ATTRIBUTE";
pub const ENV_EXCLUDED_CODES: &str = "TESSEL_EXCLUDED_CODES";

const ATTRIBUTE_PLACEHOLDER: &str = "{attribute}";

const DEFAULT_ATTRIBUTES: &[&str] = &[
    "Total_Taxes",
    "Property_Taxes",
    "Sales_and_Gross_Receipts_Taxes",
    "General_Sales_and_Gross_Receipts_Taxes",
    "Selective_Sales_and_Gross_Receipts_Taxes",
    "Alcoholic_Beverages_Sales_Tax",
    "Amusements_Sales_Tax",
    "Insurance_Premiums_Sales_Tax",
    "Motor_Fuels_Sales_Tax",
    "Pari_mutuels_Sales_Tax",
    "Public_Utilities_Sales_Tax",
    "Tobacco_Products_Sales_Tax",
    "Other_Selective_Sales_and_Gross_Receipts_Taxes",
    "Licenses",
    "Alcoholic_Beverages_License",
    "Amusements_License",
    "Corporations_in_General_License",
    "Hunting_and_Fishing_License",
    "Motor_Vehicle_License",
    "Motor_Vehicle_Operators_License",
    "Public_Utilities_License",
    "Occupation_and_Business_License_NEC",
    "Income_Taxes",
    "Individual_Income_Taxes",
    "Corporation_Net_Income_Taxes",
    "Severance_Taxes",
    "Death_and_Gift_Taxes",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// `{attribute}` is replaced with the expressed attribute's label.
    pub map: String,
    pub chart: String,
}
impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            map: "2024 U.S. State Government Taxes: {attribute}".to_string(),
            chart: "{attribute} by State".to_string(),
        }
    }
}
impl TitleConfig {
    pub fn map_title(&self, attribute: &AttributeName) -> String {
        self.map.replace(ATTRIBUTE_PLACEHOLDER, &attribute.label())
    }
    pub fn chart_title(&self, attribute: &AttributeName) -> String {
        self.chart.replace(ATTRIBUTE_PLACEHOLDER, &attribute.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub records: PathBuf,
    pub features: PathBuf,
}
impl Default for DataPaths {
    fn default() -> Self {
        Self {
            records: PathBuf::from("data/state_taxes_2024.csv"),
            features: PathBuf::from("data/us_states.geojson"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub join_key: AttributeName,
    pub attributes: Vec<AttributeName>,
    pub default: AttributeName,
}
impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            join_key: AttributeName::new("Abbreviation"),
            attributes: DEFAULT_ATTRIBUTES.iter().copied().map(AttributeName::new).collect(),
            default: AttributeName::new("Total_Taxes"),
        }
    }
}

/// Feature properties holding the display name and the join code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub name_property: String,
    pub code_property: String,
}
impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name_property: "name".to_string(),
            code_property: "postal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
    /// Space kept free around the fitted geometry; the title sits in the top
    /// band.
    pub padding: f64,
}
impl Default for MapSize {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 650.0,
            padding: 50.0,
        }
    }
}
impl MapSize {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesselConfig {
    pub titles: TitleConfig,
    pub data: DataPaths,
    pub catalog: CatalogConfig,
    pub identity: IdentityConfig,
    pub join: JoinPolicy,
    pub classification: ClassificationConfig,
    pub map: MapSize,
    pub chart: ChartLayout,
    pub label: LabelLayout,
    pub format: ValueFormat,
}
impl Default for TesselConfig {
    fn default() -> Self {
        Self {
            titles: TitleConfig::default(),
            data: DataPaths::default(),
            catalog: CatalogConfig::default(),
            identity: IdentityConfig::default(),
            join: JoinPolicy::excluding(["US"]),
            classification: ClassificationConfig::default(),
            map: MapSize::default(),
            chart: ChartLayout::default(),
            label: LabelLayout::default(),
            format: ValueFormat::default(),
        }
    }
}
impl TesselConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup; `apply_env_overrides` reads the
    /// process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_RECORDS_PATH) {
            self.data.records = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_FEATURES_PATH) {
            self.data.features = PathBuf::from(path);
        }
        if let Some(name) = lookup(ENV_DEFAULT_ATTRIBUTE) {
            self.catalog.default = AttributeName::new(name.trim());
        }
        if let Some(codes) = lookup(ENV_EXCLUDED_CODES) {
            self.join = JoinPolicy::excluding(
                codes
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty()),
            );
        }
        self.validate()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.classification.validate()?;
        self.build_catalog()?;
        for (field, value) in [
            ("map.width", self.map.width),
            ("map.height", self.map.height),
            ("chart.width", self.chart.width),
            ("chart.height", self.chart.height),
            ("label.width", self.label.width),
            ("label.height", self.label.height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        if self.chart.inner_width() <= 0.0 || self.chart.inner_height() <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "chart.margin".to_string(),
                value: "margins leave no plot area".to_string(),
            });
        }
        if self.identity.code_property.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "identity.code_property".to_string(),
                value: String::new(),
            });
        }
        Ok(())
    }

    pub fn build_catalog(&self) -> ConfigResult<AttributeCatalog> {
        AttributeCatalog::new(
            self.catalog.join_key.clone(),
            self.catalog.attributes.clone(),
            self.catalog.default.clone(),
        )
    }

    pub fn for_print() -> Self {
        Self {
            map: MapSize {
                width: 2400.0,
                height: 1300.0,
                padding: 100.0,
            },
            chart: ChartLayout {
                width: 2400.0,
                height: 900.0,
                margin_top: 90.0,
                margin_bottom: 70.0,
                margin_left: 160.0,
                ..Default::default()
            },
            label: LabelLayout {
                width: 400.0,
                height: 100.0,
                offset: 20.0,
                margin: 16.0,
            },
            ..Default::default()
        }
    }
    pub fn for_compact() -> Self {
        Self {
            map: MapSize {
                width: 640.0,
                height: 360.0,
                padding: 24.0,
            },
            chart: ChartLayout {
                width: 640.0,
                height: 260.0,
                margin_top: 30.0,
                margin_bottom: 30.0,
                margin_left: 60.0,
                margin_right: 10.0,
                bar_gap: 1.0,
            },
            label: LabelLayout {
                width: 160.0,
                height: 44.0,
                offset: 8.0,
                margin: 4.0,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_is_valid_with_census_catalog() {
        let config = TesselConfig::default();
        assert!(config.validate().is_ok());
        let catalog = config.build_catalog().unwrap();
        assert_eq!(catalog.join_key().as_str(), "Abbreviation");
        assert_eq!(catalog.default_attribute().as_str(), "Total_Taxes");
        assert!(catalog.len() >= 25);
        assert!(config.join.is_excluded("US"));
        assert!(TesselConfig::for_print().validate().is_ok());
        assert!(TesselConfig::for_compact().validate().is_ok());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped =
            TesselConfig::from_yaml_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config/tessel.yml"))
                .unwrap();
        let defaults = TesselConfig::default();
        assert_eq!(
            shipped.build_catalog().unwrap().entries(),
            defaults.build_catalog().unwrap().entries()
        );
        assert_eq!(shipped.catalog.attributes.len(), DEFAULT_ATTRIBUTES.len());
        assert_eq!(shipped, defaults);
    }

    #[test]
    fn titles_use_attribute_label() {
        let titles = TitleConfig::default();
        let name = AttributeName::new("Motor_Fuels_Sales_Tax");
        assert_eq!(
            titles.map_title(&name),
            "2024 U.S. State Government Taxes: Motor Fuels Sales Tax"
        );
        assert_eq!(titles.chart_title(&name), "Motor Fuels Sales Tax by State");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r##"
catalog:
  join_key: Abbreviation
  attributes: [Total_Taxes, Severance_Taxes]
  default: Severance_Taxes
join:
  excluded_codes: [US, DC]
classification:
  no_data: "#222222"
"##;
        let config = TesselConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.catalog.attributes.len(), 2);
        assert!(config.join.is_excluded("DC"));
        assert_eq!(config.classification.class_count, 5);
        assert_eq!(config.classification.no_data.to_hex(), "#222222");
        assert_eq!(config.identity.code_property, "postal");
    }

    #[test]
    fn invalid_yaml_values_are_rejected() {
        assert!(matches!(
            TesselConfig::from_yaml_str("catalog:\n  default: Nope\n"),
            Err(ConfigError::UnknownDefault { .. })
        ));
        assert!(matches!(
            TesselConfig::from_yaml_str("classification:\n  no_data: grey\n"),
            Err(ConfigError::YamlParse { .. })
        ));
        assert!(matches!(
            TesselConfig::from_yaml_str("map:\n  width: 0\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn overrides_replace_paths_default_and_exclusions() {
        let vars: HashMap<&str, &str> = [
            (ENV_RECORDS_PATH, "/tmp/rows.csv"),
            (ENV_DEFAULT_ATTRIBUTE, "Income_Taxes"),
            (ENV_EXCLUDED_CODES, "US, PR ,"),
        ]
        .into_iter()
        .collect();
        let mut config = TesselConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.data.records, PathBuf::from("/tmp/rows.csv"));
        assert_eq!(config.catalog.default.as_str(), "Income_Taxes");
        assert_eq!(config.join.excluded_codes, vec!["US", "PR"]);

        let mut bad = TesselConfig::default();
        assert!(bad
            .apply_overrides(|k| (k == ENV_DEFAULT_ATTRIBUTE).then(|| "Abbreviation".to_string()))
            .is_err());
    }

    #[test]
    fn reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessel.yml");
        fs::write(&path, "titles:\n  chart: \"{attribute} ranked\"\n").unwrap();
        let config = TesselConfig::from_yaml_file(&path).unwrap();
        assert_eq!(
            config.titles.chart_title(&AttributeName::new("Total_Taxes")),
            "Total Taxes ranked"
        );
        assert!(matches!(
            TesselConfig::from_yaml_file(dir.path().join("missing.yml")),
            Err(ConfigError::ConfigFile { .. })
        ));
    }
}
