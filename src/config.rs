// ⚙️ Scoring Configuration - Tunables for the filter and scorer
// Loaded from JSON; any missing field keeps its default

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Year that recency is measured against
    pub current_year: i32,

    /// Records older than this many years are excluded
    pub year_gap: i32,

    /// Records pricier than the query by more than this percent are excluded
    pub price_gap_percent: f64,

    /// Purchases within this many years of `current_year` count as recent
    pub recent_years: i32,

    /// Flat amount added per matched buying preference
    pub preference_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            current_year: 2023,
            year_gap: 3,
            price_gap_percent: 25.0,
            recent_years: 1,
            preference_bonus: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

impl ScoringConfig {
    /// Defaults, with the current year taken from the system clock
    pub fn current() -> Self {
        ScoringConfig::default().with_current_year(Utc::now().year())
    }

    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ScoringConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.year_gap < 0 {
            return Err(ConfigError::Negative {
                field: "year_gap",
                value: self.year_gap as f64,
            });
        }
        if self.recent_years < 0 {
            return Err(ConfigError::Negative {
                field: "recent_years",
                value: self.recent_years as f64,
            });
        }
        for (field, value) in [
            ("price_gap_percent", self.price_gap_percent),
            ("preference_bonus", self.preference_bonus),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(field));
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ScoringConfig::default();
        assert_eq!(config.current_year, 2023);
        assert_eq!(config.year_gap, 3);
        assert_eq!(config.price_gap_percent, 25.0);
        assert_eq!(config.recent_years, 1);
        assert_eq!(config.preference_bonus, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "year_gap": 5, "price_gap_percent": 40 }}"#).unwrap();

        let config = ScoringConfig::from_file(file.path()).unwrap();
        assert_eq!(config.year_gap, 5);
        assert_eq!(config.price_gap_percent, 40.0);
        assert_eq!(config.current_year, 2023);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = ScoringConfig {
            year_gap: -1,
            ..ScoringConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Negative { field: "year_gap", .. })));

        let config = ScoringConfig {
            price_gap_percent: f64::NAN,
            ..ScoringConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NotFinite("price_gap_percent")));
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "recent_years": -2 }}"#).unwrap();
        assert!(ScoringConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_current_year_override() {
        let config = ScoringConfig::default().with_current_year(2030);
        assert_eq!(config.current_year, 2030);
        assert!(ScoringConfig::current().current_year >= 2023);
    }
}
