use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DATE_FORMATS, DEFAULT_MISSING_TOKENS, REFERENCE_DATE_ENV,
};
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::dedup::DuplicatePolicy;
use crate::pipeline::processing::kpi::{KpiOptions, TurnoverPeriod};
use crate::pipeline::processing::normalize::MissingTokens;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineSettings,
    pub kpi: KpiSettings,
    pub logging: LoggingSettings,
    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Settings for the cleaning stages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Field delimiter; inferred from the file extension when unset
    pub delimiter: Option<char>,
    pub duplicate_policy: DuplicatePolicy,
    pub date_formats: Vec<String>,
    pub missing_tokens: Vec<String>,
    /// Text written for a missing value in the cleaned output
    pub missing_marker: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            delimiter: None,
            duplicate_policy: DuplicatePolicy::KeepFirst,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            missing_tokens: DEFAULT_MISSING_TOKENS.iter().map(|t| t.to_string()).collect(),
            missing_marker: String::new(),
        }
    }
}

/// Settings for KPI aggregation. Unset dates are resolved against today.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KpiSettings {
    pub reference_date: Option<NaiveDate>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl KpiSettings {
    /// Resolve into concrete KPI options.
    ///
    /// The reference date falls back to `today`; the turnover period falls
    /// back to the calendar year to date of the reference date.
    pub fn resolve(&self, today: NaiveDate) -> Result<KpiOptions> {
        let reference_date = self.reference_date.unwrap_or(today);
        let default_period = TurnoverPeriod::year_to_date(reference_date);
        let period = TurnoverPeriod {
            start: self.period_start.unwrap_or(default_period.start),
            end: self.period_end.unwrap_or(default_period.end),
        };

        if period.start > period.end {
            return Err(PipelineError::Config(format!(
                "turnover period start {} is after end {}",
                period.start, period.end
            )));
        }

        Ok(KpiOptions {
            reference_date,
            turnover_period: period,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file_name: String,
    /// Default filter directive when RUST_LOG is unset
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "hr_cleaner.log".to_string(),
            filter: "hr_cleaner=info,warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `hr_cleaner.toml` in the
    /// working directory is used when present, otherwise defaults apply.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(REFERENCE_DATE_ENV) {
            let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
                PipelineError::Config(format!(
                    "{} must be YYYY-MM-DD, got '{}': {}",
                    REFERENCE_DATE_ENV, value, e
                ))
            })?;
            self.kpi.reference_date = Some(date);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(delimiter) = self.pipeline.delimiter {
            if !delimiter.is_ascii() {
                return Err(PipelineError::Config(format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    delimiter
                )));
            }
        }
        if self.pipeline.date_formats.is_empty() {
            return Err(PipelineError::Config("at least one date format is required".to_string()));
        }
        // the cleaned output must read back as missing on the next load
        let missing = MissingTokens::new(&self.pipeline.missing_tokens);
        if !missing.is_missing(&self.pipeline.missing_marker) {
            return Err(PipelineError::Config(format!(
                "missing_marker '{}' is not one of missing_tokens",
                self.pipeline.missing_marker
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.duplicate_policy, DuplicatePolicy::KeepFirst);
        assert_eq!(config.pipeline.missing_marker, "");
        assert!(config.pipeline.date_formats.contains(&"%d/%m/%Y".to_string()));
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
    }

    #[test]
    fn test_from_file_reads_all_sections() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[pipeline]
delimiter = ";"
duplicate_policy = "keep_last"
missing_marker = "NULL"

[kpi]
reference_date = "2024-06-30"
period_start = "2024-01-01"
period_end = "2024-06-30"

[logging]
directory = "var/log"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.source.as_deref(), Some(file.path()));
        assert_eq!(config.pipeline.delimiter, Some(';'));
        assert_eq!(config.pipeline.duplicate_policy, DuplicatePolicy::KeepLast);
        assert_eq!(config.pipeline.missing_marker, "NULL");
        assert_eq!(config.kpi.reference_date, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(config.logging.directory, PathBuf::from("var/log"));
        // untouched keys keep their defaults
        assert!(!config.pipeline.missing_tokens.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_a_config_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_resolve_defaults_to_year_to_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let options = KpiSettings::default().resolve(today).unwrap();

        assert_eq!(options.reference_date, today);
        assert_eq!(options.turnover_period.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(options.turnover_period.end, today);
    }

    #[test]
    fn test_resolve_rejects_inverted_period() {
        let settings = KpiSettings {
            reference_date: None,
            period_start: NaiveDate::from_ymd_opt(2025, 6, 1),
            period_end: NaiveDate::from_ymd_opt(2025, 1, 1),
        };
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert!(settings.resolve(today).is_err());
    }

    #[test]
    fn test_validate_requires_marker_to_be_a_missing_token() {
        let mut config = Config::default();
        config.pipeline.missing_marker = "?".to_string();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        config.pipeline.missing_marker = "N/A".to_string();
        assert!(config.validate().is_ok());

        config.pipeline.missing_tokens.push("?".to_string());
        config.pipeline.missing_marker = "?".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_ascii_delimiter() {
        let mut config = Config::default();
        config.pipeline.delimiter = Some('§');
        assert!(config.validate().is_err());
    }
}
