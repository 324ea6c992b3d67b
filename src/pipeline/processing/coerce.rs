use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::observability::metrics;
use crate::pipeline::processing::normalize::MissingTokens;
use crate::pipeline::report::QualityReport;

/// Spreadsheet exports write dates with a midnight time component
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Outcome of coercing one raw field
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Value(T),
    /// The raw text was a missing-value token
    Missing,
    /// The raw text could not be parsed; carries the trimmed input
    Invalid(String),
}

impl<T> Coerced<T> {
    /// Collapse to the missing-value marker, counting a failure against `field`.
    pub fn resolve(self, field: &'static str, line: u64, report: &mut QualityReport) -> Option<T> {
        match self {
            Coerced::Value(value) => Some(value),
            Coerced::Missing => None,
            Coerced::Invalid(raw) => {
                debug!(field, line, raw = %raw, "Value could not be coerced, treating as missing");
                metrics::coerce::failure(field);
                report.record_coercion_failure(field, &raw);
                None
            }
        }
    }
}

/// Parses free-form date and numeric text against a fixed set of formats.
/// Deterministic: the same input always yields the same output.
#[derive(Debug, Clone)]
pub struct TypeCoercer {
    date_formats: Vec<String>,
    missing: MissingTokens,
}

impl Default for TypeCoercer {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            MissingTokens::default(),
        )
    }
}

impl TypeCoercer {
    pub fn new(date_formats: Vec<String>, missing: MissingTokens) -> Self {
        Self { date_formats, missing }
    }

    fn prepare<'a>(&self, raw: &'a str) -> Option<&'a str> {
        if self.missing.is_missing(raw) {
            None
        } else {
            Some(raw.trim())
        }
    }

    pub fn date(&self, raw: &str) -> Coerced<NaiveDate> {
        let Some(text) = self.prepare(raw) else {
            return Coerced::Missing;
        };

        for format in &self.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Coerced::Value(date);
            }
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
                return Coerced::Value(datetime.date());
            }
        }
        Coerced::Invalid(text.to_string())
    }

    /// Decimal amount with thousands separators and inner spaces removed
    pub fn salary(&self, raw: &str) -> Coerced<f64> {
        let Some(text) = self.prepare(raw) else {
            return Coerced::Missing;
        };
        let cleaned: String = text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
        parse_finite(&cleaned).map_or_else(|| Coerced::Invalid(text.to_string()), Coerced::Value)
    }

    pub fn score(&self, raw: &str) -> Coerced<f64> {
        let Some(text) = self.prepare(raw) else {
            return Coerced::Missing;
        };
        parse_finite(text).map_or_else(|| Coerced::Invalid(text.to_string()), Coerced::Value)
    }

    pub fn boolean(&self, raw: &str) -> Coerced<bool> {
        let Some(text) = self.prepare(raw) else {
            return Coerced::Missing;
        };
        match text.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Coerced::Value(true),
            "false" | "f" | "no" | "n" | "0" => Coerced::Value(false),
            _ => Coerced::Invalid(text.to_string()),
        }
    }

    /// Identifier text. Integral floats such as `1001.0` (left behind when a
    /// spreadsheet stores ids as numbers) are reduced to `1001`.
    pub fn identifier(&self, raw: &str) -> Coerced<String> {
        let Some(text) = self.prepare(raw) else {
            return Coerced::Missing;
        };
        if let Some((whole, fraction)) = text.split_once('.') {
            let is_integral_float = !whole.is_empty()
                && !fraction.is_empty()
                && whole.chars().all(|c| c.is_ascii_digit())
                && fraction.chars().all(|c| c == '0');
            if is_integral_float {
                return Coerced::Value(whole.to_string());
            }
        }
        Coerced::Value(text.to_string())
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_formats() {
        let coercer = TypeCoercer::default();
        assert_eq!(coercer.date("2021-03-04"), Coerced::Value(ymd(2021, 3, 4)));
        assert_eq!(coercer.date("2021/03/04"), Coerced::Value(ymd(2021, 3, 4)));
        // day-first when ambiguous
        assert_eq!(coercer.date("04/03/2021"), Coerced::Value(ymd(2021, 3, 4)));
        assert_eq!(coercer.date("04-03-2021"), Coerced::Value(ymd(2021, 3, 4)));
        assert_eq!(coercer.date("4 Mar 2021"), Coerced::Value(ymd(2021, 3, 4)));
        assert_eq!(coercer.date("March 4, 2021"), Coerced::Value(ymd(2021, 3, 4)));
        assert_eq!(coercer.date("2021-03-04 00:00:00"), Coerced::Value(ymd(2021, 3, 4)));
    }

    #[test]
    fn test_malformed_date_is_invalid_not_fatal() {
        let coercer = TypeCoercer::default();
        assert_eq!(coercer.date("31/02/2021"), Coerced::Invalid("31/02/2021".to_string()));
        assert_eq!(coercer.date(" someday "), Coerced::Invalid("someday".to_string()));
        assert_eq!(coercer.date("NaT"), Coerced::Missing);
        assert_eq!(coercer.date(""), Coerced::Missing);
    }

    #[test]
    fn test_salary_strips_thousands_separators() {
        let coercer = TypeCoercer::default();
        assert_eq!(coercer.salary("45,000"), Coerced::Value(45000.0));
        assert_eq!(coercer.salary(" 1 250 000.50 "), Coerced::Value(1_250_000.5));
        assert_eq!(coercer.salary("-3,200"), Coerced::Value(-3200.0));
        assert_eq!(coercer.salary("abc"), Coerced::Invalid("abc".to_string()));
        assert_eq!(coercer.salary("inf"), Coerced::Invalid("inf".to_string()));
        assert_eq!(coercer.salary("N/A"), Coerced::Missing);
    }

    #[test]
    fn test_boolean_spellings() {
        let coercer = TypeCoercer::default();
        assert_eq!(coercer.boolean("True"), Coerced::Value(true));
        assert_eq!(coercer.boolean("no"), Coerced::Value(false));
        assert_eq!(coercer.boolean("0"), Coerced::Value(false));
        assert_eq!(coercer.boolean("maybe"), Coerced::Invalid("maybe".to_string()));
    }

    #[test]
    fn test_identifier_drops_float_artefact_only() {
        let coercer = TypeCoercer::default();
        assert_eq!(coercer.identifier("1001.0"), Coerced::Value("1001".to_string()));
        assert_eq!(coercer.identifier(" E1001 "), Coerced::Value("E1001".to_string()));
        assert_eq!(coercer.identifier("10.5"), Coerced::Value("10.5".to_string()));
        assert_eq!(coercer.identifier("nan"), Coerced::Missing);
    }

    #[test]
    fn test_resolve_counts_failures_per_field() {
        let coercer = TypeCoercer::default();
        let mut report = QualityReport::default();

        assert_eq!(coercer.date("not a date").resolve("hire_date", 2, &mut report), None);
        assert_eq!(coercer.date("").resolve("hire_date", 3, &mut report), None);
        assert_eq!(coercer.salary("12").resolve("salary", 4, &mut report), Some(12.0));

        assert_eq!(report.coercion_failures["hire_date"].count, 1);
        assert!(!report.coercion_failures.contains_key("salary"));
    }

    #[test]
    fn test_coercion_is_deterministic() {
        let coercer = TypeCoercer::default();
        for raw in ["2020-01-01", "bad", "05/06/2019", ""] {
            assert_eq!(coercer.date(raw), coercer.date(raw));
        }
    }
}
