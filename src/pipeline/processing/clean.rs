use tracing::debug;

use crate::constants;
use crate::domain::{Category, EmployeeRecord, RawEmployeeRow};
use crate::observability::metrics;
use crate::pipeline::processing::coerce::TypeCoercer;
use crate::pipeline::processing::normalize::{AliasTable, LookupTable, Normalizer};
use crate::pipeline::report::QualityReport;

/// Turns raw text rows into typed records: normalization first, then type
/// coercion. Unrecognized categories and coercion failures land in the
/// report; no row is ever dropped here.
#[derive(Debug, Clone, Default)]
pub struct RecordCleaner {
    normalizer: Normalizer,
    coercer: TypeCoercer,
}

impl RecordCleaner {
    pub fn new(normalizer: Normalizer, coercer: TypeCoercer) -> Self {
        Self { normalizer, coercer }
    }

    fn category<T: AliasTable>(
        &self,
        table: &LookupTable<T>,
        raw: &str,
        line: u64,
        report: &mut QualityReport,
    ) -> Option<Category<T>> {
        let value = self.normalizer.category(table, raw)?;
        match &value {
            Category::Canonical(_) => metrics::normalize::value_canonicalized(T::FIELD),
            Category::Unrecognized(text) => {
                debug!(field = T::FIELD, line, value = %text, "Unrecognized categorical value");
                metrics::normalize::value_unrecognized(T::FIELD);
                report.record_unrecognized(T::FIELD, text);
            }
        }
        Some(value)
    }

    pub fn clean(&self, raw: &RawEmployeeRow, report: &mut QualityReport) -> EmployeeRecord {
        let n = &self.normalizer;
        let c = &self.coercer;
        let line = raw.line;

        EmployeeRecord {
            line,
            employee_id: c
                .identifier(&raw.employee_id)
                .resolve(constants::EMPLOYEE_ID, line, report),
            first_name: n.title(&raw.first_name),
            last_name: n.title(&raw.last_name),
            email: n.email(&raw.email),
            gender: self.category(&n.gender, &raw.gender, line, report),
            department: self.category(&n.department, &raw.department, line, report),
            job_title: n.text(&raw.job_title),
            hire_date: c.date(&raw.hire_date).resolve(constants::HIRE_DATE, line, report),
            exit_date: c.date(&raw.exit_date).resolve(constants::EXIT_DATE, line, report),
            is_active: c.boolean(&raw.is_active).resolve(constants::IS_ACTIVE, line, report),
            salary: c.salary(&raw.salary).resolve(constants::SALARY, line, report),
            currency: self.category(&n.currency, &raw.currency, line, report),
            country: self.category(&n.country, &raw.country, line, report),
            state: self.category(&n.state, &raw.state, line, report),
            city: n.title(&raw.city),
            manager_id: c.identifier(&raw.manager_id).resolve(constants::MANAGER_ID, line, report),
            performance_score: c
                .score(&raw.performance_score)
                .resolve(constants::PERFORMANCE_SCORE, line, report),
        }
    }

    pub fn clean_all(
        &self,
        rows: &[RawEmployeeRow],
        report: &mut QualityReport,
    ) -> Vec<EmployeeRecord> {
        rows.iter().map(|row| self.clean(row, report)).collect()
    }
}
