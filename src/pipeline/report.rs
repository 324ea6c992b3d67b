use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants;
use crate::pipeline::processing::quality_gate::FlaggedRecord;

/// Occurrences of one kind of problem in one column
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FieldIssues {
    pub count: usize,
    /// Distinct offending raw values
    pub values: BTreeSet<String>,
}

impl FieldIssues {
    fn record(&mut self, raw: &str) {
        self.count += 1;
        self.values.insert(raw.to_string());
    }
}

/// Counts of each data-quality flag, with the identifiers that carry it
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FlagSummary {
    pub invalid_email: usize,
    pub negative_salary: usize,
    pub exit_before_hire: usize,
    pub invalid_email_ids: Vec<String>,
    pub negative_salary_ids: Vec<String>,
    pub exit_before_hire_ids: Vec<String>,
}

/// Data-quality report accumulated over one pipeline run.
///
/// Row-level problems never abort a run; they end up here instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityReport {
    pub run_id: Uuid,
    pub input_path: Option<String>,
    pub rows_loaded: usize,
    pub rows_retained: usize,
    /// Categorical values with no lookup entry, per column
    pub unrecognized: BTreeMap<&'static str, FieldIssues>,
    /// Values that failed type coercion and became missing, per column
    pub coercion_failures: BTreeMap<&'static str, FieldIssues>,
    /// Missing values per column in the retained rows
    pub missing_values: BTreeMap<&'static str, usize>,
    pub flags: FlagSummary,
    pub duplicates_removed: usize,
    pub duplicate_ids: Vec<String>,
    pub rows_without_identifier: usize,
    /// Manager references pointing at no retained employee
    pub dangling_manager_refs: usize,
}

impl QualityReport {
    pub fn new(input_path: Option<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            input_path,
            ..Default::default()
        }
    }

    pub fn record_unrecognized(&mut self, field: &'static str, raw: &str) {
        self.unrecognized.entry(field).or_default().record(raw);
    }

    pub fn record_coercion_failure(&mut self, field: &'static str, raw: &str) {
        self.coercion_failures.entry(field).or_default().record(raw);
    }

    pub fn unrecognized_total(&self) -> usize {
        self.unrecognized.values().map(|issues| issues.count).sum()
    }

    pub fn coercion_failure_total(&self) -> usize {
        self.coercion_failures.values().map(|issues| issues.count).sum()
    }

    /// Count missing values per column over the retained records
    pub fn tally_missing(&mut self, records: &[FlaggedRecord]) {
        let mut missing: BTreeMap<&'static str, usize> = BTreeMap::new();
        for flagged in records {
            let r = &flagged.record;
            let checks: [(&'static str, bool); 17] = [
                (constants::EMPLOYEE_ID, r.employee_id.is_none()),
                (constants::FIRST_NAME, r.first_name.is_none()),
                (constants::LAST_NAME, r.last_name.is_none()),
                (constants::EMAIL, r.email.is_none()),
                (constants::GENDER, r.gender.is_none()),
                (constants::DEPARTMENT, r.department.is_none()),
                (constants::JOB_TITLE, r.job_title.is_none()),
                (constants::HIRE_DATE, r.hire_date.is_none()),
                (constants::EXIT_DATE, r.exit_date.is_none()),
                (constants::IS_ACTIVE, r.is_active.is_none()),
                (constants::SALARY, r.salary.is_none()),
                (constants::CURRENCY, r.currency.is_none()),
                (constants::COUNTRY, r.country.is_none()),
                (constants::STATE, r.state.is_none()),
                (constants::CITY, r.city.is_none()),
                (constants::MANAGER_ID, r.manager_id.is_none()),
                (constants::PERFORMANCE_SCORE, r.performance_score.is_none()),
            ];
            for (column, is_missing) in checks {
                if is_missing {
                    *missing.entry(column).or_default() += 1;
                }
            }
        }
        self.missing_values = missing;
    }

    /// Log the report at the end of a run
    pub fn log_summary(&self) {
        info!(
            run_id = %self.run_id,
            rows_loaded = self.rows_loaded,
            rows_retained = self.rows_retained,
            "Data quality summary"
        );

        for (field, issues) in &self.unrecognized {
            warn!(
                field,
                count = issues.count,
                values = ?issues.values,
                "Unrecognized categorical values"
            );
        }
        for (field, issues) in &self.coercion_failures {
            warn!(
                field,
                count = issues.count,
                values = ?issues.values,
                "Values coerced to missing"
            );
        }
        if self.flags.invalid_email > 0 {
            warn!(
                count = self.flags.invalid_email,
                ids = ?self.flags.invalid_email_ids,
                "Invalid email addresses"
            );
        }
        if self.flags.negative_salary > 0 {
            warn!(
                count = self.flags.negative_salary,
                ids = ?self.flags.negative_salary_ids,
                "Negative salaries"
            );
        }
        if self.flags.exit_before_hire > 0 {
            warn!(
                count = self.flags.exit_before_hire,
                ids = ?self.flags.exit_before_hire_ids,
                "Exit date before hire date"
            );
        }
        if self.duplicates_removed > 0 {
            info!(
                removed = self.duplicates_removed,
                ids = ?self.duplicate_ids,
                "Duplicate employee ids removed"
            );
        }
        if self.rows_without_identifier > 0 {
            warn!(
                count = self.rows_without_identifier,
                "Rows without an employee id were retained"
            );
        }
        if self.dangling_manager_refs > 0 {
            warn!(
                count = self.dangling_manager_refs,
                "Manager ids that match no retained employee"
            );
        }
        for (column, count) in &self.missing_values {
            info!(column, count, "Missing values");
        }
    }
}
