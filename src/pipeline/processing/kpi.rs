//! Descriptive HR metrics over the cleaned table. Everything here is read-only.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::observability::metrics;
use crate::pipeline::processing::quality_gate::FlaggedRecord;

/// Inclusive date range over which turnover is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnoverPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TurnoverPeriod {
    /// January 1st of the reference year through the reference date
    pub fn year_to_date(reference: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(reference.year(), 1, 1).unwrap_or(reference);
        Self { start, end: reference }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KpiOptions {
    /// "Today" for tenure purposes
    pub reference_date: NaiveDate,
    pub turnover_period: TurnoverPeriod,
}

/// Mean salary of one (department, currency) group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryGroup {
    pub department: String,
    pub currency: String,
    /// `None` when every salary in the group was negative
    pub average_salary: Option<f64>,
    pub employees: usize,
    /// Negative salaries left out of the mean
    pub excluded_negative: usize,
}

#[derive(Default)]
struct SalaryTally {
    sum: f64,
    count: usize,
    excluded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnoverSummary {
    pub period: TurnoverPeriod,
    pub exits: usize,
    pub average_headcount: f64,
    /// exits / average headcount, within [0, 1]; `None` when nobody was employed
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrKpis {
    pub reference_date: NaiveDate,
    pub total_employees: usize,
    /// Headcount: records whose active flag is true
    pub active_employees: usize,
    pub inactive_employees: usize,
    /// inactive / total * 100, two decimals
    pub attrition_rate_pct: Option<f64>,
    pub hires_by_year: BTreeMap<i32, usize>,
    pub average_salary: Vec<SalaryGroup>,
    pub median_tenure_days: Option<f64>,
    pub turnover: TurnoverSummary,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn headcount(records: &[FlaggedRecord]) -> usize {
    records.iter().filter(|r| r.record.is_active == Some(true)).count()
}

pub fn inactive_count(records: &[FlaggedRecord]) -> usize {
    records.iter().filter(|r| r.record.is_active == Some(false)).count()
}

/// Hires grouped by year of hire date; rows without a hire date are skipped
pub fn hires_by_year(records: &[FlaggedRecord]) -> BTreeMap<i32, usize> {
    let mut hires = BTreeMap::new();
    for date in records.iter().filter_map(|r| r.record.hire_date) {
        *hires.entry(date.year()).or_insert(0) += 1;
    }
    hires
}

/// Mean salary per (department, currency).
///
/// Currency is part of the key, so amounts in different currencies never
/// share a mean. Rows missing any of the three fields are skipped. Rows
/// flagged with a negative salary stay out of the mean and are counted
/// against their group instead.
pub fn average_salary_by_group(records: &[FlaggedRecord]) -> Vec<SalaryGroup> {
    let mut groups: BTreeMap<(String, String), SalaryTally> = BTreeMap::new();

    for flagged in records {
        let r = &flagged.record;
        let (Some(department), Some(currency), Some(salary)) =
            (&r.department, &r.currency, r.salary)
        else {
            continue;
        };
        let tally = groups
            .entry((department.as_str().to_string(), currency.as_str().to_string()))
            .or_default();
        if flagged.flags.negative_salary {
            tally.excluded += 1;
        } else {
            tally.sum += salary;
            tally.count += 1;
        }
    }

    groups
        .into_iter()
        .map(|((department, currency), tally)| SalaryGroup {
            department,
            currency,
            average_salary: (tally.count > 0).then(|| tally.sum / tally.count as f64),
            employees: tally.count,
            excluded_negative: tally.excluded,
        })
        .collect()
}

/// Median of (reference date - hire date) in days over active employees.
/// Hire dates after the reference date are ignored.
pub fn median_tenure_days(records: &[FlaggedRecord], reference_date: NaiveDate) -> Option<f64> {
    let mut tenures: Vec<i64> = records
        .iter()
        .filter(|r| r.record.is_active == Some(true))
        .filter_map(|r| r.record.hire_date)
        .filter(|hire| *hire <= reference_date)
        .map(|hire| (reference_date - hire).num_days())
        .collect();

    if tenures.is_empty() {
        return None;
    }
    tenures.sort_unstable();
    let mid = tenures.len() / 2;
    let median = if tenures.len() % 2 == 0 {
        (tenures[mid - 1] + tenures[mid]) as f64 / 2.0
    } else {
        tenures[mid] as f64
    };
    Some(median)
}

fn employed_on(flagged: &FlaggedRecord, day: NaiveDate) -> bool {
    match flagged.record.hire_date {
        Some(hire) => hire <= day && flagged.record.exit_date.map_or(true, |exit| exit > day),
        None => false,
    }
}

/// Turnover over an inclusive period.
///
/// Average headcount is the mean of the point-in-time headcounts at the
/// period's first and last day. Records with inverted hire/exit dates are
/// left out of both numerator and denominator.
pub fn turnover(records: &[FlaggedRecord], period: TurnoverPeriod) -> TurnoverSummary {
    let eligible: Vec<&FlaggedRecord> = records
        .iter()
        .filter(|r| !r.flags.exit_before_hire)
        .collect();

    let exits = eligible
        .iter()
        .filter(|r| r.record.exit_date.map_or(false, |exit| period.contains(exit)))
        .count();
    let at_start = eligible.iter().filter(|r| employed_on(r, period.start)).count();
    let at_end = eligible.iter().filter(|r| employed_on(r, period.end)).count();
    let average_headcount = (at_start + at_end) as f64 / 2.0;

    let rate = if average_headcount > 0.0 {
        let raw = exits as f64 / average_headcount;
        if raw > 1.0 {
            warn!(
                exits,
                average_headcount,
                "Turnover exceeds average headcount, clamping to 1.0"
            );
        }
        Some(raw.min(1.0))
    } else {
        None
    };

    TurnoverSummary {
        period,
        exits,
        average_headcount,
        rate,
    }
}

/// Compute every KPI over the cleaned table
pub fn compute_kpis(records: &[FlaggedRecord], options: &KpiOptions) -> HrKpis {
    let total_employees = records.len();
    let active_employees = headcount(records);
    let inactive_employees = inactive_count(records);
    let attrition_rate_pct = if total_employees > 0 {
        Some(round2(inactive_employees as f64 / total_employees as f64 * 100.0))
    } else {
        None
    };

    let kpis = HrKpis {
        reference_date: options.reference_date,
        total_employees,
        active_employees,
        inactive_employees,
        attrition_rate_pct,
        hires_by_year: hires_by_year(records),
        average_salary: average_salary_by_group(records),
        median_tenure_days: median_tenure_days(records, options.reference_date),
        turnover: turnover(records, options.turnover_period),
    };

    metrics::kpi::headcount(kpis.active_employees);
    if let Some(rate) = kpis.turnover.rate {
        metrics::kpi::turnover_rate(rate);
    }
    info!(
        total = kpis.total_employees,
        headcount = kpis.active_employees,
        attrition_pct = ?kpis.attrition_rate_pct,
        turnover = ?kpis.turnover.rate,
        "KPIs computed"
    );

    kpis
}
