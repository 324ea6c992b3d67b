use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::constants::{EXIT_BEFORE_HIRE, INVALID_EMAIL, NEGATIVE_SALARY};
use crate::domain::EmployeeRecord;
use crate::observability::metrics;
use crate::pipeline::report::QualityReport;

/// Address shape: something, one `@`, something, a dot, something. No spaces.
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Data-quality flags derived for a record. Flags are independent and may co-occur.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityFlags {
    pub invalid_email: bool,
    pub negative_salary: bool,
    pub exit_before_hire: bool,
}

impl QualityFlags {
    pub fn any(&self) -> bool {
        self.invalid_email || self.negative_salary || self.exit_before_hire
    }
}

/// A cleaned record together with its quality flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedRecord {
    #[serde(flatten)]
    pub record: EmployeeRecord,
    #[serde(flatten)]
    pub flags: QualityFlags,
}

impl FlaggedRecord {
    pub fn employee_id(&self) -> Option<&str> {
        self.record.employee_id.as_deref()
    }
}

/// Trait for implementing record-level quality assessment
pub trait QualityGate {
    /// Evaluate a record. Never mutates or drops the underlying values.
    fn assess(&self, record: &EmployeeRecord) -> QualityFlags;
}

/// Default flagger: email shape, salary sign, date order
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQualityGate;

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self
    }

    /// A missing email counts as invalid
    pub fn is_invalid_email(email: Option<&str>) -> bool {
        match email {
            Some(address) => !EMAIL_SHAPE.is_match(address),
            None => true,
        }
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, record: &EmployeeRecord) -> QualityFlags {
        let exit_before_hire = match (record.hire_date, record.exit_date) {
            (Some(hire), Some(exit)) => exit < hire,
            _ => false,
        };

        QualityFlags {
            invalid_email: Self::is_invalid_email(record.email.as_deref()),
            negative_salary: record.salary.map_or(false, |salary| salary < 0.0),
            exit_before_hire,
        }
    }
}

/// Assess every record. Flags are tallied into the report later, over the
/// records that survive deduplication.
pub fn flag_records<G>(gate: &G, records: Vec<EmployeeRecord>) -> Vec<FlaggedRecord>
where
    G: QualityGate + ?Sized,
{
    records
        .into_iter()
        .map(|record| {
            let flags = gate.assess(&record);
            metrics::quality_gate::record_assessed();
            if flags.any() {
                debug!(line = record.line, ?flags, "Record flagged");
            }
            FlaggedRecord { record, flags }
        })
        .collect()
}

/// Count each flag, with the carrying identifiers, into the report
pub fn tally_flags(records: &[FlaggedRecord], report: &mut QualityReport) {
    let summary = &mut report.flags;
    *summary = Default::default();

    for flagged in records {
        let flags = flagged.flags;
        if !flags.any() {
            continue;
        }
        let id = flagged
            .employee_id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("line {}", flagged.record.line));

        if flags.invalid_email {
            summary.invalid_email += 1;
            summary.invalid_email_ids.push(id.clone());
            metrics::quality_gate::flag_raised(INVALID_EMAIL);
        }
        if flags.negative_salary {
            summary.negative_salary += 1;
            summary.negative_salary_ids.push(id.clone());
            metrics::quality_gate::flag_raised(NEGATIVE_SALARY);
        }
        if flags.exit_before_hire {
            summary.exit_before_hire += 1;
            summary.exit_before_hire_ids.push(id);
            metrics::quality_gate::flag_raised(EXIT_BEFORE_HIRE);
        }
    }
}

/// Count manager ids that do not resolve to any record in `records`
pub fn count_dangling_manager_refs(records: &[FlaggedRecord]) -> usize {
    let known: HashSet<&str> = records.iter().filter_map(FlaggedRecord::employee_id).collect();
    records
        .iter()
        .filter_map(|r| r.record.manager_id.as_deref())
        .filter(|manager| !known.contains(manager))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> EmployeeRecord {
        EmployeeRecord {
            employee_id: Some("E1001".to_string()),
            email: Some("jane.doe@example.com".to_string()),
            salary: Some(50_000.0),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 15),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_record_raises_no_flags() {
        let flags = DefaultQualityGate::new().assess(&record());
        assert_eq!(flags, QualityFlags::default());
        assert!(!flags.any());
    }

    #[test]
    fn test_email_shapes() {
        let invalid = [
            "jane.doe",
            "jane@example",
            "@example.com",
            "jane doe@example.com",
            "a@@b.com",
        ];
        for bad in invalid {
            assert!(
                DefaultQualityGate::is_invalid_email(Some(bad)),
                "{} should be invalid",
                bad
            );
        }
        assert!(DefaultQualityGate::is_invalid_email(None));
        assert!(!DefaultQualityGate::is_invalid_email(Some("j.doe+hr@mail.example.co.za")));
    }

    #[test]
    fn test_negative_salary_flag_iff_below_zero() {
        let gate = DefaultQualityGate::new();
        let cases = [(Some(-1.0), true), (Some(0.0), false), (Some(10.0), false), (None, false)];
        for (salary, expected) in cases {
            let mut r = record();
            r.salary = salary;
            assert_eq!(gate.assess(&r).negative_salary, expected, "salary {:?}", salary);
            // the value itself is untouched
            assert_eq!(r.salary, salary);
        }
    }

    #[test]
    fn test_exit_before_hire_only_when_both_dates_present() {
        let gate = DefaultQualityGate::new();
        let mut r = record();

        r.exit_date = NaiveDate::from_ymd_opt(2019, 12, 31);
        assert!(gate.assess(&r).exit_before_hire);

        r.exit_date = NaiveDate::from_ymd_opt(2020, 1, 15);
        assert!(!gate.assess(&r).exit_before_hire);

        r.hire_date = None;
        r.exit_date = NaiveDate::from_ymd_opt(2019, 12, 31);
        assert!(!gate.assess(&r).exit_before_hire);
    }

    #[test]
    fn test_flags_co_occur_and_are_tallied() {
        let mut r = record();
        r.email = Some("broken".to_string());
        r.salary = Some(-500.0);
        r.exit_date = NaiveDate::from_ymd_opt(2010, 1, 1);

        let flagged = flag_records(&DefaultQualityGate::new(), vec![r, record()]);
        let mut report = QualityReport::default();
        tally_flags(&flagged, &mut report);

        assert_eq!(flagged.len(), 2);
        let flags = flagged[0].flags;
        assert!(flags.invalid_email && flags.negative_salary && flags.exit_before_hire);
        assert!(!flagged[1].flags.any());
        assert_eq!(report.flags.negative_salary, 1);
        assert_eq!(report.flags.negative_salary_ids, vec!["E1001".to_string()]);
    }

    #[test]
    fn test_dangling_manager_refs() {
        let mut boss = record();
        boss.employee_id = Some("E1".to_string());
        let mut report_to_boss = record();
        report_to_boss.employee_id = Some("E2".to_string());
        report_to_boss.manager_id = Some("E1".to_string());
        let mut orphan = record();
        orphan.employee_id = Some("E3".to_string());
        orphan.manager_id = Some("E99".to_string());

        let flagged = flag_records(&DefaultQualityGate::new(), vec![boss, report_to_boss, orphan]);
        assert_eq!(count_dangling_manager_refs(&flagged), 1);
    }
}
