//! Writers for the cleaned table, the KPI result files and the quality report.

use csv::Writer;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::constants::{
    AVG_SALARY_FILE, FLAG_COLUMNS, HIRES_BY_YEAR_FILE, HR_KPIS_FILE, REQUIRED_COLUMNS,
};
use crate::domain::{CanonicalValue, Category};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::kpi::{round2, HrKpis};
use crate::pipeline::processing::quality_gate::FlaggedRecord;
use crate::pipeline::report::QualityReport;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn or_marker<T, F>(value: Option<T>, marker: &str, render: F) -> String
where
    F: FnOnce(T) -> String,
{
    value.map(render).unwrap_or_else(|| marker.to_string())
}

fn category<T: CanonicalValue>(value: &Option<Category<T>>, marker: &str) -> String {
    or_marker(value.as_ref(), marker, |c| c.as_str().to_string())
}

/// One output line: the 17 schema columns then the flag columns
fn cleaned_fields(flagged: &FlaggedRecord, marker: &str) -> Vec<String> {
    let r = &flagged.record;
    let text = |value: &Option<String>| or_marker(value.as_deref(), marker, str::to_string);
    let date = |value: Option<chrono::NaiveDate>| {
        or_marker(value, marker, |d| d.format(DATE_FORMAT).to_string())
    };
    let number = |value: Option<f64>| or_marker(value, marker, |n| n.to_string());

    vec![
        text(&r.employee_id),
        text(&r.first_name),
        text(&r.last_name),
        text(&r.email),
        category(&r.gender, marker),
        category(&r.department, marker),
        text(&r.job_title),
        date(r.hire_date),
        date(r.exit_date),
        or_marker(r.is_active, marker, |b| b.to_string()),
        number(r.salary),
        category(&r.currency, marker),
        category(&r.country, marker),
        category(&r.state, marker),
        text(&r.city),
        text(&r.manager_id),
        number(r.performance_score),
        flagged.flags.invalid_email.to_string(),
        flagged.flags.negative_salary.to_string(),
        flagged.flags.exit_before_hire.to_string(),
    ]
}

/// Write the cleaned, flagged table. Returns the number of data rows written.
#[instrument(skip(records, marker), fields(path = %path.display(), rows = records.len()))]
pub fn write_cleaned(path: &Path, records: &[FlaggedRecord], marker: &str) -> Result<usize> {
    ensure_parent(path)?;
    let mut writer = Writer::from_writer(BufWriter::new(File::create(path)?));

    writer.write_record(REQUIRED_COLUMNS.iter().chain(FLAG_COLUMNS.iter()))?;
    for flagged in records {
        writer.write_record(cleaned_fields(flagged, marker))?;
    }
    writer.flush()?;

    metrics::writer::rows_written(records.len());
    info!(rows = records.len(), "Cleaned dataset written");
    Ok(records.len())
}

/// Paths of the KPI result files
#[derive(Debug, Clone)]
pub struct KpiFiles {
    pub summary: PathBuf,
    pub hires_by_year: PathBuf,
    pub average_salary: PathBuf,
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write the three KPI CSV files into `results_dir`, creating it if needed
#[instrument(skip(kpis), fields(results_dir = %results_dir.display()))]
pub fn write_kpis(results_dir: &Path, kpis: &HrKpis) -> Result<KpiFiles> {
    fs::create_dir_all(results_dir)?;
    let files = KpiFiles {
        summary: results_dir.join(HR_KPIS_FILE),
        hires_by_year: results_dir.join(HIRES_BY_YEAR_FILE),
        average_salary: results_dir.join(AVG_SALARY_FILE),
    };

    let turnover = &kpis.turnover;
    let turnover_rate = turnover.rate.map(|r| (r * 10_000.0).round() / 10_000.0);
    let summary: [(&str, String); 11] = [
        ("Total Employees", kpis.total_employees.to_string()),
        ("Active Employees", kpis.active_employees.to_string()),
        ("Inactive Employees", kpis.inactive_employees.to_string()),
        ("Attrition Rate (%)", optional_number(kpis.attrition_rate_pct)),
        ("Median Tenure (days)", optional_number(kpis.median_tenure_days)),
        ("Turnover Rate", optional_number(turnover_rate)),
        ("Turnover Exits", turnover.exits.to_string()),
        ("Average Headcount", turnover.average_headcount.to_string()),
        (
            "Turnover Period Start",
            turnover.period.start.format(DATE_FORMAT).to_string(),
        ),
        ("Turnover Period End", turnover.period.end.format(DATE_FORMAT).to_string()),
        ("Reference Date", kpis.reference_date.format(DATE_FORMAT).to_string()),
    ];
    let mut writer = Writer::from_path(&files.summary)?;
    writer.write_record(["Metric", "Value"])?;
    for (metric, value) in summary {
        writer.write_record([metric, value.as_str()])?;
    }
    writer.flush()?;

    let mut writer = Writer::from_path(&files.hires_by_year)?;
    writer.write_record(["hire_year", "number_of_hires"])?;
    for (year, hires) in &kpis.hires_by_year {
        writer.write_record([year.to_string(), hires.to_string()])?;
    }
    writer.flush()?;

    let mut writer = Writer::from_path(&files.average_salary)?;
    writer.write_record([
        "department",
        "currency",
        "average_salary",
        "employees",
        "excluded_negative_salaries",
    ])?;
    for group in &kpis.average_salary {
        writer.write_record([
            group.department.clone(),
            group.currency.clone(),
            group
                .average_salary
                .map(|avg| format!("{:.2}", round2(avg)))
                .unwrap_or_default(),
            group.employees.to_string(),
            group.excluded_negative.to_string(),
        ])?;
    }
    writer.flush()?;

    info!(
        summary = %files.summary.display(),
        hires = %files.hires_by_year.display(),
        salary = %files.average_salary.display(),
        "KPI results written"
    );
    Ok(files)
}

/// Write the data-quality report as pretty JSON
pub fn write_report(path: &Path, report: &QualityReport) -> Result<()> {
    ensure_parent(path)?;
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, report)?;
    info!(path = %path.display(), "Quality report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, Department, EmployeeRecord, Gender};
    use crate::pipeline::processing::kpi::{compute_kpis, KpiOptions, TurnoverPeriod};
    use crate::pipeline::processing::quality_gate::QualityFlags;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn flagged() -> FlaggedRecord {
        FlaggedRecord {
            record: EmployeeRecord {
                line: 2,
                employee_id: Some("E1001".to_string()),
                first_name: Some("Jane".to_string()),
                email: Some("jane@example.com".to_string()),
                gender: Some(Category::Canonical(Gender::Female)),
                department: Some(Category::Canonical(Department::Finance)),
                hire_date: NaiveDate::from_ymd_opt(2020, 1, 15),
                is_active: Some(true),
                salary: Some(-1500.5),
                currency: Some(Category::Canonical(Currency::Gbp)),
                ..Default::default()
            },
            flags: QualityFlags {
                negative_salary: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_cleaned_output_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/clean.csv");

        let written = write_cleaned(&path, &[flagged()], "NA").unwrap();
        assert_eq!(written, 1);

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("employee_id,first_name"));
        assert!(header.ends_with("invalid_email,negative_salary,exit_before_hire"));

        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row.len(), 20);
        assert_eq!(row[0], "E1001");
        assert_eq!(row[2], "NA");
        assert_eq!(row[7], "2020-01-15");
        assert_eq!(row[8], "NA");
        assert_eq!(row[9], "true");
        assert_eq!(row[10], "-1500.5");
        assert_eq!(row[11], "GBP");
        assert_eq!(&row[17..], &["false", "true", "false"]);
    }

    #[test]
    fn test_kpi_files_are_written() {
        let dir = TempDir::new().unwrap();
        let reference = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let options = KpiOptions {
            reference_date: reference,
            turnover_period: TurnoverPeriod::year_to_date(reference),
        };
        let mut positive = flagged();
        positive.record.salary = Some(1000.0);
        positive.flags = QualityFlags::default();
        let mut usd = flagged();
        usd.record.currency = Some(Category::Canonical(Currency::Usd));
        let kpis = compute_kpis(&[positive, flagged(), usd], &options);

        let files = write_kpis(&dir.path().join("results"), &kpis).unwrap();

        let summary = fs::read_to_string(&files.summary).unwrap();
        assert!(summary.starts_with("Metric,Value\n"));
        assert!(summary.contains("Total Employees,3\n"));
        assert!(summary.contains("Attrition Rate (%),0\n"));

        let hires = fs::read_to_string(&files.hires_by_year).unwrap();
        assert_eq!(hires, "hire_year,number_of_hires\n2020,3\n");

        let salary = fs::read_to_string(&files.average_salary).unwrap();
        assert_eq!(
            salary,
            "department,currency,average_salary,employees,excluded_negative_salaries\n\
             Finance,GBP,1000.00,1,1\n\
             Finance,USD,,0,1\n"
        );
    }

    #[test]
    fn test_report_is_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = QualityReport::new(Some("raw.csv".to_string()));
        report.duplicates_removed = 3;

        write_report(&path, &report).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["duplicates_removed"], 3);
    }
}
