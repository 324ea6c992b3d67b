// Data cleaning pipeline: ingestion, processing, and output

pub mod ingestion;
pub mod output;
pub mod processing;
pub mod report;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument};

use crate::config::PipelineSettings;
use crate::error::Result;
use crate::observability::metrics;
use processing::coerce::TypeCoercer;
use processing::dedup::deduplicate;
use processing::normalize::{MissingTokens, Normalizer};
use processing::quality_gate::{
    count_dangling_manager_refs, flag_records, tally_flags, DefaultQualityGate, FlaggedRecord,
    QualityGate,
};
use processing::RecordCleaner;
use report::QualityReport;

pub use output::{write_cleaned, write_kpis, write_report, KpiFiles};

/// Cleaned records and the quality report of one run
#[derive(Debug)]
pub struct PipelineOutcome {
    pub records: Vec<FlaggedRecord>,
    pub report: QualityReport,
}

/// Summary of a clean run that wrote output
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub rows_loaded: usize,
    pub rows_written: usize,
    pub duplicates_removed: usize,
    pub flagged_rows: usize,
    pub duration_secs: f64,
}

/// Load, normalize, coerce, flag and deduplicate an employee file
pub struct Pipeline {
    settings: PipelineSettings,
    cleaner: RecordCleaner,
    gate: Box<dyn QualityGate>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        let missing = MissingTokens::new(&settings.missing_tokens);
        let cleaner = RecordCleaner::new(
            Normalizer::new(missing.clone()),
            TypeCoercer::new(settings.date_formats.clone(), missing),
        );
        Self {
            settings,
            cleaner,
            gate: Box::new(DefaultQualityGate::new()),
        }
    }

    /// Swap in a different record-level quality gate
    pub fn with_quality_gate<G: QualityGate + 'static>(mut self, gate: G) -> Self {
        self.gate = Box::new(gate);
        self
    }

    /// Run every cleaning stage over `input`. Only structural problems with
    /// the file are errors; row-level problems are collected in the report.
    #[instrument(skip(self), fields(input = %input.display()))]
    pub fn run(&self, input: &Path) -> Result<PipelineOutcome> {
        let mut report = QualityReport::new(Some(input.display().to_string()));

        let rows = ingestion::load_employees(input, &self.settings)?;
        report.rows_loaded = rows.len();

        let records = self.cleaner.clean_all(&rows, &mut report);
        let flagged = flag_records(self.gate.as_ref(), records);

        let deduped = deduplicate(flagged, self.settings.duplicate_policy);
        report.duplicates_removed = deduped.removed;
        report.duplicate_ids = deduped.duplicate_ids;
        report.rows_without_identifier = deduped.without_key;

        let records = deduped.records;
        report.rows_retained = records.len();
        tally_flags(&records, &mut report);
        report.dangling_manager_refs = count_dangling_manager_refs(&records);
        report.tally_missing(&records);

        info!(
            rows_loaded = report.rows_loaded,
            rows_retained = report.rows_retained,
            unrecognized = report.unrecognized_total(),
            coercion_failures = report.coercion_failure_total(),
            "Pipeline stages complete"
        );
        Ok(PipelineOutcome { records, report })
    }

    /// Run the stages and write the cleaned table to `output`
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    pub fn clean_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<(PipelineResult, PipelineOutcome)> {
        let started = Instant::now();
        metrics::run::started();

        let outcome = self.run(input)?;
        let rows_written = write_cleaned(output, &outcome.records, &self.settings.missing_marker)?;

        let duration_secs = started.elapsed().as_secs_f64();
        metrics::run::finished(duration_secs);

        let result = PipelineResult {
            input_file: input.to_path_buf(),
            output_file: output.to_path_buf(),
            rows_loaded: outcome.report.rows_loaded,
            rows_written,
            duplicates_removed: outcome.report.duplicates_removed,
            flagged_rows: outcome.records.iter().filter(|r| r.flags.any()).count(),
            duration_secs,
        };
        info!(rows_written, duration_secs, "Clean run finished");
        Ok((result, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmployeeRecord;
    use crate::pipeline::processing::quality_gate::QualityFlags;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "employee_id,first_name,last_name,email,gender,department,job_title,\
                          hire_date,exit_date,is_active,salary,currency,country,state,city,\
                          manager_id,performance_score";

    struct StrictGate;

    impl QualityGate for StrictGate {
        fn assess(&self, _record: &EmployeeRecord) -> QualityFlags {
            QualityFlags {
                invalid_email: true,
                ..Default::default()
            }
        }
    }

    fn sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("raw.csv");
        let contents = format!(
            "{}\n\
             E1001,jane,doe,JANE@X.COM,F,hr,Clerk,2020-01-15,,yes,\"45,000\",R,SA,kzn,durban,,4\n\
             E1002,john,roe,john-at-x,M,IT,Dev,2021-02-03,2020-01-01,no,-10,$,USA,,Austin,E1001,3\n\
             E1001,jane,doe,jane@x.com,Female,HR,Clerk,2020-01-15,,yes,45000,ZAR,\
             South Africa,KZN,Durban,,4\n",
            HEADER
        );
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_run_collects_report() {
        let dir = TempDir::new().unwrap();
        let outcome = Pipeline::new(PipelineSettings::default()).run(&sample(&dir)).unwrap();

        assert_eq!(outcome.report.rows_loaded, 3);
        assert_eq!(outcome.report.rows_retained, 2);
        assert_eq!(outcome.report.duplicates_removed, 1);
        assert_eq!(outcome.report.duplicate_ids, vec!["E1001".to_string()]);
        assert_eq!(outcome.report.flags.invalid_email, 1);
        assert_eq!(outcome.report.flags.negative_salary, 1);
        assert_eq!(outcome.report.flags.exit_before_hire, 1);
        assert_eq!(outcome.report.dangling_manager_refs, 0);
    }

    #[test]
    fn test_flag_counts_ignore_discarded_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.csv");
        let contents = format!(
            "{}\n\
             E1,ann,lee,ann@x.com,F,HR,Clerk,2020-01-15,,yes,100,ZAR,SA,KZN,Durban,,4\n\
             E1,ann,lee,bad-email,F,HR,Clerk,2020-01-15,,yes,-5,ZAR,SA,KZN,Durban,,4\n",
            HEADER
        );
        fs::write(&path, contents).unwrap();

        let outcome = Pipeline::new(PipelineSettings::default()).run(&path).unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert!(!outcome.records[0].flags.any());
        assert_eq!(outcome.report.flags, Default::default());
        assert!(outcome.report.flags.invalid_email_ids.is_empty());
    }

    #[test]
    fn test_custom_gate_is_used() {
        let dir = TempDir::new().unwrap();
        let outcome = Pipeline::new(PipelineSettings::default())
            .with_quality_gate(StrictGate)
            .run(&sample(&dir))
            .unwrap();

        assert!(outcome.records.iter().all(|r| r.flags.invalid_email));
    }

    #[test]
    fn test_clean_file_writes_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out/clean.csv");
        let (result, _) = Pipeline::new(PipelineSettings::default())
            .clean_file(&sample(&dir), &output)
            .unwrap();

        assert_eq!(result.rows_written, 2);
        assert_eq!(result.flagged_rows, 1);
        assert!(output.exists());
    }
}
