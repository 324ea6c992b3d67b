//! Simple metrics module for the cleaning pipeline
//!
//! Metrics go through the `metrics` facade. The CLI installs an in-process
//! Prometheus recorder so a run can dump a text snapshot at exit; without a
//! recorder (library use, tests) every call is a no-op.

use std::fmt;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Enum representing all metric names used in the system
/// This eliminates magic strings and provides compile-time safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Run metrics
    PipelineRuns,
    PipelineDuration,

    // Loader metrics
    LoaderRowsLoaded,
    LoaderStructuralErrors,

    // Normalize metrics
    NormalizeValuesCanonicalized,
    NormalizeValuesUnrecognized,

    // Coercion metrics
    CoerceFailures,

    // Quality Gate metrics
    QualityGateRecordsAssessed,
    QualityGateFlagsRaised,

    // Dedup metrics
    DedupDuplicatesRemoved,
    DedupRecordsRetained,

    // Writer metrics
    WriterRowsWritten,

    // KPI metrics
    KpiHeadcount,
    KpiTurnoverRate,
}

/// Kind of instrument a metric is recorded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::PipelineRuns => "hr_pipeline_runs_total",
            MetricName::PipelineDuration => "hr_pipeline_duration_seconds",
            MetricName::LoaderRowsLoaded => "hr_loader_rows_loaded_total",
            MetricName::LoaderStructuralErrors => "hr_loader_structural_errors_total",
            MetricName::NormalizeValuesCanonicalized => "hr_normalize_values_canonicalized_total",
            MetricName::NormalizeValuesUnrecognized => "hr_normalize_values_unrecognized_total",
            MetricName::CoerceFailures => "hr_coerce_failures_total",
            MetricName::QualityGateRecordsAssessed => "hr_quality_gate_records_assessed_total",
            MetricName::QualityGateFlagsRaised => "hr_quality_gate_flags_raised_total",
            MetricName::DedupDuplicatesRemoved => "hr_dedup_duplicates_removed_total",
            MetricName::DedupRecordsRetained => "hr_dedup_records_retained",
            MetricName::WriterRowsWritten => "hr_writer_rows_written_total",
            MetricName::KpiHeadcount => "hr_kpi_headcount",
            MetricName::KpiTurnoverRate => "hr_kpi_turnover_rate",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        [
            MetricName::PipelineRuns,
            MetricName::PipelineDuration,
            MetricName::LoaderRowsLoaded,
            MetricName::LoaderStructuralErrors,
            MetricName::NormalizeValuesCanonicalized,
            MetricName::NormalizeValuesUnrecognized,
            MetricName::CoerceFailures,
            MetricName::QualityGateRecordsAssessed,
            MetricName::QualityGateFlagsRaised,
            MetricName::DedupDuplicatesRemoved,
            MetricName::DedupRecordsRetained,
            MetricName::WriterRowsWritten,
            MetricName::KpiHeadcount,
            MetricName::KpiTurnoverRate,
        ]
        .into_iter()
    }

    /// Instrument type and help text
    pub fn metadata(&self) -> (MetricType, &'static str) {
        match self {
            MetricName::PipelineRuns => (MetricType::Counter, "Pipeline runs started"),
            MetricName::PipelineDuration => (MetricType::Histogram, "Wall time of a pipeline run"),
            MetricName::LoaderRowsLoaded => {
                (MetricType::Counter, "Data rows read from the input file")
            }
            MetricName::LoaderStructuralErrors => {
                (MetricType::Counter, "Fatal input problems (missing column, empty input)")
            }
            MetricName::NormalizeValuesCanonicalized => {
                (MetricType::Counter, "Categorical values mapped to a canonical value")
            }
            MetricName::NormalizeValuesUnrecognized => {
                (MetricType::Counter, "Categorical values with no lookup entry")
            }
            MetricName::CoerceFailures => {
                (MetricType::Counter, "Malformed values coerced to missing")
            }
            MetricName::QualityGateRecordsAssessed => {
                (MetricType::Counter, "Records evaluated by the flagger")
            }
            MetricName::QualityGateFlagsRaised => {
                (MetricType::Counter, "Data-quality flags raised")
            }
            MetricName::DedupDuplicatesRemoved => {
                (MetricType::Counter, "Rows discarded as duplicate identifiers")
            }
            MetricName::DedupRecordsRetained => {
                (MetricType::Gauge, "Rows retained after deduplication")
            }
            MetricName::WriterRowsWritten => {
                (MetricType::Counter, "Rows written to the cleaned output")
            }
            MetricName::KpiHeadcount => (MetricType::Gauge, "Active employee headcount"),
            MetricName::KpiTurnoverRate => {
                (MetricType::Gauge, "Turnover rate for the configured period")
            }
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the in-process Prometheus recorder and describe every metric.
///
/// Idempotent: a second call leaves the first recorder in place.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;

    if METRICS_HANDLE.set(handle).is_err() {
        warn!("Metrics handle was already set");
    }

    for metric in MetricName::all_metrics() {
        let (metric_type, help) = metric.metadata();
        let name = metric.as_str();
        match metric_type {
            MetricType::Counter => ::metrics::describe_counter!(name, help),
            MetricType::Gauge => ::metrics::describe_gauge!(name, help),
            MetricType::Histogram => ::metrics::describe_histogram!(name, help),
        }
    }

    info!("Metrics system initialized (in-process recorder)");
    Ok(())
}

/// Render the current snapshot in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

/// Record the start and duration of a full run
pub mod run {
    use super::MetricName;

    pub fn started() {
        ::metrics::counter!(MetricName::PipelineRuns.as_str()).increment(1);
    }

    pub fn finished(secs: f64) {
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(secs);
    }
}

// ============================================================================
// Loader Metrics
// ============================================================================

pub mod loader {
    use super::MetricName;

    pub fn rows_loaded(count: usize) {
        ::metrics::counter!(MetricName::LoaderRowsLoaded.as_str()).increment(count as u64);
    }

    pub fn structural_error(kind: &str) {
        ::metrics::counter!(
            MetricName::LoaderStructuralErrors.as_str(),
            "kind" => kind.to_string()
        )
        .increment(1);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn value_canonicalized(field: &'static str) {
        ::metrics::counter!(
            MetricName::NormalizeValuesCanonicalized.as_str(),
            "field" => field
        )
        .increment(1);
    }

    pub fn value_unrecognized(field: &'static str) {
        ::metrics::counter!(
            MetricName::NormalizeValuesUnrecognized.as_str(),
            "field" => field
        )
        .increment(1);
    }
}

// ============================================================================
// Coercion Metrics
// ============================================================================

pub mod coerce {
    use super::MetricName;

    pub fn failure(field: &'static str) {
        ::metrics::counter!(MetricName::CoerceFailures.as_str(), "field" => field).increment(1);
    }
}

// ============================================================================
// Quality Gate Metrics
// ============================================================================

pub mod quality_gate {
    use super::MetricName;

    pub fn record_assessed() {
        ::metrics::counter!(MetricName::QualityGateRecordsAssessed.as_str()).increment(1);
    }

    pub fn flag_raised(flag: &'static str) {
        ::metrics::counter!(MetricName::QualityGateFlagsRaised.as_str(), "flag" => flag)
            .increment(1);
    }
}

// ============================================================================
// Dedup Metrics
// ============================================================================

pub mod dedup {
    use super::MetricName;

    pub fn completed(removed: usize, retained: usize) {
        ::metrics::counter!(MetricName::DedupDuplicatesRemoved.as_str()).increment(removed as u64);
        ::metrics::gauge!(MetricName::DedupRecordsRetained.as_str()).set(retained as f64);
    }
}

// ============================================================================
// Writer Metrics
// ============================================================================

pub mod writer {
    use super::MetricName;

    pub fn rows_written(count: usize) {
        ::metrics::counter!(MetricName::WriterRowsWritten.as_str()).increment(count as u64);
    }
}

// ============================================================================
// KPI Metrics
// ============================================================================

pub mod kpi {
    use super::MetricName;

    pub fn headcount(count: usize) {
        ::metrics::gauge!(MetricName::KpiHeadcount.as_str()).set(count as f64);
    }

    pub fn turnover_rate(rate: f64) {
        ::metrics::gauge!(MetricName::KpiTurnoverRate.as_str()).set(rate);
    }
}
