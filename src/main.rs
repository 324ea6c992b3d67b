use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use hr_cleaner::config::{Config, KpiSettings};
use hr_cleaner::logging;
use hr_cleaner::observability;
use hr_cleaner::pipeline::processing::kpi::{compute_kpis, HrKpis};
use hr_cleaner::pipeline::report::QualityReport;
use hr_cleaner::pipeline::{write_kpis, write_report, Pipeline, PipelineResult};

#[derive(Parser)]
#[command(name = "hr-cleaner")]
#[command(about = "Clean raw HR employee exports and compute workforce KPIs")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./hr_cleaner.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write a Prometheus text snapshot of run metrics to this file
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct KpiArgs {
    /// Date used as "today" for tenure and the default turnover period (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<NaiveDate>,
    /// First day of the turnover period (YYYY-MM-DD)
    #[arg(long)]
    period_start: Option<NaiveDate>,
    /// Last day of the turnover period (YYYY-MM-DD)
    #[arg(long)]
    period_end: Option<NaiveDate>,
}

impl KpiArgs {
    fn apply(&self, settings: &mut KpiSettings) {
        if self.reference_date.is_some() {
            settings.reference_date = self.reference_date;
        }
        if self.period_start.is_some() {
            settings.period_start = self.period_start;
        }
        if self.period_end.is_some() {
            settings.period_end = self.period_end;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw employee file and write the flagged, deduplicated table
    Clean {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Also write the data-quality report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Compute KPI result files from an employee file
    Kpis {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        results_dir: PathBuf,
        #[command(flatten)]
        kpi: KpiArgs,
    },
    /// Clean, then compute KPIs over the cleaned records
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        results_dir: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        kpi: KpiArgs,
    },
}

fn print_clean_summary(result: &PipelineResult, report: &QualityReport) {
    println!("\n📊 Cleaning Results:");
    println!("   Rows loaded: {}", result.rows_loaded);
    println!("   Rows written: {}", result.rows_written);
    println!("   Duplicates removed: {}", result.duplicates_removed);
    println!("   Flagged rows: {}", result.flagged_rows);
    println!("   Unrecognized categorical values: {}", report.unrecognized_total());
    println!("   Values coerced to missing: {}", report.coercion_failure_total());
    println!("   Output file: {}", result.output_file.display());

    let flags = &report.flags;
    if flags.invalid_email + flags.negative_salary + flags.exit_before_hire > 0 {
        println!("\n⚠️  Data quality flags:");
        println!("   invalid_email: {}", flags.invalid_email);
        println!("   negative_salary: {}", flags.negative_salary);
        println!("   exit_before_hire: {}", flags.exit_before_hire);
    }
}

fn print_kpi_summary(kpis: &HrKpis, results_dir: &Path) {
    let optional = |value: Option<f64>| {
        value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    };

    println!("\n📈 HR KPIs (reference date {}):", kpis.reference_date);
    println!("   Total employees: {}", kpis.total_employees);
    println!("   Headcount (active): {}", kpis.active_employees);
    println!("   Inactive: {}", kpis.inactive_employees);
    println!("   Attrition rate (%): {}", optional(kpis.attrition_rate_pct));
    println!("   Median tenure (days): {}", optional(kpis.median_tenure_days));
    println!(
        "   Turnover {}..{}: {}",
        kpis.turnover.period.start,
        kpis.turnover.period.end,
        optional(kpis.turnover.rate)
    );
    println!("   Results directory: {}", results_dir.display());
}

fn finish_report(report: &QualityReport, path: Option<&Path>) -> Result<()> {
    report.log_summary();
    if let Some(path) = path {
        write_report(path, report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("   Report: {}", path.display());
    }
    Ok(())
}

fn run_command(command: Commands, config: &mut Config) -> Result<()> {
    let pipeline = Pipeline::new(config.pipeline.clone());
    let today = Local::now().date_naive();

    match command {
        Commands::Clean { input, output, report } => {
            println!("🧹 Cleaning {}...", input.display());
            let (result, outcome) = pipeline
                .clean_file(&input, &output)
                .with_context(|| format!("Failed to clean {}", input.display()))?;
            print_clean_summary(&result, &outcome.report);
            finish_report(&outcome.report, report.as_deref())?;
        }
        Commands::Kpis { input, results_dir, kpi } => {
            kpi.apply(&mut config.kpi);
            let options = config.kpi.resolve(today)?;

            println!("📈 Computing KPIs from {}...", input.display());
            let outcome = pipeline
                .run(&input)
                .with_context(|| format!("Failed to load {}", input.display()))?;
            let kpis = compute_kpis(&outcome.records, &options);
            write_kpis(&results_dir, &kpis)
                .with_context(|| {
                    format!("Failed to write KPI results to {}", results_dir.display())
                })?;
            print_kpi_summary(&kpis, &results_dir);
        }
        Commands::Run {
            input,
            output,
            results_dir,
            report,
            kpi,
        } => {
            kpi.apply(&mut config.kpi);
            let options = config.kpi.resolve(today)?;

            println!("🔄 Running clean and KPI stages for {}...", input.display());
            let (result, outcome) = pipeline
                .clean_file(&input, &output)
                .with_context(|| format!("Failed to clean {}", input.display()))?;
            print_clean_summary(&result, &outcome.report);

            let kpis = compute_kpis(&outcome.records, &options);
            write_kpis(&results_dir, &kpis)
                .with_context(|| {
                    format!("Failed to write KPI results to {}", results_dir.display())
                })?;
            print_kpi_summary(&kpis, &results_dir);
            finish_report(&outcome.report, report.as_deref())?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _guard = logging::init_logging(&config.logging);
    match &config.source {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("No config file found, using defaults"),
    }

    if let Err(e) = observability::init() {
        warn!("Metrics recorder unavailable: {}", e);
    }

    let outcome = run_command(cli.command, &mut config);
    if let Err(e) = &outcome {
        error!("Run failed: {:#}", e);
    }

    if let Some(path) = cli.metrics_out {
        match observability::render() {
            Some(snapshot) => {
                fs::write(&path, snapshot)
                    .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
                info!(path = %path.display(), "Metrics snapshot written");
            }
            None => warn!("No metrics recorder installed, skipping metrics snapshot"),
        }
    }

    outcome
}
