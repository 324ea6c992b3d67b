//! Pipeline ingestion: reading the raw delimited employee file into text rows.
//!
//! Only structural problems are fatal here (unreadable file, unsupported
//! format, missing column, no data). Cell contents are never interpreted.

use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::config::PipelineSettings;
use crate::constants::REQUIRED_COLUMNS;
use crate::domain::RawEmployeeRow;
use crate::error::{PipelineError, Result};
use crate::observability::metrics;

/// Pick the field delimiter for `path`: the configured one if set,
/// otherwise tab for `.tsv` and comma for everything else we accept.
pub fn resolve_delimiter(path: &Path, configured: Option<char>) -> Result<u8> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let inferred = match extension.as_deref() {
        None | Some("csv") | Some("txt") => b',',
        Some("tsv") => b'\t',
        Some(other) => {
            metrics::loader::structural_error("unsupported_format");
            return Err(PipelineError::UnsupportedFormat(format!(
                "{} (.{} files are not delimited text)",
                path.display(),
                other
            )));
        }
    };

    match configured {
        Some(c) if c.is_ascii() => Ok(c as u8),
        Some(c) => Err(PipelineError::Config(format!(
            "delimiter '{}' is not a single-byte character",
            c
        ))),
        None => Ok(inferred),
    }
}

/// Position of each required column in the header, in `REQUIRED_COLUMNS` order
fn map_header(header: &ByteRecord) -> Result<[usize; 17]> {
    let names: Vec<String> = header
        .iter()
        .map(|field| {
            String::from_utf8_lossy(field)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_ascii_lowercase()
        })
        .collect();

    let mut positions = [0usize; 17];
    for (slot, column) in REQUIRED_COLUMNS.iter().enumerate() {
        match names.iter().position(|name| name == column) {
            Some(index) => positions[slot] = index,
            None => {
                metrics::loader::structural_error("missing_column");
                return Err(PipelineError::MissingColumn(column.to_string()));
            }
        }
    }
    Ok(positions)
}

fn field(record: &ByteRecord, index: usize) -> String {
    record
        .get(index)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

fn to_raw_row(record: &ByteRecord, positions: &[usize; 17], line: u64) -> RawEmployeeRow {
    let [
        employee_id,
        first_name,
        last_name,
        email,
        gender,
        department,
        job_title,
        hire_date,
        exit_date,
        is_active,
        salary,
        currency,
        country,
        state,
        city,
        manager_id,
        performance_score,
    ] = positions.map(|index| field(record, index));

    RawEmployeeRow {
        line,
        employee_id,
        first_name,
        last_name,
        email,
        gender,
        department,
        job_title,
        hire_date,
        exit_date,
        is_active,
        salary,
        currency,
        country,
        state,
        city,
        manager_id,
        performance_score,
    }
}

/// Read every data row of `path` as raw text.
///
/// Rows with too few fields are kept; absent trailing fields come back
/// empty and are treated as missing downstream. Bytes that are not valid
/// UTF-8 are replaced rather than rejected.
#[instrument(skip(settings), fields(path = %path.display()))]
pub fn load_employees(path: &Path, settings: &PipelineSettings) -> Result<Vec<RawEmployeeRow>> {
    let delimiter = resolve_delimiter(path, settings.delimiter)?;
    let file = File::open(path).map_err(|e| {
        metrics::loader::structural_error("unreadable");
        PipelineError::Io(e)
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let header = reader.byte_headers()?.clone();
    if header.is_empty() {
        metrics::loader::structural_error("empty_input");
        return Err(PipelineError::EmptyInput(path.to_path_buf()));
    }
    let positions = map_header(&header)?;

    let mut rows = Vec::new();
    let mut short_rows = 0usize;
    for result in reader.byte_records() {
        let record = result?;
        if record.len() < header.len() {
            short_rows += 1;
        }
        // blank lines are skipped by the reader; a row of empty fields is still a row
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(rows.len() as u64 + 2);
        rows.push(to_raw_row(&record, &positions, line));
    }

    if rows.is_empty() {
        metrics::loader::structural_error("empty_input");
        return Err(PipelineError::EmptyInput(path.to_path_buf()));
    }
    if short_rows > 0 {
        warn!(
            short_rows,
            "Rows with fewer fields than the header; missing fields read as empty"
        );
    }

    metrics::loader::rows_loaded(rows.len());
    info!(rows = rows.len(), columns = header.len(), "Loaded raw employee rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "employee_id,first_name,last_name,email,gender,department,job_title,\
                          hire_date,exit_date,is_active,salary,currency,country,state,city,\
                          manager_id,performance_score";

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_loads_rows_with_line_numbers() {
        let dir = TempDir::new().unwrap();
        let contents = format!(
            "{}\n\
             E1,jane,doe,j@x.com,F,HR,Clerk,2020-01-01,,yes,\"45,000\",\
             R,SA,KZN,Durban,,3\n\
             E2,john,roe,r@x.com,M,IT,Dev,2021-02-03,,no,100,$,USA,,Austin,E1,4\n",
            HEADER
        );
        let path = write_file(&dir, "raw.csv", &contents);

        let rows = load_employees(&path, &PipelineSettings::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].salary, "45,000");
        assert_eq!(rows[1].employee_id, "E2");
        assert_eq!(rows[1].manager_id, "E1");
    }

    #[test]
    fn test_header_is_case_insensitive_and_reorderable() {
        let dir = TempDir::new().unwrap();
        let mut columns: Vec<&str> = HEADER.split(',').collect();
        columns.reverse();
        let header = columns
            .iter()
            .map(|c| format!(" {} ", c.to_uppercase()))
            .collect::<Vec<_>>()
            .join(",");
        let row = (0..17).rev().map(|i| format!("v{}", i)).collect::<Vec<_>>().join(",");
        let path = write_file(&dir, "raw.csv", &format!("{},extra\n{},ignored\n", header, row));

        let rows = load_employees(&path, &PipelineSettings::default()).unwrap();
        assert_eq!(rows[0].employee_id, "v0");
        assert_eq!(rows[0].performance_score, "v16");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let header = HEADER.replace(",salary", "");
        let path = write_file(&dir, "raw.csv", &format!("{}\n", header));

        match load_employees(&path, &PipelineSettings::default()) {
            Err(PipelineError::MissingColumn(column)) => assert_eq!(column, "salary"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_file_is_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "raw.csv", &format!("{}\n", HEADER));

        assert!(matches!(
            load_employees(&path, &PipelineSettings::default()),
            Err(PipelineError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_zero_byte_file_is_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "raw.csv", "");

        assert!(matches!(
            load_employees(&path, &PipelineSettings::default()),
            Err(PipelineError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "raw.csv", &format!("{}\nE1,jane,doe\n", HEADER));

        let rows = load_employees(&path, &PipelineSettings::default()).unwrap();
        assert_eq!(rows[0].last_name, "doe");
        assert_eq!(rows[0].salary, "");
    }

    #[test]
    fn test_tsv_uses_tab_delimiter() {
        let dir = TempDir::new().unwrap();
        let header = HEADER.replace(',', "\t");
        let row = vec!["x"; 17].join("\t");
        let path = write_file(&dir, "raw.tsv", &format!("{}\n{}\n", header, row));

        let rows = load_employees(&path, &PipelineSettings::default()).unwrap();
        assert_eq!(rows[0].city, "x");
    }

    #[test]
    fn test_spreadsheet_formats_are_rejected() {
        assert!(matches!(
            resolve_delimiter(Path::new("raw.xlsx"), None),
            Err(PipelineError::UnsupportedFormat(_))
        ));
        assert_eq!(resolve_delimiter(Path::new("raw.csv"), Some(';')).unwrap(), b';');
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            load_employees(&path, &PipelineSettings::default()),
            Err(PipelineError::Io(_))
        ));
    }
}
