//! Run orchestration: configuration, run summaries, and the classify and
//! tally pipelines.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::classify;
use crate::output::{self, ResultsWriter};
use crate::panel::LocusPanel;
use crate::report::{Distribution, RunReportBuilder, write_distribution};
use crate::smart_reader;
use crate::status::{self, Record, StatusTally};
use crate::table::{Delimiter, Header, Reader, SampleRow};

/// Configuration required to drive a classify run.
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub distribution: Option<PathBuf>,
    pub panel: LocusPanel,
    pub id_column: Option<String>,
    pub delimiter: Delimiter,
}

/// Configuration required to drive a tally run.
#[derive(Debug, Clone)]
pub struct TallyConfig {
    pub input: PathBuf,
    /// `None` writes the summary to stdout.
    pub output: Option<PathBuf>,
    pub status_column: String,
    pub id_column: Option<String>,
    pub delimiter: Delimiter,
}

/// Counters accumulated over a classify run.
///
/// `determined + undetermined + parse_errors == total_rows`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RunSummary {
    pub total_rows: u64,
    pub determined: u64,
    pub undetermined: u64,
    /// Individual Tm cells that were missing or unparsable; one sample can
    /// contribute several.
    pub missing_tm_cells: u64,
    pub parse_errors: u64,
}

/// Classify every sample in the input against the reference panel, write the
/// per-sample results table, and optionally the distribution report. A JSON
/// run report is written next to the results file.
pub fn run_classify(config: ClassifyConfig) -> Result<RunSummary> {
    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        loci = config.panel.len(),
        "starting classification",
    );

    let delimiter = config.delimiter.resolve(&config.input);
    let reader = smart_reader::open_input(&config.input)
        .with_context(|| format!("failed to open input {}", config.input.display()))?;
    let table = Reader::new(reader, delimiter)
        .with_context(|| format!("failed to read header of {}", config.input.display()))?;

    let tm_indexes = resolve_tm_columns(table.header(), &config.panel)?;
    let id_index = resolve_id_column(table.header(), config.id_column.as_deref())?;

    let mut writer = ResultsWriter::create(&config.output, &config.panel)?;
    let mut summary = RunSummary::default();
    let mut distribution = Distribution::default();

    for row in table {
        summary.total_rows += 1;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                summary.parse_errors += 1;
                tracing::warn!("skipping unreadable row: {err}");
                continue;
            }
        };

        let id = sample_id(&row, id_index);
        let sample = classify::classify_row(&row, &config.panel, &tm_indexes, id);

        summary.missing_tm_cells += sample
            .calls
            .iter()
            .filter(|call| call.status().is_none())
            .count() as u64;
        if sample.is_determined() {
            summary.determined += 1;
        } else {
            summary.undetermined += 1;
        }

        let genotype = sample.genotype();
        distribution.record(genotype.as_deref());
        writer.write_sample(&sample)?;
    }
    writer.finish()?;

    if let Some(path) = &config.distribution {
        write_distribution(path, &config.panel, &distribution)?;
    }

    let report = RunReportBuilder {
        input_path: config.input.display().to_string(),
        delimiter: delimiter_name(delimiter),
        output_path: config.output.display().to_string(),
        distribution_path: config
            .distribution
            .as_ref()
            .map(|path| path.display().to_string()),
    }
    .build(&config.panel, &summary);
    report.write(&config.output)?;

    Ok(summary)
}

/// Tally the status column of a pre-classified table and write the summary
/// to the configured sink.
pub fn run_tally(config: TallyConfig) -> Result<StatusTally> {
    tracing::info!(
        input = %config.input.display(),
        column = %config.status_column,
        "starting tally",
    );

    let delimiter = config.delimiter.resolve(&config.input);
    let reader = smart_reader::open_input(&config.input)
        .with_context(|| format!("failed to open input {}", config.input.display()))?;
    let table = Reader::new(reader, delimiter)
        .with_context(|| format!("failed to read header of {}", config.input.display()))?;

    let status_index = table.header().index_of(&config.status_column);
    if status_index.is_none() {
        tracing::warn!(
            column = %config.status_column,
            "status column not found in header; every row will be unrecognized",
        );
    }
    let id_index = resolve_id_column(table.header(), config.id_column.as_deref())?;

    let records = table.map(|row| match row {
        Ok(row) => Record {
            id: sample_id(&row, id_index),
            status: status_index
                .and_then(|index| row.get(index))
                .map(str::to_string),
        },
        Err(err) => {
            tracing::warn!("counting unreadable row as unrecognized: {err}");
            Record {
                id: err.row.to_string(),
                status: None,
            }
        }
    });
    let tally = status::count(records);

    output::write_tally(&tally, config.output.as_deref())?;
    Ok(tally)
}

fn resolve_tm_columns(header: &Header, panel: &LocusPanel) -> Result<Vec<usize>> {
    panel
        .loci()
        .iter()
        .map(|locus| {
            let column = locus.column();
            header
                .index_of(&column)
                .ok_or_else(|| anyhow!("column '{column}' not found in input header"))
        })
        .collect()
}

fn resolve_id_column(header: &Header, id_column: Option<&str>) -> Result<Option<usize>> {
    match id_column {
        Some(name) => header
            .index_of(name)
            .map(Some)
            .ok_or_else(|| anyhow!("id column '{name}' not found in input header")),
        None => Ok(None),
    }
}

/// Sample identifier: the id cell when configured and non-empty, otherwise
/// the 1-based data-row number.
fn sample_id(row: &SampleRow, id_index: Option<usize>) -> String {
    id_index
        .and_then(|index| row.get(index))
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| row.number().to_string())
}

fn delimiter_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => String::from("tab"),
        b',' => String::from("comma"),
        other => (other as char).to_string(),
    }
}
