//! Run reporting: the genotype distribution text report and a structured
//! JSON sidecar for downstream tool consumption.
//!
//! The JSON report is written alongside the results file and carries the
//! panel, run configuration, and statistics.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::RunSummary;
use crate::panel::LocusPanel;
use crate::status::Status;

/// Genotype distribution accumulated over one classify run.
#[derive(Clone, Debug, Default)]
pub struct Distribution {
    samples: u64,
    genotypes: BTreeMap<String, u64>,
    undetermined: u64,
}

impl Distribution {
    pub fn record(&mut self, genotype: Option<&str>) {
        self.samples += 1;
        match genotype {
            Some(genotype) => *self.genotypes.entry(genotype.to_string()).or_insert(0) += 1,
            None => self.undetermined += 1,
        }
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn undetermined(&self) -> u64 {
        self.undetermined
    }

    pub fn genotypes(&self) -> impl Iterator<Item = (&str, u64)> {
        self.genotypes
            .iter()
            .map(|(genotype, count)| (genotype.as_str(), *count))
    }

    /// Occurrences of each allele across determined genotypes, in the order
    /// `H1, R1, ..., Hn, Rn, S`. Genotypes are tokenized rather than
    /// substring-counted so multi-digit locus indexes stay distinct.
    pub fn allele_totals(&self, loci: usize) -> Vec<(String, u64)> {
        let mut totals: Vec<(String, u64)> = Vec::with_capacity(2 * loci + 1);
        for index in 1..=loci {
            totals.push((format!("H{index}"), 0));
            totals.push((format!("R{index}"), 0));
        }
        totals.push((String::from("S"), 0));

        for (genotype, count) in &self.genotypes {
            for token in tokenize(genotype) {
                if let Some(entry) = totals.iter_mut().find(|(allele, _)| *allele == token) {
                    entry.1 += count;
                }
            }
        }
        totals
    }
}

/// Split a genotype string into allele tokens: `S`, or `H`/`R` followed by a
/// locus index.
fn tokenize(genotype: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = genotype.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            'S' => tokens.push(String::from("S")),
            'H' | 'R' => {
                let mut token = String::from(ch);
                while let Some(digit) = chars.peek().filter(|c| c.is_ascii_digit()) {
                    token.push(*digit);
                    chars.next();
                }
                tokens.push(token);
            }
            _ => {}
        }
    }
    tokens
}

/// Write the distribution report: genotype counts with percentages, plus an
/// allele summary for multi-locus panels, or a per-state section for a
/// single locus.
pub fn write_distribution(
    path: &Path,
    panel: &LocusPanel,
    distribution: &Distribution,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create distribution report {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    if panel.is_multi_locus() {
        write_genotype_sections(&mut writer, panel.len(), distribution)?;
    } else {
        let locus = panel.loci().first().map(|l| l.locus()).unwrap_or_default();
        write_state_section(&mut writer, locus, distribution)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write distribution report {}", path.display()))?;
    tracing::info!("Wrote distribution report to {}", path.display());
    Ok(())
}

fn percent(count: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        count as f64 / denominator as f64 * 100.0
    }
}

fn write_genotype_sections<W: Write>(
    writer: &mut W,
    loci: usize,
    distribution: &Distribution,
) -> Result<()> {
    let samples = distribution.samples();

    writeln!(writer, "=== Genotype distribution ===")?;
    writeln!(writer, "Genotype\tCount\tPercent")?;
    for (genotype, count) in distribution.genotypes() {
        writeln!(
            writer,
            "{genotype}\t{count}\t{:.2}%",
            percent(count, samples)
        )?;
    }
    if distribution.undetermined() > 0 {
        writeln!(
            writer,
            "undetermined\t{}\t{:.2}%",
            distribution.undetermined(),
            percent(distribution.undetermined(), samples)
        )?;
    }

    let totals = distribution.allele_totals(loci);
    let occurrences: u64 = totals.iter().map(|(_, count)| count).sum();

    writeln!(writer)?;
    writeln!(writer, "=== Allele totals ===")?;
    writeln!(writer, "Allele\tCount\tPercent")?;
    for (allele, count) in totals {
        writeln!(
            writer,
            "{allele}\t{count}\t{:.2}%",
            percent(count, occurrences)
        )?;
    }
    Ok(())
}

fn write_state_section<W: Write>(
    writer: &mut W,
    locus: &str,
    distribution: &Distribution,
) -> Result<()> {
    let samples = distribution.samples();

    writeln!(writer, "=== State distribution for {locus} ===")?;
    writeln!(writer, "State\tCount\tPercent")?;
    for status in Status::ALL {
        // Single-locus genotypes are S, H1, R1.
        let key = match status {
            Status::Sensible => "S",
            Status::Heterocigoto => "H1",
            Status::Resistente => "R1",
        };
        let count = distribution
            .genotypes()
            .find(|(genotype, _)| *genotype == key)
            .map(|(_, count)| count)
            .unwrap_or(0);
        if count > 0 {
            writeln!(
                writer,
                "{}\t{count}\t{:.2}%",
                status.name(),
                percent(count, samples)
            )?;
        }
    }
    Ok(())
}

/// Complete report of a classify run, serialized to JSON alongside the
/// results file. For `results.csv`, writes `results_report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: String,
    pub timestamp: String,
    pub input: InputInfo,
    pub output: OutputInfo,
    pub panel: Vec<LocusInfo>,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    pub path: String,
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputInfo {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocusInfo {
    pub locus: String,
    pub references: Vec<StateReference>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateReference {
    pub state: String,
    pub tm: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_rows: u64,
    pub determined: u64,
    pub undetermined: u64,
    pub missing_tm_cells: u64,
    pub parse_errors: u64,
}

impl From<&RunSummary> for Statistics {
    fn from(summary: &RunSummary) -> Self {
        Statistics {
            total_rows: summary.total_rows,
            determined: summary.determined,
            undetermined: summary.undetermined,
            missing_tm_cells: summary.missing_tm_cells,
            parse_errors: summary.parse_errors,
        }
    }
}

impl RunReport {
    /// Write the report as JSON next to the results file.
    pub fn write(&self, output_path: &Path) -> Result<()> {
        let stem = output_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        let report_name = format!("{stem}_report.json");
        let report_path = output_path.with_file_name(report_name);

        let json = serde_json::to_string_pretty(self)
            .context("failed to serialize run report")?;
        std::fs::write(&report_path, json)
            .with_context(|| format!("failed to write run report {}", report_path.display()))?;
        tracing::info!("Wrote run report to {}", report_path.display());

        Ok(())
    }
}

/// Builder for constructing a [`RunReport`] during a classify run.
#[derive(Debug, Default)]
pub struct RunReportBuilder {
    pub input_path: String,
    pub delimiter: String,
    pub output_path: String,
    pub distribution_path: Option<String>,
}

impl RunReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self, panel: &LocusPanel, summary: &RunSummary) -> RunReport {
        let now = time::OffsetDateTime::now_utc();
        let timestamp = now
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| String::from("unknown"));

        RunReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp,
            input: InputInfo {
                path: self.input_path,
                delimiter: self.delimiter,
            },
            output: OutputInfo {
                path: self.output_path,
                distribution: self.distribution_path,
            },
            panel: panel
                .loci()
                .iter()
                .map(|locus| LocusInfo {
                    locus: locus.locus().to_string(),
                    references: locus
                        .states()
                        .map(|(state, tm)| StateReference {
                            state: state.name().to_string(),
                            tm,
                        })
                        .collect(),
                })
                .collect(),
            statistics: Statistics::from(summary),
        }
    }
}
