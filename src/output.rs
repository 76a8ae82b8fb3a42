use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::classify::SampleResult;
use crate::panel::LocusPanel;
use crate::status::StatusTally;

/// Streaming writer for the per-sample results table.
///
/// Columns: `sample`, the observed `Tm_<locus>` values as read, the assigned
/// `state_<locus>` per locus (empty when undetermined), and the combined
/// `genotype` for multi-locus panels.
pub struct ResultsWriter {
    writer: csv::Writer<BufWriter<File>>,
    multi_locus: bool,
}

impl ResultsWriter {
    pub fn create(path: &Path, panel: &LocusPanel) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create results file {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));

        let mut header: Vec<String> = Vec::with_capacity(2 * panel.len() + 2);
        header.push(String::from("sample"));
        for locus in panel.loci() {
            header.push(locus.column());
        }
        for locus in panel.loci() {
            header.push(format!("state_{}", locus.locus()));
        }
        let multi_locus = panel.is_multi_locus();
        if multi_locus {
            header.push(String::from("genotype"));
        }
        writer
            .write_record(&header)
            .context("failed to write results header")?;

        Ok(Self { writer, multi_locus })
    }

    pub fn write_sample(&mut self, result: &SampleResult) -> Result<()> {
        let mut row: Vec<String> = Vec::with_capacity(2 * result.calls.len() + 2);
        row.push(result.id.clone());
        row.extend(result.tm_cells.iter().cloned());
        for call in &result.calls {
            row.push(
                call.status()
                    .map(|status| status.name().to_string())
                    .unwrap_or_default(),
            );
        }
        if self.multi_locus {
            row.push(
                result
                    .genotype()
                    .unwrap_or_else(|| String::from("undetermined")),
            );
        }
        self.writer
            .write_record(&row)
            .context("failed to write results row")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().context("failed to flush results file")
    }
}

/// Write the status summary to the given path, or to stdout when `None`.
pub fn write_tally(tally: &StatusTally, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create summary file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write!(writer, "{tally}")
                .and_then(|_| writer.flush())
                .with_context(|| format!("failed to write summary file {}", path.display()))?;
            tracing::info!("Wrote status summary to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write!(handle, "{tally}").context("failed to write summary to stdout")?;
        }
    }
    Ok(())
}
