//! Per-sample classification against a reference Tm panel.

use crate::panel::LocusPanel;
use crate::status::Status;
use crate::table::SampleRow;

/// Per-locus classification outcome for one sample.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Call {
    Determined(Status),
    /// Tm cell missing, unparsable, or non-finite.
    Undetermined,
}

impl Call {
    pub fn status(&self) -> Option<Status> {
        match self {
            Call::Determined(status) => Some(*status),
            Call::Undetermined => None,
        }
    }
}

/// One classified sample. `tm_cells` and `calls` are parallel to the panel's
/// locus order; Tm cells are kept verbatim for lossless output.
#[derive(Clone, Debug)]
pub struct SampleResult {
    pub id: String,
    pub tm_cells: Vec<String>,
    pub calls: Vec<Call>,
}

impl SampleResult {
    /// Combined genotype string over all loci: `S` for Sensible, `H<i>` /
    /// `R<i>` for Heterocigoto / Resistente at the 1-based locus index.
    /// `None` when any locus call is undetermined.
    pub fn genotype(&self) -> Option<String> {
        let mut genotype = String::new();
        for (index, call) in self.calls.iter().enumerate() {
            match call.status()? {
                Status::Sensible => genotype.push('S'),
                Status::Heterocigoto => {
                    genotype.push('H');
                    genotype.push_str(&(index + 1).to_string());
                }
                Status::Resistente => {
                    genotype.push('R');
                    genotype.push_str(&(index + 1).to_string());
                }
            }
        }
        Some(genotype)
    }

    pub fn is_determined(&self) -> bool {
        self.calls.iter().all(|call| call.status().is_some())
    }
}

/// Classify one row against the panel.
///
/// `tm_indexes` maps each panel locus to its `Tm_<locus>` column in the
/// input header, in panel order.
pub fn classify_row(
    row: &SampleRow,
    panel: &LocusPanel,
    tm_indexes: &[usize],
    id: String,
) -> SampleResult {
    let mut tm_cells = Vec::with_capacity(panel.len());
    let mut calls = Vec::with_capacity(panel.len());

    for (locus, &column) in panel.loci().iter().zip(tm_indexes) {
        let cell = row.get(column).unwrap_or("");
        let call = match parse_tm(cell) {
            Some(observed) => Call::Determined(locus.nearest(observed)),
            None => Call::Undetermined,
        };
        tm_cells.push(cell.to_string());
        calls.push(call);
    }

    SampleResult { id, tm_cells, calls }
}

/// Parse an observed Tm cell. Empty, unparsable, and non-finite values read
/// as missing.
fn parse_tm(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::LocusPanel;
    use crate::table::Reader;

    fn single_row(data: &str) -> (crate::table::Header, SampleRow) {
        let reader = Reader::new(data.as_bytes(), b',').expect("header");
        let header = reader.header().clone();
        let mut rows: Vec<_> = reader.map(|r| r.expect("row")).collect();
        (header, rows.remove(0))
    }

    fn two_locus_panel() -> LocusPanel {
        LocusPanel::from_declarations(&[
            "1016:S:73.2,H:72.66,R:72.21",
            "1534:S:81.71,H:81.81,R:82.36",
        ])
        .expect("panel")
    }

    #[test]
    fn classifies_by_nearest_reference_tm() {
        let panel = two_locus_panel();
        let (header, row) = single_row("sample,Tm_1016,Tm_1534\nm1,73.15,82.3\n");
        let indexes = [
            header.index_of("Tm_1016").unwrap(),
            header.index_of("Tm_1534").unwrap(),
        ];

        let result = classify_row(&row, &panel, &indexes, String::from("m1"));
        assert_eq!(
            result.calls,
            [
                Call::Determined(Status::Sensible),
                Call::Determined(Status::Resistente),
            ]
        );
        assert_eq!(result.genotype().as_deref(), Some("SR2"));
        assert!(result.is_determined());
        assert_eq!(result.tm_cells, ["73.15", "82.3"]);
    }

    #[test]
    fn missing_tm_cell_is_undetermined() {
        let panel = two_locus_panel();
        let (header, row) = single_row("sample,Tm_1016,Tm_1534\nm1,,81.8\n");
        let indexes = [
            header.index_of("Tm_1016").unwrap(),
            header.index_of("Tm_1534").unwrap(),
        ];

        let result = classify_row(&row, &panel, &indexes, String::from("m1"));
        assert_eq!(result.calls[0], Call::Undetermined);
        assert_eq!(result.calls[1], Call::Determined(Status::Heterocigoto));
        assert_eq!(result.genotype(), None);
        assert!(!result.is_determined());
    }

    #[test]
    fn unparsable_and_non_finite_tm_read_as_missing() {
        assert_eq!(parse_tm("73.2"), Some(73.2));
        assert_eq!(parse_tm(" 73.2 "), Some(73.2));
        assert_eq!(parse_tm("warm"), None);
        assert_eq!(parse_tm("NaN"), None);
        assert_eq!(parse_tm("inf"), None);
        assert_eq!(parse_tm(""), None);
    }

    #[test]
    fn heterozygous_alleles_carry_locus_index() {
        let panel = two_locus_panel();
        let (header, row) = single_row("sample,Tm_1016,Tm_1534\nm1,72.7,81.8\n");
        let indexes = [
            header.index_of("Tm_1016").unwrap(),
            header.index_of("Tm_1534").unwrap(),
        ];

        let result = classify_row(&row, &panel, &indexes, String::from("m1"));
        assert_eq!(result.genotype().as_deref(), Some("H1H2"));
    }
}
