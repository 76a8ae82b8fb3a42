//! Reference Tm panel parsing and nearest-state lookup.
//!
//! A panel is built from one `--tm` declaration per locus, each of the form
//! `LOCUS:S:VAL,H:VAL,R:VAL`. The locus name must match the suffix of a
//! `Tm_<locus>` column in the input table.

use std::num::ParseFloatError;

use thiserror::Error;

use crate::status::Status;

/// Reference Tm values for one locus, kept in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct LocusRef {
    locus: String,
    references: Vec<(Status, f64)>,
}

impl LocusRef {
    /// Parse a single declaration, e.g. `1016:S:73.2,H:72.66,R:72.21`.
    ///
    /// State keys follow the same normalization as status cells; each state
    /// may appear at most once and at least one state is required.
    pub fn parse(raw: &str) -> Result<Self, PanelError> {
        let (locus, states) = raw
            .split_once(':')
            .ok_or_else(|| PanelError::MissingLocus {
                declaration: raw.to_string(),
            })?;
        let locus = locus.trim();
        if locus.is_empty() {
            return Err(PanelError::MissingLocus {
                declaration: raw.to_string(),
            });
        }

        let mut references: Vec<(Status, f64)> = Vec::new();
        for entry in states.split(',') {
            let (key, value) = entry
                .split_once(':')
                .ok_or_else(|| PanelError::MalformedEntry {
                    locus: locus.to_string(),
                    entry: entry.to_string(),
                })?;
            let status = Status::parse(key).ok_or_else(|| PanelError::UnknownState {
                locus: locus.to_string(),
                key: key.trim().to_string(),
            })?;
            if references.iter().any(|(existing, _)| *existing == status) {
                return Err(PanelError::DuplicateState {
                    locus: locus.to_string(),
                    state: status,
                });
            }
            let tm = value
                .trim()
                .parse::<f64>()
                .map_err(|source| PanelError::InvalidTm {
                    locus: locus.to_string(),
                    value: value.trim().to_string(),
                    source,
                })?;
            if !tm.is_finite() {
                return Err(PanelError::NonFiniteTm {
                    locus: locus.to_string(),
                    value: value.trim().to_string(),
                });
            }
            references.push((status, tm));
        }

        if references.is_empty() {
            return Err(PanelError::Empty {
                locus: locus.to_string(),
            });
        }

        Ok(Self {
            locus: locus.to_string(),
            references,
        })
    }

    pub fn locus(&self) -> &str {
        &self.locus
    }

    /// Name of the input column carrying this locus's observed Tm.
    pub fn column(&self) -> String {
        format!("Tm_{}", self.locus)
    }

    pub fn states(&self) -> impl Iterator<Item = (Status, f64)> + '_ {
        self.references.iter().copied()
    }

    /// State whose reference Tm is closest to the observed value.
    ///
    /// Ties resolve to the earlier declared state.
    pub fn nearest(&self, observed: f64) -> Status {
        let (mut best_status, mut best_tm) = self.references[0];
        for &(status, tm) in &self.references[1..] {
            if (observed - tm).abs() < (observed - best_tm).abs() {
                best_status = status;
                best_tm = tm;
            }
        }
        best_status
    }
}

/// Ordered collection of loci; names are unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocusPanel {
    loci: Vec<LocusRef>,
}

impl LocusPanel {
    pub fn from_declarations<S>(declarations: &[S]) -> Result<Self, PanelError>
    where
        S: AsRef<str>,
    {
        let mut loci: Vec<LocusRef> = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let locus_ref = LocusRef::parse(declaration.as_ref())?;
            if loci.iter().any(|l| l.locus == locus_ref.locus) {
                return Err(PanelError::DuplicateLocus {
                    locus: locus_ref.locus,
                });
            }
            loci.push(locus_ref);
        }
        Ok(Self { loci })
    }

    pub fn loci(&self) -> &[LocusRef] {
        &self.loci
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Multi-locus panels get a combined genotype column and allele totals.
    pub fn is_multi_locus(&self) -> bool {
        self.loci.len() > 1
    }
}

/// Errors raised while parsing `--tm` declarations.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("declaration '{declaration}' is missing the LOCUS: prefix")]
    MissingLocus { declaration: String },
    #[error("locus {locus}: entry '{entry}' is not STATE:VALUE")]
    MalformedEntry { locus: String, entry: String },
    #[error("locus {locus}: unknown state key '{key}'")]
    UnknownState { locus: String, key: String },
    #[error("locus {locus}: state {state} declared more than once")]
    DuplicateState { locus: String, state: Status },
    #[error("locus {locus}: invalid Tm value '{value}'")]
    InvalidTm {
        locus: String,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("locus {locus}: Tm value '{value}' is not finite")]
    NonFiniteTm { locus: String, value: String },
    #[error("locus {locus}: declaration has no states")]
    Empty { locus: String },
    #[error("locus {locus} declared more than once")]
    DuplicateLocus { locus: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_declaration() {
        let locus = LocusRef::parse("1016:S:73.2,H:72.66,R:72.21").expect("parse");
        assert_eq!(locus.locus(), "1016");
        assert_eq!(locus.column(), "Tm_1016");
        let states: Vec<_> = locus.states().collect();
        assert_eq!(
            states,
            vec![
                (Status::Sensible, 73.2),
                (Status::Heterocigoto, 72.66),
                (Status::Resistente, 72.21),
            ]
        );
    }

    #[test]
    fn state_keys_share_status_normalization() {
        let locus = LocusRef::parse("kdr: s :81.7, resistente :82.3").expect("parse");
        let states: Vec<_> = locus.states().map(|(s, _)| s).collect();
        assert_eq!(states, vec![Status::Sensible, Status::Resistente]);
    }

    #[test]
    fn rejects_duplicate_state() {
        let err = LocusRef::parse("1016:S:73.2,s:73.3").unwrap_err();
        assert!(matches!(err, PanelError::DuplicateState { .. }));
    }

    #[test]
    fn rejects_unknown_state_and_bad_value() {
        assert!(matches!(
            LocusRef::parse("1016:Q:73.2").unwrap_err(),
            PanelError::UnknownState { .. }
        ));
        assert!(matches!(
            LocusRef::parse("1016:S:warm").unwrap_err(),
            PanelError::InvalidTm { .. }
        ));
        assert!(matches!(
            LocusRef::parse("1016:S:inf").unwrap_err(),
            PanelError::NonFiniteTm { .. }
        ));
        assert!(matches!(
            LocusRef::parse("1016").unwrap_err(),
            PanelError::MissingLocus { .. }
        ));
    }

    #[test]
    fn nearest_picks_smallest_absolute_difference() {
        let locus = LocusRef::parse("1016:S:73.2,H:72.66,R:72.21").expect("parse");
        assert_eq!(locus.nearest(73.1), Status::Sensible);
        assert_eq!(locus.nearest(72.7), Status::Heterocigoto);
        assert_eq!(locus.nearest(70.0), Status::Resistente);
    }

    #[test]
    fn nearest_tie_goes_to_earlier_declared_state() {
        let locus = LocusRef::parse("x:S:73.0,H:74.0").expect("parse");
        assert_eq!(locus.nearest(73.5), Status::Sensible);
    }

    #[test]
    fn panel_rejects_duplicate_locus() {
        let err =
            LocusPanel::from_declarations(&["1016:S:73.2", "1016:H:72.66"]).unwrap_err();
        assert!(matches!(err, PanelError::DuplicateLocus { .. }));
    }

    #[test]
    fn panel_keeps_declaration_order() {
        let panel =
            LocusPanel::from_declarations(&["1016:S:73.2,H:72.66", "1534:S:81.71,R:82.36"])
                .expect("parse");
        assert_eq!(panel.len(), 2);
        assert!(panel.is_multi_locus());
        assert_eq!(panel.loci()[0].locus(), "1016");
        assert_eq!(panel.loci()[1].locus(), "1534");
    }
}
