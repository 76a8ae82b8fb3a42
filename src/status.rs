use std::fmt;

/// Genotype state assigned to a sample at one locus.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Status {
    Sensible,
    Heterocigoto,
    Resistente,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Sensible, Status::Heterocigoto, Status::Resistente];

    /// Parse a raw status cell.
    ///
    /// Normalization policy: ASCII whitespace is trimmed and the remainder is
    /// matched case-insensitively against the one-letter code (`S`, `H`, `R`)
    /// or the full state name. Anything else is unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 1 {
            return match trimmed.as_bytes()[0].to_ascii_lowercase() {
                b's' => Some(Status::Sensible),
                b'h' => Some(Status::Heterocigoto),
                b'r' => Some(Status::Resistente),
                _ => None,
            };
        }
        Status::ALL
            .into_iter()
            .find(|status| trimmed.eq_ignore_ascii_case(status.name()))
    }

    /// One-letter code used in summaries and genotype strings.
    pub fn code(&self) -> char {
        match self {
            Status::Sensible => 'S',
            Status::Heterocigoto => 'H',
            Status::Resistente => 'R',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Status::Sensible => "Sensible",
            Status::Heterocigoto => "Heterocigoto",
            Status::Resistente => "Resistente",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One input row reduced to the fields the tally needs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// Sample identifier, or the 1-based data-row number when the input has
    /// no id column.
    pub id: String,
    /// Raw status cell; `None` when the cell is missing or the row was
    /// malformed.
    pub status: Option<String>,
}

/// Counts per status plus the rows that matched none of them.
///
/// `sensible + heterocigoto + resistente + unrecognized` always equals the
/// number of rows recorded; [`StatusTally::total`] is derived rather than
/// stored so the invariant holds by construction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatusTally {
    pub sensible: u64,
    pub heterocigoto: u64,
    pub resistente: u64,
    pub unrecognized: u64,
}

impl StatusTally {
    pub fn record(&mut self, status: Option<Status>) {
        match status {
            Some(Status::Sensible) => self.sensible += 1,
            Some(Status::Heterocigoto) => self.heterocigoto += 1,
            Some(Status::Resistente) => self.resistente += 1,
            None => self.unrecognized += 1,
        }
    }

    pub fn get(&self, status: Status) -> u64 {
        match status {
            Status::Sensible => self.sensible,
            Status::Heterocigoto => self.heterocigoto,
            Status::Resistente => self.resistente,
        }
    }

    pub fn total(&self) -> u64 {
        self.sensible + self.heterocigoto + self.resistente + self.unrecognized
    }
}

impl fmt::Display for StatusTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "S: {}", self.sensible)?;
        writeln!(f, "H: {}", self.heterocigoto)?;
        writeln!(f, "R: {}", self.resistente)?;
        writeln!(f, "unrecognized: {}", self.unrecognized)?;
        writeln!(f, "total: {}", self.total())
    }
}

/// Tally the status field of every record.
///
/// Pure over its input: no I/O, no partial state visible on the outside.
/// Rows with a missing or unrecognized status land in the unrecognized
/// bucket instead of aborting the run.
pub fn count<I>(rows: I) -> StatusTally
where
    I: IntoIterator<Item = Record>,
{
    let mut tally = StatusTally::default();
    for record in rows {
        tally.record(record.status.as_deref().and_then(Status::parse));
    }
    tally
}
