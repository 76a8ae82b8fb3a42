use std::io;
use std::path::Path;

use clap::ValueEnum;
use thiserror::Error;

/// Input delimiter selection.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Delimiter {
    /// Infer from the file extension
    Auto,
    Comma,
    Tab,
}

impl Delimiter {
    pub fn resolve(self, path: &Path) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Auto => Self::detect(path),
        }
    }

    /// Infer the delimiter from the file name, ignoring a trailing `.gz`.
    /// `.tsv`, `.tab`, and `.txt` read as tab-separated; everything else as
    /// comma-separated.
    fn detect(path: &Path) -> u8 {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".tsv") || name.ends_with(".tab") || name.ends_with(".txt") {
            b'\t'
        } else {
            b','
        }
    }
}

/// Header row of the input table. Column names are whitespace-trimmed.
#[derive(Clone, Debug, Default)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// One data row; cells are addressed by header index.
#[derive(Clone, Debug)]
pub struct SampleRow {
    row: u64,
    record: csv::StringRecord,
}

impl SampleRow {
    /// 1-based data-row number, header excluded.
    pub fn number(&self) -> u64 {
        self.row
    }

    /// Cell at a header index; `None` when the row is shorter.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.record.get(index)
    }
}

/// Iterator over data rows of a delimited input table.
///
/// The header row is consumed eagerly; a zero-byte input reads as an empty
/// table rather than an error. Ragged rows are yielded as-is so the caller
/// can decide how to count them.
pub struct Reader<R> {
    records: csv::StringRecordsIntoIter<R>,
    header: Header,
    row: u64,
}

impl<R> Reader<R>
where
    R: io::Read,
{
    pub fn new(reader: R, delimiter: u8) -> Result<Self, ParseError> {
        let mut inner = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header = match inner.headers() {
            Ok(record) => Header {
                columns: record.iter().map(|cell| cell.trim().to_string()).collect(),
            },
            Err(source) => {
                return Err(ParseError {
                    row: 0,
                    kind: source.into(),
                });
            }
        };

        Ok(Self {
            records: inner.into_records(),
            header,
            row: 0,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
}

impl<R> Iterator for Reader<R>
where
    R: io::Read,
{
    type Item = Result<SampleRow, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        self.row += 1;
        Some(match result {
            Ok(record) => Ok(SampleRow {
                row: self.row,
                record,
            }),
            Err(source) => Err(ParseError {
                row: self.row,
                kind: source.into(),
            }),
        })
    }
}

/// Errors that can arise while reading rows from the input table.
#[derive(Debug, Error)]
#[error("row {row}: {kind}")]
pub struct ParseError {
    pub row: u64,
    #[source]
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("malformed delimited record")]
    Csv(#[from] csv::Error),
}
