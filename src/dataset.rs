use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::Path;

use crate::record::{CustomerRecord, Gender};

const COL_AGE: &str = "Age";
const COL_INCOME: &str = "Annual Income (k$)";
const COL_SCORE: &str = "Spending Score (1-100)";
// The original Mall_Customers export labels the gender column "Genre".
const COL_GENDER: [&str; 2] = ["Gender", "Genre"];

/// Errors raised while loading the customer dataset. Fatal at startup; there
/// is no retry.
#[derive(Debug)]
pub enum LoadError {
    /// The source could not be read or is not well-formed CSV.
    Csv(csv::Error),
    /// A required column is absent from the header row.
    MissingColumn(&'static str),
    /// A cell could not be parsed as an integer in its declared range.
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
    /// The source holds a header but no data rows.
    Empty,
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Csv(err) => write!(f, "failed to read dataset: {}", err),
            LoadError::MissingColumn(column) => {
                write!(f, "dataset is missing required column `{}`", column)
            }
            LoadError::InvalidValue { row, column, value } => {
                write!(f, "record {}: column `{}` holds invalid value `{}`", row, column, value)
            }
            LoadError::Empty => write!(f, "dataset contains no records"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::Csv(err)
    }
}

/// The stored customer dataset: loaded once at startup, immutable afterwards.
///
/// A shared `&Dataset` may be used from any number of threads; `segment`
/// allocates its own working matrix per call.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<CustomerRecord>,
}

impl Dataset {
    /// Loads the dataset from a CSV file.
    ///
    /// The header must contain the `Age`, `Annual Income (k$)` and
    /// `Spending Score (1-100)` columns; a `Gender` (or `Genre`) column is
    /// picked up when present. Any other columns are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::from_csv(csv::Reader::from_path(path)?)
    }

    /// Same contract as [`Dataset::load`], over any reader.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, LoadError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    /// Builds a dataset directly from records, for embedding and tests.
    /// Unlike `load`, an empty dataset is representable here; `segment`
    /// rejects it per call.
    pub fn from_records(records: Vec<CustomerRecord>) -> Self {
        Self { records }
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, LoadError> {
        let headers = reader.headers()?.clone();
        let position = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(LoadError::MissingColumn(name))
        };
        let age_col = position(COL_AGE)?;
        let income_col = position(COL_INCOME)?;
        let score_col = position(COL_SCORE)?;
        let gender_col = COL_GENDER.iter().find_map(|&name| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .map(|idx| (idx, name))
        });

        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let row = result?;
            let line = i + 1;
            let cell = |idx: usize| row.get(idx).unwrap_or("").trim();

            let parse = |column: &'static str, idx: usize| -> Result<u32, LoadError> {
                cell(idx).parse().map_err(|_| LoadError::InvalidValue {
                    row: line,
                    column,
                    value: cell(idx).to_string(),
                })
            };
            let age = parse(COL_AGE, age_col)?;
            let annual_income = parse(COL_INCOME, income_col)?;
            let spending_score = parse(COL_SCORE, score_col)?;

            let gender = match gender_col {
                Some((idx, column)) if !cell(idx).is_empty() => Some(
                    cell(idx)
                        .parse::<Gender>()
                        .map_err(|_| LoadError::InvalidValue {
                            row: line,
                            column,
                            value: cell(idx).to_string(),
                        })?,
                ),
                _ => None,
            };

            records.push(
                CustomerRecord::new(gender, age, annual_income, spending_score).map_err(|_| {
                    LoadError::InvalidValue {
                        row: line,
                        column: COL_SCORE,
                        value: spending_score.to_string(),
                    }
                })?,
            );
        }

        if records.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CustomerRecord> {
        self.records.iter()
    }
}
