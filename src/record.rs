use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Errors raised while validating user-entered input or a segmentation
/// request. Surfaced to the caller for correction, never recovered here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A numeric field could not be parsed as an integer.
    NotNumeric { field: &'static str, value: String },
    /// A numeric field lies outside its declared range.
    OutOfRange { field: &'static str, value: i64 },
    /// The gender text is neither Male nor Female.
    UnknownGender(String),
    /// Segmentation needs at least one stored record.
    EmptyDataset,
    /// More clusters were requested than merged records exist.
    TooManyClusters { k: usize, records: usize },
    /// The underlying clusterer failed.
    Clustering(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NotNumeric { field, value } => {
                write!(f, "{} must be an integer, got `{}`", field, value)
            }
            ValidationError::OutOfRange { field, value } => {
                write!(f, "{} is out of range: {}", field, value)
            }
            ValidationError::UnknownGender(value) => {
                write!(f, "gender must be Male or Female, got `{}`", value)
            }
            ValidationError::EmptyDataset => {
                write!(f, "cannot segment an empty dataset")
            }
            ValidationError::TooManyClusters { k, records } => {
                write!(f, "cannot form {} clusters from {} records", k, records)
            }
            ValidationError::Clustering(msg) => write!(f, "clustering failed: {}", msg),
        }
    }
}

impl Error for ValidationError {}

/// Customer gender. Collected alongside the numeric fields but never used as
/// a clustering feature.
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            _ => Err(ValidationError::UnknownGender(s.to_string())),
        }
    }
}

/// One customer: gender plus the three numeric clustering features.
///
/// Gender is optional because the dataset source is not required to carry a
/// gender column; form input always supplies one.
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerRecord {
    pub gender: Option<Gender>,
    pub age: u32,
    pub annual_income: u32,
    pub spending_score: u32,
}

impl CustomerRecord {
    /// Builds a record from already-typed values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::OutOfRange` if the spending score is not in
    /// `[1, 100]`.
    pub fn new(
        gender: Option<Gender>,
        age: u32,
        annual_income: u32,
        spending_score: u32,
    ) -> Result<Self, ValidationError> {
        if !(1..=100).contains(&spending_score) {
            return Err(ValidationError::OutOfRange {
                field: "spending score",
                value: spending_score as i64,
            });
        }
        Ok(Self { gender, age, annual_income, spending_score })
    }

    /// Builds a record from raw form-field text.
    ///
    /// This is the core-side validation of UI input: fields are trimmed,
    /// parsed as integers and range-checked, so the caller only has to
    /// present the resulting `ValidationError`.
    pub fn parse(
        gender: Option<&str>,
        age: &str,
        annual_income: &str,
        spending_score: &str,
    ) -> Result<Self, ValidationError> {
        let gender = gender.map(Gender::from_str).transpose()?;
        let age = parse_field("age", age, 0, u32::MAX as i64)?;
        let annual_income = parse_field("annual income", annual_income, 0, u32::MAX as i64)?;
        let spending_score = parse_field("spending score", spending_score, 1, 100)?;
        Self::new(gender, age as u32, annual_income as u32, spending_score as u32)
    }

    /// The fixed-shape feature vector used for clustering:
    /// age, annual income, spending score, in that order.
    pub fn features(&self) -> [f64; 3] {
        [
            self.age as f64,
            self.annual_income as f64,
            self.spending_score as f64,
        ]
    }
}

fn parse_field(field: &'static str, text: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value: i64 = text.trim().parse().map_err(|_| ValidationError::NotNumeric {
        field,
        value: text.to_string(),
    })?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, value });
    }
    Ok(value)
}
