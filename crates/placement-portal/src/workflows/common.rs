use std::fmt;

use serde::{Deserialize, Serialize};

/// Whole-number percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);

    pub fn new(value: u8) -> Option<Self> {
        (value <= 100).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Percentage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("percentage {value} exceeds 100"))
    }
}

impl From<Percentage> for u8 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Input rejected before any state changes. Always reported through a notice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing information: {0}")]
    MissingInformation(&'static str),
    #[error("invalid file type: {file_name} is neither a PDF nor a DOCX file")]
    InvalidFileType { file_name: String },
    #[error("file too large: {file_name} is {size_bytes} bytes, limit is {limit_bytes}")]
    FileTooLarge {
        file_name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },
    #[error("unknown company: {0}")]
    UnknownCompany(String),
}

impl ValidationError {
    /// Notice title shown for this rejection.
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::MissingInformation(_) => "Missing information",
            ValidationError::InvalidFileType { .. } => "Invalid file type",
            ValidationError::FileTooLarge { .. } => "File too large",
            ValidationError::UnknownCompany(_) => "Unknown company",
        }
    }
}
