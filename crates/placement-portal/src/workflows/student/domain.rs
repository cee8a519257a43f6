use serde::{Deserialize, Serialize};

use crate::workflows::common::{Percentage, ValidationError};

/// Upload ceiling inherited from the resume intake service (16 MiB).
pub const MAX_RESUME_BYTES: u64 = 16 * 1024 * 1024;

const DOCX_SUFFIX: &str = ".docx";

/// Creation-timestamp key for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(pub i64);

/// File picked by the student, described by its declared metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeFile {
    pub name: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, media_type: Option<&str>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(str::to_string),
            size_bytes,
        }
    }

    fn is_pdf(&self) -> bool {
        self.media_type
            .as_deref()
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
            .is_some_and(|parsed| parsed.essence_str() == mime::APPLICATION_PDF.essence_str())
    }

    /// Accept PDFs by media type and Word documents by `.docx` name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.is_pdf() || self.name.ends_with(DOCX_SUFFIX)) {
            return Err(ValidationError::InvalidFileType {
                file_name: self.name.clone(),
            });
        }
        if self.size_bytes > MAX_RESUME_BYTES {
            return Err(ValidationError::FileTooLarge {
                file_name: self.name.clone(),
                size_bytes: self.size_bytes,
                limit_bytes: MAX_RESUME_BYTES,
            });
        }
        Ok(())
    }
}

/// Processing state of a submission. Only `Completed` carries a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Processing,
    Completed { relevance_score: Percentage },
    Failed { reason: String },
}

impl SubmissionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Processing => "Processing",
            SubmissionStatus::Completed { .. } => "Completed",
            SubmissionStatus::Failed { .. } => "Failed",
        }
    }

    pub fn relevance_score(&self) -> Option<Percentage> {
        match self {
            SubmissionStatus::Completed { relevance_score } => Some(*relevance_score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeSubmission {
    pub id: SubmissionId,
    pub company_name: String,
    pub file_name: String,
    pub upload_date: String,
    pub status: SubmissionStatus,
}

impl ResumeSubmission {
    pub fn processing(
        id: SubmissionId,
        company_name: impl Into<String>,
        file_name: impl Into<String>,
        upload_date: chrono::NaiveDate,
    ) -> Self {
        Self {
            id,
            company_name: company_name.into(),
            file_name: file_name.into(),
            upload_date: upload_date.format("%m/%d/%Y").to_string(),
            status: SubmissionStatus::Processing,
        }
    }

    /// Resolve a processing record. Returns `false` if it already reached a final state.
    pub fn complete(&mut self, relevance_score: Percentage) -> bool {
        self.resolve(SubmissionStatus::Completed { relevance_score })
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.resolve(SubmissionStatus::Failed {
            reason: reason.into(),
        })
    }

    fn resolve(&mut self, status: SubmissionStatus) -> bool {
        if self.status != SubmissionStatus::Processing {
            return false;
        }
        self.status = status;
        true
    }

    pub fn status_view(&self) -> SubmissionStatusView {
        SubmissionStatusView {
            id: self.id,
            company_name: self.company_name.clone(),
            file_name: self.file_name.clone(),
            upload_date: self.upload_date.clone(),
            status: self.status.label(),
            relevance_score: self.status.relevance_score().map(Percentage::value),
        }
    }
}

/// Flattened view of a submission as the status list renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionStatusView {
    pub id: SubmissionId,
    pub company_name: String,
    pub file_name: String,
    pub upload_date: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<u8>,
}

/// Current form state of the upload card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadSelection {
    pub company_id: Option<String>,
    pub file: Option<ResumeFile>,
}
