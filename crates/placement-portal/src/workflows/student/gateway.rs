use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::domain::{ResumeFile, SubmissionId};
use crate::workflows::catalog::Company;
use crate::workflows::common::Percentage;

/// Range the simulated scorer draws from.
pub const SIMULATED_SCORE_RANGE: RangeInclusive<u8> = 60..=99;

/// Acknowledgement from the file storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub storage_key: String,
}

/// What the scoring engine needs to rank a stored resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringRequest {
    pub submission_id: SubmissionId,
    pub company_name: String,
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("resume storage rejected the file: {0}")]
    Rejected(String),
    #[error("resume storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("resume could not be parsed: {0}")]
    Unparseable(String),
    #[error("scoring engine unavailable: {0}")]
    Unavailable(String),
}

/// Resume storage and parsing service.
#[async_trait]
pub trait ResumeUploader: Send + Sync {
    async fn upload(&self, file: &ResumeFile, company: &Company)
        -> Result<UploadReceipt, UploadError>;
}

/// Relevance scorer for a stored resume against a company's openings.
#[async_trait]
pub trait ScoringEngine: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<Percentage, ScoringError>;
}

/// Stand-in storage: waits out a fixed latency and always accepts.
#[derive(Debug, Clone)]
pub struct SimulatedResumeUploader {
    latency: Duration,
}

impl SimulatedResumeUploader {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl ResumeUploader for SimulatedResumeUploader {
    async fn upload(
        &self,
        file: &ResumeFile,
        company: &Company,
    ) -> Result<UploadReceipt, UploadError> {
        tokio::time::sleep(self.latency).await;
        Ok(UploadReceipt {
            storage_key: format!("resumes/{}/{}", company.id, file.name),
        })
    }
}

/// Stand-in scorer: waits out a fixed delay, then draws uniformly from 60..=99.
#[derive(Debug, Clone)]
pub struct SimulatedScoringEngine {
    delay: Duration,
}

impl SimulatedScoringEngine {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ScoringEngine for SimulatedScoringEngine {
    async fn score(&self, _request: &ScoringRequest) -> Result<Percentage, ScoringError> {
        tokio::time::sleep(self.delay).await;
        let value = rand::thread_rng().gen_range(SIMULATED_SCORE_RANGE);
        Percentage::new(value)
            .ok_or_else(|| ScoringError::Unavailable(format!("score {value} out of range")))
    }
}
