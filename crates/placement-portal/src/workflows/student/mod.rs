//! Student resume submission: file validation, simulated upload, and asynchronous scoring.

pub mod domain;
pub mod gateway;
pub mod service;

pub use domain::{
    ResumeFile, ResumeSubmission, SubmissionId, SubmissionStatus, SubmissionStatusView,
    UploadSelection, MAX_RESUME_BYTES,
};
pub use gateway::{
    ResumeUploader, ScoringEngine, ScoringError, ScoringRequest, SimulatedResumeUploader,
    SimulatedScoringEngine, UploadError, UploadReceipt, SIMULATED_SCORE_RANGE,
};
pub use service::{StudentUploadWorkflow, SubmitError};
