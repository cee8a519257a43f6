//! Placement team job postings: publish, filter, and summarize.

pub mod domain;
pub mod gateway;
pub mod service;

pub use domain::{seed_postings, CountMismatch, JobPosting, PostingDraft, PostingId, PostingStats};
pub use gateway::{PostingPublisher, PublishError, SimulatedPostingPublisher};
pub use service::{PlacementPostingWorkflow, PostingError};
