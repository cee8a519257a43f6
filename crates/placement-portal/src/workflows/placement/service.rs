use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::domain::{JobPosting, PostingDraft, PostingId, PostingStats};
use super::gateway::{PostingPublisher, PublishError};
use crate::notice::{Notice, NoticePublisher};
use crate::sequence::{next_timestamp_id, today};
use crate::session::Session;
use crate::tasks::BusyFlag;
use crate::workflows::catalog::CompanyCatalog;
use crate::workflows::common::ValidationError;

/// Error raised by the placement posting workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostingError {
    #[error("a job description is already being published")]
    Busy,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Placement team dashboard: publish job descriptions and review postings.
pub struct PlacementPostingWorkflow {
    session: Session,
    catalog: CompanyCatalog,
    postings: Mutex<Vec<JobPosting>>,
    busy: BusyFlag,
    publisher: Arc<dyn PostingPublisher>,
    notices: Arc<dyn NoticePublisher>,
}

impl PlacementPostingWorkflow {
    pub fn new(
        session: Session,
        postings: Vec<JobPosting>,
        publisher: Arc<dyn PostingPublisher>,
        notices: Arc<dyn NoticePublisher>,
    ) -> Self {
        Self {
            session,
            catalog: CompanyCatalog,
            postings: Mutex::new(postings),
            busy: BusyFlag::default(),
            publisher,
            notices,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn companies(&self) -> &'static [&'static str] {
        self.catalog.placement_companies()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Postings newest first.
    pub fn postings(&self) -> Vec<JobPosting> {
        self.postings.lock().expect("posting mutex poisoned").clone()
    }

    /// Publish a job description and list it ahead of existing postings.
    pub async fn create_posting(&self, draft: PostingDraft) -> Result<JobPosting, PostingError> {
        let busy = self.busy.try_enter().ok_or(PostingError::Busy)?;

        if let Err(err) = draft.validate() {
            self.notices
                .publish(Notice::failure(err.title(), err.to_string()));
            return Err(err.into());
        }

        info!(company = %draft.company, title = %draft.title, "publishing job description");
        if let Err(err) = self.publisher.publish(&draft).await {
            warn!(error = %err, "job description publish failed");
            self.notices
                .publish(Notice::failure("Publish failed", err.to_string()));
            return Err(err.into());
        }

        let PostingDraft { company, title, .. } = draft;
        let posting = JobPosting::new(PostingId(next_timestamp_id()), company, title, today());
        self.postings
            .lock()
            .expect("posting mutex poisoned")
            .insert(0, posting.clone());
        drop(busy);

        self.notices.publish(Notice::success(
            "Job description uploaded successfully",
            "Students can now apply for this position",
        ));
        Ok(posting)
    }

    /// Postings whose company or title contains `term`, ignoring case. Order is preserved.
    pub fn filter(&self, term: &str) -> Vec<JobPosting> {
        let needle = term.to_lowercase();
        self.postings
            .lock()
            .expect("posting mutex poisoned")
            .iter()
            .filter(|posting| posting.matches(&needle))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> PostingStats {
        PostingStats::from_postings(self.postings.lock().expect("posting mutex poisoned").iter())
    }
}
