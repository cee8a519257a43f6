use std::time::Duration;

use async_trait::async_trait;

use super::domain::PostingDraft;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("job board rejected the posting: {0}")]
    Rejected(String),
    #[error("job board unavailable: {0}")]
    Unavailable(String),
}

/// Destination that makes a job description visible to students.
#[async_trait]
pub trait PostingPublisher: Send + Sync {
    async fn publish(&self, draft: &PostingDraft) -> Result<(), PublishError>;
}

/// Stand-in job board: waits out a fixed latency and always accepts.
#[derive(Debug, Clone)]
pub struct SimulatedPostingPublisher {
    latency: Duration,
}

impl SimulatedPostingPublisher {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl PostingPublisher for SimulatedPostingPublisher {
    async fn publish(&self, _draft: &PostingDraft) -> Result<(), PublishError> {
        tokio::time::sleep(self.latency).await;
        Ok(())
    }
}
