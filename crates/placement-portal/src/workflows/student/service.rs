use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::domain::{ResumeFile, ResumeSubmission, SubmissionId, UploadSelection};
use super::gateway::{ResumeUploader, ScoringEngine, ScoringError, ScoringRequest, UploadError};
use crate::notice::{Notice, NoticePublisher};
use crate::sequence::{next_timestamp_id, today};
use crate::session::Session;
use crate::tasks::{BusyFlag, PendingTasks};
use crate::workflows::catalog::{Company, CompanyCatalog};
use crate::workflows::common::{Percentage, ValidationError};

/// Error raised by the student upload workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("an upload is already in progress")]
    Busy,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Student dashboard: pick a company and a resume, upload it, watch it get scored.
///
/// Each accepted upload spawns its own scoring task; the task resolves its record by id.
/// Dropping the workflow aborts every scoring task still pending.
pub struct StudentUploadWorkflow {
    session: Session,
    catalog: CompanyCatalog,
    selection: Mutex<UploadSelection>,
    submissions: Arc<Mutex<Vec<ResumeSubmission>>>,
    busy: BusyFlag,
    uploader: Arc<dyn ResumeUploader>,
    scorer: Arc<dyn ScoringEngine>,
    notices: Arc<dyn NoticePublisher>,
    scoring_tasks: PendingTasks,
}

impl StudentUploadWorkflow {
    pub fn new(
        session: Session,
        uploader: Arc<dyn ResumeUploader>,
        scorer: Arc<dyn ScoringEngine>,
        notices: Arc<dyn NoticePublisher>,
    ) -> Self {
        Self {
            session,
            catalog: CompanyCatalog,
            selection: Mutex::new(UploadSelection::default()),
            submissions: Arc::new(Mutex::new(Vec::new())),
            busy: BusyFlag::default(),
            uploader,
            scorer,
            notices,
            scoring_tasks: PendingTasks::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn companies(&self) -> &'static [Company] {
        self.catalog.student_companies()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn selection(&self) -> UploadSelection {
        self.selection
            .lock()
            .expect("selection mutex poisoned")
            .clone()
    }

    /// Submissions in upload order, oldest first.
    pub fn submissions(&self) -> Vec<ResumeSubmission> {
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .clone()
    }

    pub fn pending_scores(&self) -> usize {
        self.scoring_tasks.in_flight()
    }

    /// Replace the selected file. Invalid files leave the previous selection in place.
    pub fn select_file(&self, file: ResumeFile) -> Result<(), ValidationError> {
        if let Err(err) = file.validate() {
            self.reject(&err);
            return Err(err);
        }

        self.selection
            .lock()
            .expect("selection mutex poisoned")
            .file = Some(file);
        Ok(())
    }

    /// Choose the target company by catalog id. An empty id clears the choice.
    pub fn select_company(&self, company_id: &str) -> Result<(), ValidationError> {
        let company_id = company_id.trim();
        let chosen = if company_id.is_empty() {
            None
        } else {
            match self.catalog.find(company_id) {
                Some(company) => Some(company.id.to_string()),
                None => {
                    let err = ValidationError::UnknownCompany(company_id.to_string());
                    self.reject(&err);
                    return Err(err);
                }
            }
        };

        self.selection
            .lock()
            .expect("selection mutex poisoned")
            .company_id = chosen;
        Ok(())
    }

    /// Upload the selected resume and queue it for scoring.
    pub async fn submit(&self) -> Result<SubmissionId, SubmitError> {
        let busy = self.busy.try_enter().ok_or(SubmitError::Busy)?;

        let (company, file) = match self.ready_selection() {
            Ok(ready) => ready,
            Err(err) => {
                self.reject(&err);
                return Err(err.into());
            }
        };

        info!(company = company.name, file = %file.name, "uploading resume");
        let receipt = match self.uploader.upload(&file, company).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(error = %err, "resume upload failed");
                self.notices
                    .publish(Notice::failure("Upload failed", err.to_string()));
                return Err(err.into());
            }
        };

        let id = SubmissionId(next_timestamp_id());
        let record = ResumeSubmission::processing(id, company.name, file.name.clone(), today());
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .push(record);
        *self.selection.lock().expect("selection mutex poisoned") = UploadSelection::default();

        self.schedule_scoring(ScoringRequest {
            submission_id: id,
            company_name: company.name.to_string(),
            storage_key: receipt.storage_key,
        });
        drop(busy);

        self.notices.publish(Notice::success(
            "Resume uploaded successfully",
            "Your resume is being analyzed. Results will be available shortly.",
        ));
        Ok(id)
    }

    fn ready_selection(&self) -> Result<(&'static Company, ResumeFile), ValidationError> {
        let selection = self.selection.lock().expect("selection mutex poisoned");
        let company = selection
            .company_id
            .as_deref()
            .and_then(|id| self.catalog.find(id));
        match (company, selection.file.as_ref()) {
            (Some(company), Some(file)) => Ok((company, file.clone())),
            _ => Err(ValidationError::MissingInformation(
                "select a company and upload your resume",
            )),
        }
    }

    fn schedule_scoring(&self, request: ScoringRequest) {
        let scorer = self.scorer.clone();
        let submissions = self.submissions.clone();
        let notices = self.notices.clone();

        self.scoring_tasks.track(tokio::spawn(async move {
            let outcome = scorer.score(&request).await;
            resolve_submission(&submissions, notices.as_ref(), request.submission_id, outcome);
        }));
    }

    fn reject(&self, err: &ValidationError) {
        self.notices
            .publish(Notice::failure(err.title(), err.to_string()));
    }
}

fn resolve_submission(
    submissions: &Mutex<Vec<ResumeSubmission>>,
    notices: &dyn NoticePublisher,
    id: SubmissionId,
    outcome: Result<Percentage, ScoringError>,
) {
    let mut submissions = submissions.lock().expect("submission mutex poisoned");
    let Some(record) = submissions.iter_mut().find(|record| record.id == id) else {
        warn!(submission_id = id.0, "scored submission no longer listed");
        return;
    };

    match outcome {
        Ok(score) => {
            if record.complete(score) {
                info!(submission_id = id.0, %score, "resume scored");
            }
        }
        Err(err) => {
            warn!(submission_id = id.0, error = %err, "resume scoring failed");
            if record.fail(err.to_string()) {
                notices.publish(Notice::failure("Scoring failed", err.to_string()));
            }
        }
    }
}
