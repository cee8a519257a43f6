use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::common::{Percentage, ValidationError};

/// Creation-timestamp key for a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostingId(pub i64);

/// Job posting as listed on the results dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub id: PostingId,
    pub company: String,
    pub title: String,
    pub created_date: NaiveDate,
    applicant_count: u32,
    processed_count: u32,
    average_score: Percentage,
}

/// Counts handed to [`JobPosting::with_counts`] would break `processed <= applicants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{processed} processed resumes exceed {applicants} applicants")]
pub struct CountMismatch {
    pub applicants: u32,
    pub processed: u32,
}

impl JobPosting {
    /// Fresh posting with no applicants yet.
    pub fn new(
        id: PostingId,
        company: impl Into<String>,
        title: impl Into<String>,
        created_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            company: company.into(),
            title: title.into(),
            created_date,
            applicant_count: 0,
            processed_count: 0,
            average_score: Percentage::ZERO,
        }
    }

    pub fn with_counts(
        mut self,
        applicants: u32,
        processed: u32,
        average_score: Percentage,
    ) -> Result<Self, CountMismatch> {
        if processed > applicants {
            return Err(CountMismatch {
                applicants,
                processed,
            });
        }
        self.applicant_count = applicants;
        self.processed_count = processed;
        self.average_score = average_score;
        Ok(self)
    }

    pub fn applicant_count(&self) -> u32 {
        self.applicant_count
    }

    pub fn processed_count(&self) -> u32 {
        self.processed_count
    }

    pub fn average_score(&self) -> Percentage {
        self.average_score
    }

    /// Case-insensitive substring match on company or title.
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        needle_lowercase.is_empty()
            || self.company.to_lowercase().contains(needle_lowercase)
            || self.title.to_lowercase().contains(needle_lowercase)
    }
}

/// Job description form submitted by the placement team.
///
/// Absent fields deserialize as empty so [`PostingDraft::validate`] reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostingDraft {
    pub company: String,
    pub title: String,
    pub description: String,
}

impl PostingDraft {
    pub fn new(
        company: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let blank = [&self.company, &self.title, &self.description]
            .iter()
            .any(|field| field.trim().is_empty());
        if blank {
            return Err(ValidationError::MissingInformation(
                "please fill in all required fields",
            ));
        }
        Ok(())
    }
}

/// Dashboard totals derived from the current posting list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostingStats {
    pub total_postings: usize,
    pub total_applicants: u64,
    pub total_processed: u64,
}

impl PostingStats {
    pub fn from_postings<'a>(postings: impl IntoIterator<Item = &'a JobPosting>) -> Self {
        postings
            .into_iter()
            .fold(Self::default(), |mut stats, posting| {
                stats.total_postings += 1;
                stats.total_applicants += u64::from(posting.applicant_count);
                stats.total_processed += u64::from(posting.processed_count);
                stats
            })
    }
}

/// Postings the dashboard opens with.
pub fn seed_postings() -> Vec<JobPosting> {
    let seeds = [
        (1, "TCS", "Software Developer", (2024, 1, 15), 45, 32, 78),
        (2, "Infosys", "Associate Consultant", (2024, 1, 14), 67, 67, 72),
    ];

    seeds
        .into_iter()
        .filter_map(|(id, company, title, (y, m, d), applicants, processed, score)| {
            let created = NaiveDate::from_ymd_opt(y, m, d)?;
            JobPosting::new(PostingId(id), company, title, created)
                .with_counts(applicants, processed, Percentage::new(score)?)
                .ok()
        })
        .collect()
}
