use crate::infra::parse_time_scale;
use clap::{Args, ValueEnum};
use placement_portal::config::PortalTimings;
use placement_portal::error::AppError;
use placement_portal::session::{Credentials, Role, View};
use placement_portal::workflows::placement::{PlacementPostingWorkflow, PostingDraft};
use placement_portal::workflows::student::{ResumeFile, StudentUploadWorkflow, SubmissionStatus};
use placement_portal::{Portal, PortalServices};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

const SAMPLE_RESUME_BYTES: u64 = 240 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoRole {
    #[default]
    Student,
    PlacementTeam,
}

impl From<DemoRole> for Role {
    fn from(value: DemoRole) -> Self {
        match value {
            DemoRole::Student => Role::Student,
            DemoRole::PlacementTeam => Role::PlacementTeam,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Dashboard to sign in to.
    #[arg(long, value_enum, default_value_t = DemoRole::Student)]
    pub(crate) role: DemoRole,
    /// Resume to submit. Its media type is guessed from the extension; a sample PDF is used when omitted.
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
    /// Catalog id of the company the resume targets.
    #[arg(long, default_value = "1")]
    pub(crate) company_id: String,
    /// Multiplier applied to every simulated latency (1.0 = real time).
    #[arg(long, default_value_t = 0.1, value_parser = parse_time_scale)]
    pub(crate) time_scale: f64,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        role,
        resume,
        company_id,
        time_scale,
    } = args;

    let timings = PortalTimings::default().scaled(time_scale)?;
    let poll = timings.loader.tick;

    println!("Placement portal demo (latencies x{time_scale})");
    let portal = Portal::launch(PortalServices::simulated(&timings), &timings);
    wait_for_login(&portal, poll).await;

    let role = Role::from(role);
    let view = match portal
        .login(Credentials::new("demo@college.edu", "demo"), role)
        .await
    {
        Ok(view) => view,
        Err(err) => {
            println!("  Sign-in failed: {err}");
            return Ok(());
        }
    };
    if let Some(session) = portal.session() {
        println!(
            "- Signed in as {} ({}, {}) -> {:?}",
            session.user.name,
            session.user.role,
            session.user.location,
            view
        );
    }

    match role {
        Role::Student => {
            let file = resume_file(resume.as_deref())?;
            let student = portal.student()?;
            student_walkthrough(&student, &company_id, file, poll).await;
        }
        Role::PlacementTeam => {
            let placement = portal.placement()?;
            placement_walkthrough(&placement).await;
        }
    }

    print_notices(&portal);
    let user = portal.logout()?;
    println!("\nSigned out {} -> {:?}", user.name, portal.view());
    Ok(())
}

async fn wait_for_login(portal: &Portal, poll: Duration) {
    let mut reported = 0;
    while portal.view() != View::Login {
        let progress = portal.snapshot().loader_progress;
        if progress >= reported + 25 {
            reported = progress - progress % 25;
            println!("  Loading {progress}%");
        }
        sleep(poll).await;
    }
    println!("- Login screen ready");
}

fn resume_file(path: Option<&Path>) -> Result<ResumeFile, AppError> {
    let Some(path) = path else {
        return Ok(ResumeFile::new(
            "sample-resume.pdf",
            Some("application/pdf"),
            SAMPLE_RESUME_BYTES,
        ));
    };

    let size_bytes = std::fs::metadata(path)?.len();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = mime_guess::from_path(path).first();
    Ok(ResumeFile::new(
        name,
        media_type.as_ref().map(|mime| mime.essence_str()),
        size_bytes,
    ))
}

async fn student_walkthrough(
    student: &StudentUploadWorkflow,
    company_id: &str,
    file: ResumeFile,
    poll: Duration,
) {
    println!("\nStudent dashboard");
    for company in student.companies() {
        println!(
            "  [{}] {} ({})",
            company.id,
            company.name,
            company.roles.join(", ")
        );
    }

    if let Err(err) = student.select_company(company_id) {
        println!("  Company rejected: {err}");
        return;
    }
    let file_label = format!(
        "{} ({} bytes, {})",
        file.name,
        file.size_bytes,
        file.media_type.as_deref().unwrap_or("unknown type")
    );
    if let Err(err) = student.select_file(file) {
        println!("  Resume rejected: {err}");
        return;
    }

    println!("- Uploading {file_label}");
    let id = match student.submit().await {
        Ok(id) => id,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return;
        }
    };

    loop {
        let Some(record) = student
            .submissions()
            .into_iter()
            .find(|submission| submission.id == id)
        else {
            println!("  Submission {} disappeared", id.0);
            return;
        };
        if record.status != SubmissionStatus::Processing {
            let view = record.status_view();
            match view.relevance_score {
                Some(score) => println!(
                    "- {} for {} uploaded {}: {} with relevance {}%",
                    view.file_name, view.company_name, view.upload_date, view.status, score
                ),
                None => println!(
                    "- {} for {} uploaded {}: {}",
                    view.file_name, view.company_name, view.upload_date, view.status
                ),
            }
            return;
        }
        sleep(poll).await;
    }
}

async fn placement_walkthrough(placement: &PlacementPostingWorkflow) {
    println!("\nPlacement dashboard");
    print_stats(placement);

    let draft = PostingDraft::new(
        "Google",
        "Software Engineer",
        "Backend services in Rust and Go; campus hiring for the 2025 batch.",
    );
    match placement.create_posting(draft).await {
        Ok(posting) => println!(
            "- Published {} / {} on {}",
            posting.company, posting.title, posting.created_date
        ),
        Err(err) => println!("  Posting rejected: {err}"),
    }

    println!("Postings:");
    for posting in placement.postings() {
        println!(
            "  - {} / {} ({}): {} applicants, {} processed, avg {}",
            posting.company,
            posting.title,
            posting.created_date,
            posting.applicant_count(),
            posting.processed_count(),
            posting.average_score()
        );
    }

    let matches = placement.filter("consult");
    println!("Search \"consult\": {} match(es)", matches.len());
    print_stats(placement);
}

fn print_stats(placement: &PlacementPostingWorkflow) {
    let stats = placement.stats();
    println!(
        "  {} postings | {} applicants | {} processed",
        stats.total_postings, stats.total_applicants, stats.total_processed
    );
}

fn print_notices(portal: &Portal) {
    let notices = portal.drain_notices();
    if notices.is_empty() {
        return;
    }
    println!("\nNotices");
    for notice in notices {
        println!("  [{:?}] {}: {}", notice.kind, notice.title, notice.description);
    }
}
