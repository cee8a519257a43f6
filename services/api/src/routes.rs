use crate::infra::{
    AppState, CompanySelectionRequest, FileSelectionRequest, LoginRequest, PostingQuery,
};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use placement_portal::error::AppError;
use placement_portal::notice::Notice;
use placement_portal::session::{User, View};
use placement_portal::workflows::placement::{JobPosting, PostingDraft, PostingStats};
use placement_portal::workflows::student::{
    ResumeFile, SubmissionId, SubmissionStatusView, UploadSelection,
};
use placement_portal::workflows::Company;
use placement_portal::PortalSnapshot;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub(crate) struct SessionCreated {
    pub(crate) session_id: String,
    pub(crate) snapshot: PortalSnapshot,
}

#[derive(Debug, Serialize)]
pub(crate) struct ViewChange {
    pub(crate) view: View,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<User>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionAccepted {
    pub(crate) submission_id: SubmissionId,
}

pub(crate) fn portal_router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/sessions", post(create_session))
        .route(
            "/api/v1/sessions/:id",
            get(session_snapshot).delete(close_session),
        )
        .route("/api/v1/sessions/:id/login", post(login_endpoint))
        .route("/api/v1/sessions/:id/logout", post(logout_endpoint))
        .route("/api/v1/sessions/:id/notices", get(notices_endpoint))
        .route(
            "/api/v1/sessions/:id/student/companies",
            get(student_companies),
        )
        .route("/api/v1/sessions/:id/student/file", put(select_file))
        .route("/api/v1/sessions/:id/student/company", put(select_company))
        .route(
            "/api/v1/sessions/:id/student/submissions",
            get(list_submissions).post(submit_resume),
        )
        .route(
            "/api/v1/sessions/:id/placement/postings",
            get(list_postings).post(create_posting),
        )
        .route("/api/v1/sessions/:id/placement/stats", get(posting_stats))
        .route(
            "/api/v1/sessions/:id/placement/companies",
            get(placement_companies),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready", "open_sessions": state.portals.len() })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn create_session(
    Extension(state): Extension<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), AppError> {
    let (session_id, portal) = state.portals.launch()?;
    let body = SessionCreated {
        session_id,
        snapshot: portal.snapshot(),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

pub(crate) async fn session_snapshot(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PortalSnapshot>, AppError> {
    Ok(Json(state.portals.get(&id)?.snapshot()))
}

pub(crate) async fn close_session(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.portals.close(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn login_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ViewChange>, AppError> {
    let portal = state.portals.get(&id)?;
    let view = portal.login(payload.credentials(), payload.role).await?;
    Ok(Json(ViewChange {
        view,
        user: portal.session().map(|session| session.user),
    }))
}

pub(crate) async fn logout_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewChange>, AppError> {
    let portal = state.portals.get(&id)?;
    let user = portal.logout()?;
    Ok(Json(ViewChange {
        view: portal.view(),
        user: Some(user),
    }))
}

pub(crate) async fn notices_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Notice>>, AppError> {
    Ok(Json(state.portals.get(&id)?.drain_notices()))
}

pub(crate) async fn student_companies(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Company>>, AppError> {
    let student = state.portals.get(&id)?.student()?;
    Ok(Json(student.companies().to_vec()))
}

pub(crate) async fn select_file(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FileSelectionRequest>,
) -> Result<Json<UploadSelection>, AppError> {
    let student = state.portals.get(&id)?.student()?;
    student.select_file(ResumeFile::from(payload))?;
    Ok(Json(student.selection()))
}

pub(crate) async fn select_company(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CompanySelectionRequest>,
) -> Result<Json<UploadSelection>, AppError> {
    let student = state.portals.get(&id)?.student()?;
    student.select_company(&payload.company_id)?;
    Ok(Json(student.selection()))
}

pub(crate) async fn submit_resume(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SubmissionAccepted>), AppError> {
    let student = state.portals.get(&id)?.student()?;
    let submission_id = student.submit().await?;
    Ok((StatusCode::ACCEPTED, Json(SubmissionAccepted { submission_id })))
}

pub(crate) async fn list_submissions(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SubmissionStatusView>>, AppError> {
    let student = state.portals.get(&id)?.student()?;
    let views = student
        .submissions()
        .iter()
        .map(|submission| submission.status_view())
        .collect();
    Ok(Json(views))
}

pub(crate) async fn create_posting(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<PostingDraft>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    let placement = state.portals.get(&id)?.placement()?;
    let posting = placement.create_posting(draft).await?;
    Ok((StatusCode::CREATED, Json(posting)))
}

pub(crate) async fn list_postings(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PostingQuery>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let placement = state.portals.get(&id)?.placement()?;
    let postings = match query.search {
        Some(term) => placement.filter(&term),
        None => placement.postings(),
    };
    Ok(Json(postings))
}

pub(crate) async fn posting_stats(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostingStats>, AppError> {
    let placement = state.portals.get(&id)?.placement()?;
    Ok(Json(placement.stats()))
}

pub(crate) async fn placement_companies(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<&'static str>>, AppError> {
    let placement = state.portals.get(&id)?.placement()?;
    Ok(Json(placement.companies().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::PortalRegistry;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use placement_portal::config::{PortalTimings, SessionLimits};
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;
    use tower::ServiceExt;

    const LOADER_DONE: Duration = Duration::from_millis(3_100);

    fn app_with_limits(limits: SessionLimits) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            portals: PortalRegistry::new(PortalTimings::default(), limits),
        };
        portal_router().layer(Extension(state))
    }

    fn test_app() -> Router {
        app_with_limits(SessionLimits::default())
    }

    fn notice_titles(notices: &Value) -> Vec<String> {
        notices
            .as_array()
            .expect("notice list")
            .iter()
            .filter_map(|notice| notice["title"].as_str().map(str::to_string))
            .collect()
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = app.clone().oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn signed_in(app: &Router, role: &str) -> String {
        let (status, created) = call(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["session_id"].as_str().expect("session id").to_string();

        sleep(LOADER_DONE).await;
        let (status, body) = call(
            app,
            "POST",
            &format!("/api/v1/sessions/{id}/login"),
            Some(json!({ "email": "someone@college.edu", "password": "pw", "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], role);
        id
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn login_waits_for_loader() {
        let app = test_app();
        let (status, created) = call(&app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["snapshot"]["view"], "loading");
        let id = created["session_id"].as_str().expect("session id").to_string();

        let login = json!({ "email": "a@b.c", "password": "x", "role": "student" });
        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/login"),
            Some(login.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        sleep(LOADER_DONE).await;
        let (_, snapshot) = call(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(snapshot["view"], "login");
        assert_eq!(snapshot["loader_progress"], 100);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/login"),
            Some(login),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "student_dashboard");
        assert_eq!(body["user"]["name"], "John Doe");
    }

    #[tokio::test(start_paused = true)]
    async fn student_upload_is_scored_over_http() {
        let app = test_app();
        let id = signed_in(&app, "student").await;
        let base = format!("/api/v1/sessions/{id}/student");

        let (_, companies) = call(&app, "GET", &format!("{base}/companies"), None).await;
        assert_eq!(companies.as_array().map(Vec::len), Some(5));

        let (status, _) = call(
            &app,
            "PUT",
            &format!("{base}/file"),
            Some(json!({ "file_name": "notes.txt", "media_type": "text/plain", "size_bytes": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(&app, "POST", &format!("{base}/submissions"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        call(
            &app,
            "PUT",
            &format!("{base}/file"),
            Some(json!({ "file_name": "resume.pdf", "media_type": "application/pdf", "size_bytes": 2048 })),
        )
        .await;
        let (status, selection) = call(
            &app,
            "PUT",
            &format!("{base}/company"),
            Some(json!({ "company_id": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(selection["file"]["name"], "resume.pdf");

        let (status, accepted) = call(&app, "POST", &format!("{base}/submissions"), None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (_, listed) = call(&app, "GET", &format!("{base}/submissions"), None).await;
        assert_eq!(listed[0]["id"], accepted["submission_id"]);
        assert_eq!(listed[0]["company_name"], "TCS");
        assert_eq!(listed[0]["status"], "Processing");
        assert!(listed[0].get("relevance_score").is_none());

        sleep(Duration::from_millis(3_100)).await;
        let (_, listed) = call(&app, "GET", &format!("{base}/submissions"), None).await;
        assert_eq!(listed[0]["status"], "Completed");
        let score = listed[0]["relevance_score"].as_u64().expect("score present");
        assert!((60..=99).contains(&score));

        let (status, _) = call(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/placement/stats"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, notices) = call(&app, "GET", &format!("/api/v1/sessions/{id}/notices"), None).await;
        let titles: Vec<&str> = notices
            .as_array()
            .expect("notice list")
            .iter()
            .filter_map(|notice| notice["title"].as_str())
            .collect();
        assert!(titles.contains(&"Invalid file type"));
        assert!(titles.contains(&"Resume uploaded successfully"));
    }

    #[tokio::test(start_paused = true)]
    async fn placement_postings_over_http() {
        let app = test_app();
        let id = signed_in(&app, "placement_team").await;
        let base = format!("/api/v1/sessions/{id}/placement");

        let (status, _) = call(
            &app,
            "POST",
            &format!("{base}/postings"),
            Some(json!({ "company": "Google", "title": "", "description": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, created) = call(
            &app,
            "POST",
            &format!("{base}/postings"),
            Some(json!({ "company": "Google", "title": "SRE", "description": "On call" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["applicant_count"], 0);

        let (_, all) = call(&app, "GET", &format!("{base}/postings"), None).await;
        assert_eq!(all[0]["company"], "Google");
        assert_eq!(all.as_array().map(Vec::len), Some(3));

        let (_, found) = call(&app, "GET", &format!("{base}/postings?search=infosys"), None).await;
        assert_eq!(found.as_array().map(Vec::len), Some(1));
        assert_eq!(found[0]["title"], "Associate Consultant");

        let (_, stats) = call(&app, "GET", &format!("{base}/stats"), None).await;
        assert_eq!(stats["total_postings"], 3);
        assert_eq!(stats["total_applicants"], 112);

        let (_, companies) = call(&app, "GET", &format!("{base}/companies"), None).await;
        assert_eq!(companies.as_array().map(Vec::len), Some(8));

        let (status, body) = call(&app, "POST", &format!("/api/v1/sessions/{id}/logout"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "login");
        let (status, _) = call(&app, "GET", &format!("{base}/stats"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_form_fields_raise_missing_information() {
        let app = test_app();
        let id = signed_in(&app, "placement_team").await;

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/placement/postings"),
            Some(json!({ "company": "Google", "description": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, notices) = call(&app, "GET", &format!("/api/v1/sessions/{id}/notices"), None).await;
        assert_eq!(notice_titles(&notices), ["Missing information"]);

        let (_, postings) = call(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/placement/postings"),
            None,
        )
        .await;
        assert_eq!(postings.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_file_selection_is_rejected_by_validation() {
        let app = test_app();
        let id = signed_in(&app, "student").await;

        let (status, _) = call(
            &app,
            "PUT",
            &format!("/api/v1/sessions/{id}/student/file"),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, notices) = call(&app, "GET", &format!("/api/v1/sessions/{id}/notices"), None).await;
        assert_eq!(notice_titles(&notices), ["Invalid file type"]);
    }

    #[tokio::test(start_paused = true)]
    async fn full_registry_refuses_new_sessions() {
        let app = app_with_limits(SessionLimits {
            idle_ttl: Duration::from_secs(60),
            max_open: 1,
        });
        let (status, _) = call(&app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().is_some());

        sleep(Duration::from_secs(61)).await;
        let (status, _) = call(&app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_is_not_found() {
        let app = test_app();
        let (_, created) = call(&app, "POST", "/api/v1/sessions", None).await;
        let id = created["session_id"].as_str().expect("session id").to_string();

        let (status, _) = call(&app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().is_some_and(|msg| msg.contains(&id)));
    }
}
