//! Composition root: one router, the start-up loader, the login screen, and whichever
//! dashboard the signed-in role calls for.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PortalTimings;
use crate::notice::{Notice, NoticeLog};
use crate::session::{
    AuthProvider, Credentials, LoaderHandle, LoginError, LoginWorkflow, Role, ScreenRouter,
    Session, SimulatedAuthProvider, TransitionError, User, View,
};
use crate::workflows::placement::{
    seed_postings, PlacementPostingWorkflow, PostingPublisher, SimulatedPostingPublisher,
};
use crate::workflows::student::{
    ResumeUploader, ScoringEngine, SimulatedResumeUploader, SimulatedScoringEngine,
    StudentUploadWorkflow,
};

/// Remote collaborators the portal talks to.
#[derive(Clone)]
pub struct PortalServices {
    pub auth: Arc<dyn AuthProvider>,
    pub uploader: Arc<dyn ResumeUploader>,
    pub scorer: Arc<dyn ScoringEngine>,
    pub publisher: Arc<dyn PostingPublisher>,
}

impl PortalServices {
    pub fn simulated(timings: &PortalTimings) -> Self {
        Self {
            auth: Arc::new(SimulatedAuthProvider::new(timings.login_latency)),
            uploader: Arc::new(SimulatedResumeUploader::new(timings.upload_latency)),
            scorer: Arc::new(SimulatedScoringEngine::new(timings.scoring_delay)),
            publisher: Arc::new(SimulatedPostingPublisher::new(timings.publish_latency)),
        }
    }
}

#[derive(Clone)]
pub enum Dashboard {
    Student(Arc<StudentUploadWorkflow>),
    Placement(Arc<PlacementPostingWorkflow>),
}

impl Dashboard {
    fn is_busy(&self) -> bool {
        match self {
            Dashboard::Student(workflow) => workflow.is_busy(),
            Dashboard::Placement(workflow) => workflow.is_busy(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error("the {expected:?} screen is not active (showing {actual:?})")]
    WrongView { expected: View, actual: View },
}

/// What a renderer needs to draw the current screen.
#[derive(Debug, Clone, Serialize)]
pub struct PortalSnapshot {
    pub view: View,
    pub loader_progress: u8,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

pub struct Portal {
    router: Arc<Mutex<ScreenRouter>>,
    loader: LoaderHandle,
    login: LoginWorkflow,
    dashboard: Mutex<Option<Dashboard>>,
    services: PortalServices,
    notices: Arc<NoticeLog>,
}

impl Portal {
    /// Start on the loading screen; the loader moves the router to login when it finishes.
    pub fn launch(services: PortalServices, timings: &PortalTimings) -> Self {
        let router = Arc::new(Mutex::new(ScreenRouter::new()));
        let notices = Arc::new(NoticeLog::default());

        let signal = router.clone();
        let loader = LoaderHandle::spawn(timings.loader, move || {
            let mut router = signal.lock().expect("router mutex poisoned");
            if let Err(err) = router.loader_completed() {
                warn!(error = %err, "loader completion ignored");
            }
        });

        Self {
            router,
            loader,
            login: LoginWorkflow::new(services.auth.clone(), notices.clone()),
            dashboard: Mutex::new(None),
            services,
            notices,
        }
    }

    pub fn view(&self) -> View {
        self.router().view()
    }

    pub fn snapshot(&self) -> PortalSnapshot {
        let router = self.router();
        let dashboard_busy = self
            .dashboard
            .lock()
            .expect("dashboard mutex poisoned")
            .as_ref()
            .is_some_and(Dashboard::is_busy);

        PortalSnapshot {
            view: router.view(),
            loader_progress: self.loader.progress(),
            busy: self.login.is_busy() || dashboard_busy,
            user: router.session().map(|session| session.user.clone()),
            last_error: router.last_error().map(str::to_string),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.router().session().cloned()
    }

    /// Sign in and open the dashboard for `role`.
    pub async fn login(&self, credentials: Credentials, role: Role) -> Result<View, PortalError> {
        self.expect_view(View::Login)?;

        match self.login.sign_in(credentials, role).await {
            Ok(user) => {
                let mut router = self.router();
                let view = router.login_succeeded(user)?;
                let session = router
                    .session()
                    .cloned()
                    .ok_or(PortalError::WrongView {
                        expected: view,
                        actual: router.view(),
                    })?;
                let dashboard = self.build_dashboard(session);
                *self.dashboard.lock().expect("dashboard mutex poisoned") = Some(dashboard);
                Ok(view)
            }
            Err(LoginError::Authentication(err)) => {
                self.router().login_failed(err.to_string())?;
                Err(LoginError::Authentication(err).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Return to the login screen, tearing down the dashboard and its pending timers.
    pub fn logout(&self) -> Result<User, PortalError> {
        let mut router = self.router();
        let user = router.logout()?;
        let dashboard = self
            .dashboard
            .lock()
            .expect("dashboard mutex poisoned")
            .take();
        drop(router);
        drop(dashboard);
        debug!(user_id = %user.id.0, "dashboard released");
        Ok(user)
    }

    pub fn student(&self) -> Result<Arc<StudentUploadWorkflow>, PortalError> {
        match self.active_dashboard(View::StudentDashboard)? {
            Dashboard::Student(workflow) => Ok(workflow),
            Dashboard::Placement(_) => Err(self.wrong_view(View::StudentDashboard)),
        }
    }

    pub fn placement(&self) -> Result<Arc<PlacementPostingWorkflow>, PortalError> {
        match self.active_dashboard(View::PlacementDashboard)? {
            Dashboard::Placement(workflow) => Ok(workflow),
            Dashboard::Student(_) => Err(self.wrong_view(View::PlacementDashboard)),
        }
    }

    /// Notices raised since the last call. They are not kept afterwards.
    pub fn drain_notices(&self) -> Vec<Notice> {
        self.notices.drain()
    }

    fn build_dashboard(&self, session: Session) -> Dashboard {
        match session.role() {
            Role::Student => Dashboard::Student(Arc::new(StudentUploadWorkflow::new(
                session,
                self.services.uploader.clone(),
                self.services.scorer.clone(),
                self.notices.clone(),
            ))),
            Role::PlacementTeam => Dashboard::Placement(Arc::new(PlacementPostingWorkflow::new(
                session,
                seed_postings(),
                self.services.publisher.clone(),
                self.notices.clone(),
            ))),
        }
    }

    fn active_dashboard(&self, expected: View) -> Result<Dashboard, PortalError> {
        let dashboard = self
            .dashboard
            .lock()
            .expect("dashboard mutex poisoned")
            .clone();
        dashboard.ok_or_else(|| self.wrong_view(expected))
    }

    fn expect_view(&self, expected: View) -> Result<(), PortalError> {
        let actual = self.view();
        if actual == expected {
            Ok(())
        } else {
            Err(PortalError::WrongView { expected, actual })
        }
    }

    fn wrong_view(&self, expected: View) -> PortalError {
        PortalError::WrongView {
            expected,
            actual: self.view(),
        }
    }

    fn router(&self) -> MutexGuard<'_, ScreenRouter> {
        self.router.lock().expect("router mutex poisoned")
    }
}
