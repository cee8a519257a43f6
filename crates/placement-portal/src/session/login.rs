use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::domain::{Credentials, Role, User, UserId};
use crate::notice::{Notice, NoticePublisher};
use crate::tasks::BusyFlag;

/// Identity provider consulted by the login screen.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(
        &self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<User, AuthenticationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is not permitted to sign in as {0}")]
    RoleNotPermitted(Role),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Stand-in provider: waits out a fixed latency and accepts any credentials.
#[derive(Debug, Clone)]
pub struct SimulatedAuthProvider {
    latency: Duration,
}

impl SimulatedAuthProvider {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn placeholder_user(email: &str, role: Role) -> User {
        let name = match role {
            Role::Student => "John Doe",
            Role::PlacementTeam => "Jane Smith",
        };
        User {
            id: UserId("user-123".to_string()),
            email: email.to_string(),
            name: name.to_string(),
            role,
            location: "Hyderabad".to_string(),
        }
    }
}

#[async_trait]
impl AuthProvider for SimulatedAuthProvider {
    async fn authenticate(
        &self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<User, AuthenticationError> {
        tokio::time::sleep(self.latency).await;
        Ok(Self::placeholder_user(&credentials.email, role))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("a sign-in attempt is already in progress")]
    Busy,
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
}

/// Login screen behavior: one attempt in flight at a time, role chosen by the caller.
pub struct LoginWorkflow {
    auth: Arc<dyn AuthProvider>,
    notices: Arc<dyn NoticePublisher>,
    busy: BusyFlag,
}

impl LoginWorkflow {
    pub fn new(auth: Arc<dyn AuthProvider>, notices: Arc<dyn NoticePublisher>) -> Self {
        Self {
            auth,
            notices,
            busy: BusyFlag::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub async fn sign_in(&self, credentials: Credentials, role: Role) -> Result<User, LoginError> {
        let _busy = self.busy.try_enter().ok_or(LoginError::Busy)?;
        info!(email = %credentials.email, %role, "sign-in requested");

        match self.auth.authenticate(&credentials, role).await {
            Ok(mut user) => {
                // The dashboard shown is the one the user asked for.
                user.role = role;
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                self.notices
                    .publish(Notice::failure("Sign-in failed", err.to_string()));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{NoticeKind, NoticeLog};

    struct RejectingProvider;

    #[async_trait]
    impl AuthProvider for RejectingProvider {
        async fn authenticate(
            &self,
            _credentials: &Credentials,
            _role: Role,
        ) -> Result<User, AuthenticationError> {
            Err(AuthenticationError::InvalidCredentials)
        }
    }

    fn workflow(auth: Arc<dyn AuthProvider>) -> (Arc<LoginWorkflow>, Arc<NoticeLog>) {
        let notices = Arc::new(NoticeLog::default());
        (Arc::new(LoginWorkflow::new(auth, notices.clone())), notices)
    }

    #[tokio::test(start_paused = true)]
    async fn role_follows_the_control_pressed() {
        let provider = Arc::new(SimulatedAuthProvider::new(Duration::from_millis(1500)));
        let (login, _) = workflow(provider);

        let student = login
            .sign_in(Credentials::new("a@b.c", "x"), Role::Student)
            .await
            .expect("student sign-in");
        assert_eq!(student.role, Role::Student);
        assert_eq!(student.name, "John Doe");
        assert_eq!(student.email, "a@b.c");

        let staff = login
            .sign_in(Credentials::default(), Role::PlacementTeam)
            .await
            .expect("placement sign-in");
        assert_eq!(staff.role, Role::PlacementTeam);
        assert_eq!(staff.name, "Jane Smith");
        assert_eq!(staff.location, "Hyderabad");
    }

    #[tokio::test(start_paused = true)]
    async fn completes_only_after_latency_and_blocks_reentry() {
        let provider = Arc::new(SimulatedAuthProvider::new(Duration::from_millis(1500)));
        let (login, _) = workflow(provider);

        let pending = {
            let login = login.clone();
            tokio::spawn(async move {
                login
                    .sign_in(Credentials::new("a@b.c", "x"), Role::Student)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(1_400)).await;
        assert!(!pending.is_finished());
        assert!(login.is_busy());
        assert_eq!(
            login
                .sign_in(Credentials::default(), Role::PlacementTeam)
                .await,
            Err(LoginError::Busy)
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        let user = pending.await.expect("task joins").expect("sign-in succeeds");
        assert_eq!(user.role, Role::Student);
        assert!(!login.is_busy());
    }

    #[tokio::test]
    async fn failure_clears_busy_and_publishes_notice() {
        let (login, notices) = workflow(Arc::new(RejectingProvider));

        let err = login
            .sign_in(Credentials::new("a@b.c", "wrong"), Role::Student)
            .await
            .expect_err("provider rejects");
        assert_eq!(
            err,
            LoginError::Authentication(AuthenticationError::InvalidCredentials)
        );
        assert!(!login.is_busy());

        let events = notices.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NoticeKind::Failure);
    }
}
