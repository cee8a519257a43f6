use serde::Serialize;
use tracing::{debug, info};

use super::domain::{Role, Session, User};

/// Top-level screen currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Loading,
    Login,
    StudentDashboard,
    PlacementDashboard,
}

impl View {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Student => View::StudentDashboard,
            Role::PlacementTeam => View::PlacementDashboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterState {
    Loading,
    LoginPending { last_error: Option<String> },
    Authenticated(Session),
}

/// Signal that arrived while the router was in a state that does not accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply `{signal}` while the {view:?} screen is shown")]
pub struct TransitionError {
    pub signal: &'static str,
    pub view: View,
}

/// Finite-state controller selecting the visible screen and owning the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenRouter {
    state: RouterState,
}

impl Default for ScreenRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenRouter {
    pub fn new() -> Self {
        Self {
            state: RouterState::Loading,
        }
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn view(&self) -> View {
        match &self.state {
            RouterState::Loading => View::Loading,
            RouterState::LoginPending { .. } => View::Login,
            RouterState::Authenticated(session) => View::for_role(session.role()),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            RouterState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Error recorded by the most recent failed sign-in, if any.
    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            RouterState::LoginPending { last_error } => last_error.as_deref(),
            _ => None,
        }
    }

    pub fn loader_completed(&mut self) -> Result<View, TransitionError> {
        self.expect(View::Loading, "loader_completed")?;
        self.state = RouterState::LoginPending { last_error: None };
        debug!("loader finished, showing login");
        Ok(View::Login)
    }

    pub fn login_succeeded(&mut self, user: User) -> Result<View, TransitionError> {
        self.expect(View::Login, "login_succeeded")?;
        info!(user_id = %user.id.0, role = %user.role, "session started");
        let view = View::for_role(user.role);
        self.state = RouterState::Authenticated(Session::new(user));
        Ok(view)
    }

    pub fn login_failed(&mut self, reason: impl Into<String>) -> Result<(), TransitionError> {
        self.expect(View::Login, "login_failed")?;
        self.state = RouterState::LoginPending {
            last_error: Some(reason.into()),
        };
        Ok(())
    }

    /// Leave the dashboard, discarding the session and returning its user.
    pub fn logout(&mut self) -> Result<User, TransitionError> {
        let view = self.view();
        let previous = std::mem::replace(
            &mut self.state,
            RouterState::LoginPending { last_error: None },
        );
        match previous {
            RouterState::Authenticated(session) => {
                info!(user_id = %session.user.id.0, "session ended");
                Ok(session.user)
            }
            other => {
                self.state = other;
                Err(TransitionError {
                    signal: "logout",
                    view,
                })
            }
        }
    }

    fn expect(&self, wanted: View, signal: &'static str) -> Result<(), TransitionError> {
        let view = self.view();
        if view == wanted {
            Ok(())
        } else {
            Err(TransitionError { signal, view })
        }
    }
}
