//! Screen navigation: start-up loader, sign-in, and the router that owns the session.

pub mod domain;
pub mod loader;
pub mod login;
pub mod router;

pub use domain::{Credentials, Role, Session, User, UserId};
pub use loader::{LoaderHandle, LoaderTick, LoadingSequence};
pub use login::{AuthProvider, AuthenticationError, LoginError, LoginWorkflow, SimulatedAuthProvider};
pub use router::{RouterState, ScreenRouter, TransitionError, View};
