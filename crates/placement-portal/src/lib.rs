//! Resume relevance placement portal.
//!
//! A portal session starts on a loading screen, moves to a role-based login, and then
//! opens either the student resume dashboard or the placement team posting dashboard.
//! Remote collaborators (identity, resume storage, scoring, job board) sit behind async
//! traits; the bundled implementations simulate them with fixed latencies.

pub mod config;
pub mod error;
pub mod notice;
pub mod portal;
pub mod sequence;
pub mod session;
pub mod tasks;
pub mod telemetry;
pub mod workflows;

pub use portal::{Dashboard, Portal, PortalError, PortalServices, PortalSnapshot};
