use metrics_exporter_prometheus::PrometheusHandle;
use placement_portal::config::{PortalTimings, SessionLimits};
use placement_portal::error::AppError;
use placement_portal::sequence::next_timestamp_id;
use placement_portal::session::{Credentials, Role};
use placement_portal::workflows::student::ResumeFile;
use placement_portal::{Portal, PortalServices};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) portals: PortalRegistry,
}

struct OpenPortal {
    portal: Arc<Portal>,
    last_seen: Instant,
}

/// Live portal sessions keyed by the id handed back on launch.
///
/// At most `limits.max_open` sessions are kept; sessions idle for `limits.idle_ttl` are
/// evicted on the next launch or sweep and can no longer be looked up.
#[derive(Clone)]
pub(crate) struct PortalRegistry {
    timings: PortalTimings,
    limits: SessionLimits,
    portals: Arc<Mutex<HashMap<String, OpenPortal>>>,
}

impl PortalRegistry {
    pub(crate) fn new(timings: PortalTimings, limits: SessionLimits) -> Self {
        Self {
            timings,
            limits,
            portals: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn launch(&self) -> Result<(String, Arc<Portal>), AppError> {
        let now = Instant::now();
        let mut guard = self.portals.lock().expect("portal registry mutex poisoned");
        evict_idle(&mut guard, now, self.limits.idle_ttl);
        if guard.len() >= self.limits.max_open {
            warn!(open = guard.len(), "portal session limit reached");
            return Err(AppError::SessionLimit { open: guard.len() });
        }

        let id = format!("portal-{}", next_timestamp_id());
        let services = PortalServices::simulated(&self.timings);
        let portal = Arc::new(Portal::launch(services, &self.timings));
        guard.insert(
            id.clone(),
            OpenPortal {
                portal: portal.clone(),
                last_seen: now,
            },
        );
        info!(session_id = %id, open = guard.len(), "portal session launched");
        Ok((id, portal))
    }

    /// Look up a session and mark it as used.
    pub(crate) fn get(&self, id: &str) -> Result<Arc<Portal>, AppError> {
        let now = Instant::now();
        let mut guard = self.portals.lock().expect("portal registry mutex poisoned");
        let expired = match guard.get_mut(id) {
            Some(open) if now.duration_since(open.last_seen) < self.limits.idle_ttl => {
                open.last_seen = now;
                return Ok(open.portal.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            guard.remove(id);
            debug!(session_id = %id, "idle portal session evicted");
        }
        Err(AppError::UnknownSession(id.to_string()))
    }

    /// Forget a session. Its timers stop once the last in-flight request releases it.
    pub(crate) fn close(&self, id: &str) -> Result<(), AppError> {
        let removed = self
            .portals
            .lock()
            .expect("portal registry mutex poisoned")
            .remove(id);
        match removed {
            Some(_) => {
                info!(session_id = %id, "portal session closed");
                Ok(())
            }
            None => Err(AppError::UnknownSession(id.to_string())),
        }
    }

    /// Drop every session idle past the TTL. Returns how many were evicted.
    pub(crate) fn sweep(&self) -> usize {
        let mut guard = self.portals.lock().expect("portal registry mutex poisoned");
        evict_idle(&mut guard, Instant::now(), self.limits.idle_ttl)
    }

    pub(crate) fn idle_ttl(&self) -> std::time::Duration {
        self.limits.idle_ttl
    }

    pub(crate) fn len(&self) -> usize {
        self.portals
            .lock()
            .expect("portal registry mutex poisoned")
            .len()
    }
}

fn evict_idle(
    portals: &mut HashMap<String, OpenPortal>,
    now: Instant,
    idle_ttl: std::time::Duration,
) -> usize {
    let before = portals.len();
    portals.retain(|_, open| now.duration_since(open.last_seen) < idle_ttl);
    let evicted = before - portals.len();
    if evicted > 0 {
        debug!(evicted, open = portals.len(), "idle portal sessions evicted");
    }
    evicted
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) password: String,
    pub(crate) role: Role,
}

impl LoginRequest {
    pub(crate) fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileSelectionRequest {
    #[serde(default)]
    pub(crate) file_name: String,
    #[serde(default)]
    pub(crate) media_type: Option<String>,
    #[serde(default)]
    pub(crate) size_bytes: u64,
}

impl From<FileSelectionRequest> for ResumeFile {
    fn from(value: FileSelectionRequest) -> Self {
        ResumeFile::new(value.file_name, value.media_type.as_deref(), value.size_bytes)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompanySelectionRequest {
    #[serde(default)]
    pub(crate) company_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PostingQuery {
    #[serde(default)]
    pub(crate) search: Option<String>,
}

/// Parse the CLI `--time-scale` flag.
pub(crate) fn parse_time_scale(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as a number ({err})"))?;
    PortalTimings::default()
        .scaled(value)
        .map(|_| value)
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    fn registry(idle_ttl: Duration, max_open: usize) -> PortalRegistry {
        PortalRegistry::new(
            PortalTimings::default(),
            SessionLimits { idle_ttl, max_open },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn registry_launches_and_closes_sessions() {
        let registry = registry(Duration::from_secs(60), 8);
        let (first, _) = registry.launch().expect("room for first");
        let (second, _) = registry.launch().expect("room for second");
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        registry.close(&first).expect("first session open");
        assert!(matches!(
            registry.get(&first),
            Err(AppError::UnknownSession(_))
        ));
        assert!(registry.close(&first).is_err());
        assert!(registry.get(&second).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn launch_refuses_past_the_open_session_cap() {
        let registry = registry(Duration::from_secs(60), 2);
        let (first, _) = registry.launch().expect("room for first");
        registry.launch().expect("room for second");

        assert!(matches!(
            registry.launch(),
            Err(AppError::SessionLimit { open: 2 })
        ));
        assert_eq!(registry.len(), 2);

        registry.close(&first).expect("first session open");
        registry.launch().expect("closing frees a slot");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_evicted_and_activity_keeps_them() {
        let registry = registry(Duration::from_secs(10), 2);
        let (active, _) = registry.launch().expect("room for active");
        let (idle, _) = registry.launch().expect("room for idle");

        sleep(Duration::from_secs(6)).await;
        registry.get(&active).expect("active still open");

        sleep(Duration::from_secs(6)).await;
        assert!(matches!(
            registry.get(&idle),
            Err(AppError::UnknownSession(_))
        ));
        assert_eq!(registry.len(), 1);

        // Full again, but the remaining session goes idle and makes room.
        registry.launch().expect("room after idle eviction");
        assert!(registry.launch().is_err());
        sleep(Duration::from_secs(11)).await;
        assert_eq!(registry.sweep(), 2);
        assert_eq!(registry.len(), 0);
        registry.launch().expect("room after sweep");
    }

    #[test]
    fn time_scale_rejects_negative_garbage_and_overflow() {
        assert_eq!(parse_time_scale("0.25"), Ok(0.25));
        assert_eq!(parse_time_scale("0"), Ok(0.0));
        assert!(parse_time_scale("-1").is_err());
        assert!(parse_time_scale("fast").is_err());
        assert!(parse_time_scale("1e30").is_err());
        assert!(parse_time_scale("inf").is_err());
    }

    #[test]
    fn file_selection_fields_default_when_absent() {
        let request: FileSelectionRequest =
            serde_json::from_str("{}").expect("empty selection parses");
        let file = ResumeFile::from(request);
        assert_eq!(file.name, "");
        assert_eq!(file.size_bytes, 0);
        assert!(file.validate().is_err());
    }
}
