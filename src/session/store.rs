use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::gateway::SessionGateway;
use crate::models::{Identity, LoginRequest, RegisterRequest, Role};

/// Where the session record is in its lifecycle. `Ready` means the startup
/// check has completed, with or without an identity; a failed check is folded
/// into `Ready` plus an empty identity rather than a dedicated error state,
/// since "not authenticated" is a normal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
}

/// Read-only view handed to the Access Guard and to pages. Pages never write
/// session state; the store's five operations are the only writers.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub identity: Option<Identity>,
    pub last_error: Option<ApiError>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    identity: Option<Identity>,
    last_error: Option<ApiError>,
}

/// In-memory session store. Generic over the gateway so tests can script the
/// remote side; production uses `HttpGateway`.
pub struct SessionStore<G> {
    gateway: G,
    state: RwLock<SessionState>,
    init_started: AtomicBool,
}

impl<G: SessionGateway> SessionStore<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: RwLock::new(SessionState {
                status: SessionStatus::Idle,
                identity: None,
                last_error: None,
            }),
            init_started: AtomicBool::new(false),
        }
    }

    /// The gateway handle, for callers that need non-identity operations
    /// (profile, course management) on the same cookie session.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.state.read();
        SessionSnapshot {
            status: s.status,
            identity: s.identity.clone(),
            last_error: s.last_error.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().identity.is_some()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.read().identity.clone()
    }

    pub fn last_error(&self) -> Option<ApiError> {
        self.state.read().last_error.clone()
    }

    /// Startup "who am I" check. Runs at most once per process; later calls
    /// return immediately. Any failure, including plain "not authenticated",
    /// lands in `Ready` with no identity and no surfaced error.
    pub async fn initialize(&self) {
        if self.init_started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state.write().status = SessionStatus::Loading;
        match self.gateway.check_session().await {
            Ok(identity) => {
                debug!(username = %identity.username, "session restored from cookie");
                let mut s = self.state.write();
                s.identity = Some(identity);
                s.status = SessionStatus::Ready;
            }
            Err(err) => {
                if !err.is_session_expiry() {
                    debug!(error = %err, "session check failed");
                }
                let mut s = self.state.write();
                s.identity = None;
                s.status = SessionStatus::Ready;
            }
        }
    }

    /// Fails closed: a rejected login never disturbs whoever was logged in
    /// before, and never partially admits the new user.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Identity> {
        let req = LoginRequest { username: username.to_string(), password: password.to_string() };
        match self.gateway.login(&req).await {
            Ok(identity) => {
                debug!(username = %identity.username, "login succeeded");
                let mut s = self.state.write();
                s.identity = Some(identity.clone());
                s.last_error = None;
                s.status = SessionStatus::Ready;
                Ok(identity)
            }
            Err(err) => {
                // Transport failures carry no server message; give the user the
                // generic line instead of connection internals.
                let surfaced = match &err {
                    ApiError::Network { .. } => {
                        debug!(error = %err, "login transport failure");
                        ApiError::network("network".to_string(), "Login failed".to_string())
                    }
                    _ => err,
                };
                self.state.write().last_error = Some(surfaced.clone());
                Err(surfaced)
            }
        }
    }

    /// Registration auto-establishes the session: the server sets cookies on
    /// the register response and returns the new identity, which is stored
    /// immediately.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> ApiResult<Identity> {
        let req = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        match self.gateway.register(&req).await {
            Ok(identity) => {
                debug!(username = %identity.username, "registered and logged in");
                let mut s = self.state.write();
                s.identity = Some(identity.clone());
                s.last_error = None;
                s.status = SessionStatus::Ready;
                Ok(identity)
            }
            Err(err) => {
                self.state.write().last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Client-state-authoritative: the local identity is discarded whether or
    /// not the server round trip succeeds.
    pub async fn logout(&self) {
        if let Err(err) = self.gateway.logout().await {
            debug!(error = %err, "remote logout failed; clearing local session anyway");
        }
        let mut s = self.state.write();
        s.identity = None;
        s.last_error = None;
        s.status = SessionStatus::Ready;
    }

    /// Reconcile the local identity with the server, e.g. after a profile
    /// edit. `Ok(Some)` carries the fresh identity; `Ok(None)` means the
    /// session expired server-side and was cleared locally (an expected
    /// outcome, not surfaced as an error); `Err` leaves the session untouched.
    pub async fn refresh(&self) -> ApiResult<Option<Identity>> {
        match self.gateway.check_session().await {
            Ok(identity) => {
                let mut s = self.state.write();
                s.identity = Some(identity.clone());
                s.status = SessionStatus::Ready;
                Ok(Some(identity))
            }
            Err(err) if err.is_session_expiry() => {
                debug!("session expired server-side; clearing identity");
                let mut s = self.state.write();
                s.identity = None;
                s.status = SessionStatus::Ready;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
