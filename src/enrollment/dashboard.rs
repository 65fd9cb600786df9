use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use super::{Confirm, ItemPhase};
use crate::error::ApiError;
use crate::gateway::EnrollmentGateway;
use crate::models::{Enrollment, EnrollmentStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum UnenrollOutcome {
    /// Removed locally the moment the server confirmed; no re-fetch needed.
    Removed,
    /// The confirmation gate was not passed; no request was issued.
    Declined,
    /// A request for this enrollment is already in flight.
    AlreadyPending,
    /// Response arrived after the page was left; discarded.
    Superseded,
    Failed(ApiError),
}

#[derive(Default)]
struct DashState {
    enrollments: Vec<Enrollment>,
    loaded: bool,
    page_error: Option<ApiError>,
    phases: HashMap<i64, ItemPhase>,
    item_errors: HashMap<i64, ApiError>,
}

/// Dashboard view-model: the student's own enrollments with per-row unenroll
/// state. Must agree with what the Courses page would fetch after any
/// successful round trip.
pub struct EnrollmentBoard<G> {
    gateway: G,
    state: RwLock<DashState>,
    epoch: AtomicU64,
}

impl<G: EnrollmentGateway> EnrollmentBoard<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway, state: RwLock::new(DashState::default()), epoch: AtomicU64::new(0) }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn enrollments(&self) -> Vec<Enrollment> {
        self.state.read().enrollments.clone()
    }

    pub fn loaded(&self) -> bool {
        self.state.read().loaded
    }

    pub fn page_error(&self) -> Option<ApiError> {
        self.state.read().page_error.clone()
    }

    pub fn phase(&self, enrollment_id: i64) -> ItemPhase {
        self.state.read().phases.get(&enrollment_id).copied().unwrap_or_default()
    }

    pub fn item_error(&self, enrollment_id: i64) -> Option<ApiError> {
        self.state.read().item_errors.get(&enrollment_id).cloned()
    }

    /// Count of rows with the given status in the current snapshot. Display
    /// only; the server owns the real numbers.
    pub fn count_with_status(&self, status: EnrollmentStatus) -> usize {
        self.state.read().enrollments.iter().filter(|e| e.status == status).count()
    }

    pub fn detach(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn load(&self) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = self.gateway.my_enrollments().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("discarding enrollments fetched for a detached page");
            return;
        }
        let mut s = self.state.write();
        match result {
            Ok(list) => {
                s.enrollments = list;
                s.loaded = true;
                s.page_error = None;
                s.phases.clear();
                s.item_errors.clear();
            }
            Err(err) => {
                debug!(error = %err, "enrollment fetch failed; keeping last-known list");
                s.page_error = Some(err);
            }
        }
    }

    /// Destructive, so gated: without `Confirm::Yes` no request leaves the
    /// client. On success the row disappears locally at once; on failure the
    /// list is untouched and the error sits on the row.
    pub async fn unenroll(&self, enrollment_id: i64, confirm: Confirm) -> UnenrollOutcome {
        if confirm == Confirm::No {
            return UnenrollOutcome::Declined;
        }
        {
            let mut s = self.state.write();
            if s.phases.get(&enrollment_id) == Some(&ItemPhase::Busy) {
                return UnenrollOutcome::AlreadyPending;
            }
            s.phases.insert(enrollment_id, ItemPhase::Busy);
            s.item_errors.remove(&enrollment_id);
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = self.gateway.unenroll(enrollment_id).await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            self.state.write().phases.remove(&enrollment_id);
            return UnenrollOutcome::Superseded;
        }
        let mut s = self.state.write();
        match result {
            Ok(()) => {
                s.enrollments.retain(|e| e.id != enrollment_id);
                s.phases.remove(&enrollment_id);
                s.item_errors.remove(&enrollment_id);
                UnenrollOutcome::Removed
            }
            Err(err) => {
                s.phases.insert(enrollment_id, ItemPhase::RolledBack);
                s.item_errors.insert(enrollment_id, err.clone());
                UnenrollOutcome::Failed(err)
            }
        }
    }
}
