use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use super::ItemPhase;
use crate::error::ApiError;
use crate::gateway::EnrollmentGateway;
use crate::models::{Course, Enrollment};

/// Result of an enroll attempt as the page sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollOutcome {
    Enrolled(Enrollment),
    /// A request for this course is already in flight; nothing was sent.
    AlreadyPending,
    /// The page was left (board detached) before the response arrived; the
    /// response was discarded.
    Superseded,
    Failed(ApiError),
}

#[derive(Default)]
struct BoardState {
    courses: Vec<Course>,
    loaded: bool,
    page_error: Option<ApiError>,
    phases: HashMap<i64, ItemPhase>,
    item_errors: HashMap<i64, ApiError>,
}

/// Courses-page view-model: the catalog list plus per-course enroll state.
pub struct CourseBoard<G> {
    gateway: G,
    state: RwLock<BoardState>,
    // Bumped on detach; completions captured under an older epoch apply nothing.
    epoch: AtomicU64,
}

impl<G: EnrollmentGateway> CourseBoard<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway, state: RwLock::new(BoardState::default()), epoch: AtomicU64::new(0) }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn courses(&self) -> Vec<Course> {
        self.state.read().courses.clone()
    }

    pub fn loaded(&self) -> bool {
        self.state.read().loaded
    }

    pub fn page_error(&self) -> Option<ApiError> {
        self.state.read().page_error.clone()
    }

    pub fn phase(&self, course_id: i64) -> ItemPhase {
        self.state.read().phases.get(&course_id).copied().unwrap_or_default()
    }

    pub fn is_busy(&self, course_id: i64) -> bool {
        self.phase(course_id) == ItemPhase::Busy
    }

    pub fn item_error(&self, course_id: i64) -> Option<ApiError> {
        self.state.read().item_errors.get(&course_id).cloned()
    }

    /// Mark the page as left. In-flight completions for the old epoch become
    /// no-ops instead of stale overwrites.
    pub fn detach(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Fetch-and-replace. On failure the last successfully loaded list is
    /// retained and only the page-level error changes; a fresh successful load
    /// also resets per-item state, since the new snapshot supersedes it.
    pub async fn load(&self) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = self.gateway.list_courses().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("discarding course list fetched for a detached page");
            return;
        }
        let mut s = self.state.write();
        match result {
            Ok(list) => {
                s.courses = list;
                s.loaded = true;
                s.page_error = None;
                s.phases.clear();
                s.item_errors.clear();
            }
            Err(err) => {
                debug!(error = %err, "course list fetch failed; keeping last-known list");
                s.page_error = Some(err);
            }
        }
    }

    /// Optimistic enroll: the course goes Busy for the duration of the round
    /// trip, a second attempt on the same course is a no-op, and attempts on
    /// other courses are unaffected. Capacity races resolve server-side.
    pub async fn enroll(&self, course_id: i64) -> EnrollOutcome {
        {
            let mut s = self.state.write();
            if s.phases.get(&course_id) == Some(&ItemPhase::Busy) {
                return EnrollOutcome::AlreadyPending;
            }
            s.phases.insert(course_id, ItemPhase::Busy);
            s.item_errors.remove(&course_id);
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = self.gateway.enroll(course_id).await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            // Clear only this item's busy marker; everything else belongs to
            // whatever page is current now.
            self.state.write().phases.remove(&course_id);
            return EnrollOutcome::Superseded;
        }
        let mut s = self.state.write();
        match result {
            Ok(enrollment) => {
                s.phases.insert(course_id, ItemPhase::Confirmed);
                EnrollOutcome::Enrolled(enrollment)
            }
            Err(err) => {
                s.phases.insert(course_id, ItemPhase::RolledBack);
                s.item_errors.insert(course_id, err.clone());
                EnrollOutcome::Failed(err)
            }
        }
    }
}
