//! Per-page view-models reconciling fetched course/enrollment lists with
//! user-initiated optimistic actions. Both boards share one per-item state
//! machine and the same stale-completion guard; the server remains the only
//! source of truth for capacity and enrolled counts.

mod board;
mod dashboard;

pub use board::{CourseBoard, EnrollOutcome};
pub use dashboard::{EnrollmentBoard, UnenrollOutcome};


/// Lifecycle of one item's in-flight action. `Busy` disables exactly that
/// item's control; other items stay independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemPhase {
    #[default]
    Idle,
    Busy,
    /// Server confirmed the optimistic action.
    Confirmed,
    /// Server rejected it; the list was left untouched.
    RolledBack,
}

/// Explicit gate for destructive actions. The request is only issued on `Yes`;
/// the view-model enforces this regardless of what the UI asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Yes,
    No,
}
