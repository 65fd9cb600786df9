use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use tokio::sync::Notify;

use coursedesk::enrollment::{Confirm, CourseBoard, EnrollOutcome, EnrollmentBoard, ItemPhase, UnenrollOutcome};
use coursedesk::error::{ApiError, ApiResult};
use coursedesk::gateway::EnrollmentGateway;
use coursedesk::models::{Course, Enrollment, EnrollmentStatus};

// Scripted catalog backend shared between a courses board and a dashboard,
// like the real HTTP gateway is. Optional gates let a test hold a response
// open while it issues more calls.
#[derive(Default)]
struct Inner {
    courses: Mutex<VecDeque<ApiResult<Vec<Course>>>>,
    enrollments: Mutex<VecDeque<ApiResult<Vec<Enrollment>>>>,
    enrolls: Mutex<VecDeque<ApiResult<Enrollment>>>,
    unenrolls: Mutex<VecDeque<ApiResult<()>>>,
    calls: Mutex<Vec<String>>,
    enroll_gate: Option<Arc<Notify>>,
    list_gate: Option<Arc<Notify>>,
}

#[derive(Clone, Default)]
struct ScriptedCatalog(Arc<Inner>);

impl ScriptedCatalog {
    fn calls(&self) -> Vec<String> {
        self.0.calls.lock().clone()
    }

    fn pop<T>(queue: &Mutex<VecDeque<ApiResult<T>>>, op: &str) -> ApiResult<T> {
        queue.lock().pop_front().unwrap_or_else(|| panic!("no scripted response for {}", op))
    }
}

impl EnrollmentGateway for ScriptedCatalog {
    fn list_courses(&self) -> impl Future<Output = ApiResult<Vec<Course>>> + Send {
        self.0.calls.lock().push("list_courses".to_string());
        let resp = Self::pop(&self.0.courses, "list_courses");
        let gate = self.0.list_gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            resp
        }
    }

    fn my_enrollments(&self) -> impl Future<Output = ApiResult<Vec<Enrollment>>> + Send {
        self.0.calls.lock().push("my_enrollments".to_string());
        let resp = Self::pop(&self.0.enrollments, "my_enrollments");
        async move { resp }
    }

    fn enroll(&self, course_id: i64) -> impl Future<Output = ApiResult<Enrollment>> + Send {
        self.0.calls.lock().push(format!("enroll:{}", course_id));
        let resp = Self::pop(&self.0.enrolls, "enroll");
        let gate = self.0.enroll_gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            resp
        }
    }

    fn unenroll(&self, enrollment_id: i64) -> impl Future<Output = ApiResult<()>> + Send {
        self.0.calls.lock().push(format!("unenroll:{}", enrollment_id));
        let resp = Self::pop(&self.0.unenrolls, "unenroll");
        async move { resp }
    }
}

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

fn course(id: i64, title: &str) -> Course {
    Course {
        id,
        title: title.to_string(),
        description: None,
        instructor_id: 1,
        instructor: Some("prof_smith".to_string()),
        credits: 3,
        capacity: 30,
        enrolled_count: 12,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

fn enrollment(id: i64, course_id: i64, status: EnrollmentStatus) -> Enrollment {
    Enrollment {
        id,
        student_id: 3,
        course_id,
        course: Some(course(course_id, "Algorithms")),
        status,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

// Full happy path over one shared backend: browse, enroll, then see the
// enrollment on the dashboard and leave it again.
#[tokio::test]
async fn browse_enroll_then_unenroll_round_trip() {
    let api = ScriptedCatalog::default();
    api.0.courses.lock().push_back(Ok(vec![course(10, "Algorithms"), course(11, "Databases")]));
    api.0.enrolls.lock().push_back(Ok(enrollment(5, 10, EnrollmentStatus::Enrolled)));
    api.0.enrollments.lock().push_back(Ok(vec![enrollment(5, 10, EnrollmentStatus::Enrolled)]));
    api.0.unenrolls.lock().push_back(Ok(()));

    let courses = CourseBoard::new(api.clone());
    let dashboard = EnrollmentBoard::new(api.clone());

    courses.load().await;
    assert_eq!(courses.courses().len(), 2);

    match courses.enroll(10).await {
        EnrollOutcome::Enrolled(e) => assert_eq!(e.course_id, 10),
        other => panic!("expected enrollment, got {:?}", other),
    }
    assert_eq!(courses.phase(10), ItemPhase::Confirmed);

    dashboard.load().await;
    assert_eq!(dashboard.count_with_status(EnrollmentStatus::Enrolled), 1);

    assert_eq!(dashboard.unenroll(5, Confirm::Yes).await, UnenrollOutcome::Removed);
    assert!(dashboard.enrollments().is_empty());

    // The removal was applied locally from the confirmed response, not by
    // re-fetching the list.
    assert_eq!(
        api.calls(),
        vec!["list_courses", "enroll:10", "my_enrollments", "unenroll:5"]
    );
}

#[tokio::test]
async fn failed_reload_keeps_last_good_catalog() {
    let api = ScriptedCatalog::default();
    api.0.courses.lock().push_back(Ok(vec![course(10, "Algorithms")]));
    api.0.courses.lock().push_back(Err(ApiError::server("http_500", "Internal Server Error")));

    let board = CourseBoard::new(api);
    board.load().await;
    board.load().await;

    assert_eq!(board.courses().len(), 1, "stale data beats no data");
    assert!(board.loaded());
    assert_eq!(board.page_error().map(|e| e.message().to_string()), Some("Internal Server Error".to_string()));
}

#[tokio::test]
async fn full_course_conflict_stays_on_the_row() {
    let api = ScriptedCatalog::default();
    api.0.courses.lock().push_back(Ok(vec![course(10, "Algorithms"), course(11, "Databases")]));
    api.0.enrolls.lock().push_back(Err(ApiError::conflict("conflict", "Course is full")));

    let board = CourseBoard::new(api);
    board.load().await;

    match board.enroll(10).await {
        EnrollOutcome::Failed(err) => assert_eq!(err.message(), "Course is full"),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(board.phase(10), ItemPhase::RolledBack);
    assert_eq!(board.item_error(10).map(|e| e.message().to_string()), Some("Course is full".to_string()));
    // The neighbouring course is untouched.
    assert_eq!(board.phase(11), ItemPhase::Idle);
    assert!(board.item_error(11).is_none());
}

// Leaving the page while an enroll is in flight: the late response must not
// resurrect any per-item state on whatever the board shows next.
#[tokio::test]
async fn response_arriving_after_leaving_the_page_is_discarded() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedCatalog(Arc::new(Inner {
        enroll_gate: Some(gate.clone()),
        ..Inner::default()
    }));
    api.0.courses.lock().push_back(Ok(vec![course(10, "Algorithms")]));
    api.0.enrolls.lock().push_back(Ok(enrollment(5, 10, EnrollmentStatus::Enrolled)));

    let board = CourseBoard::new(api);
    board.load().await;

    let (outcome, ()) = tokio::join!(board.enroll(10), async {
        board.detach();
        gate.notify_one();
    });

    assert_eq!(outcome, EnrollOutcome::Superseded);
    assert_eq!(board.phase(10), ItemPhase::Idle);
    assert!(board.item_error(10).is_none());
}

#[tokio::test]
async fn catalog_fetched_for_a_left_page_is_not_applied() {
    let gate = Arc::new(Notify::new());
    let api = ScriptedCatalog(Arc::new(Inner {
        list_gate: Some(gate.clone()),
        ..Inner::default()
    }));
    api.0.courses.lock().push_back(Ok(vec![course(10, "Algorithms")]));

    let board = CourseBoard::new(api);
    let ((), ()) = tokio::join!(board.load(), async {
        board.detach();
        gate.notify_one();
    });

    assert!(!board.loaded());
    assert!(board.courses().is_empty());
}

#[tokio::test]
async fn declining_the_confirmation_sends_nothing() {
    let api = ScriptedCatalog::default();
    api.0.enrollments.lock().push_back(Ok(vec![enrollment(5, 10, EnrollmentStatus::Enrolled)]));

    let dashboard = EnrollmentBoard::new(api.clone());
    dashboard.load().await;

    assert_eq!(dashboard.unenroll(5, Confirm::No).await, UnenrollOutcome::Declined);
    assert_eq!(dashboard.enrollments().len(), 1);
    assert_eq!(api.calls(), vec!["my_enrollments"]);
}

#[tokio::test]
async fn failed_unenroll_leaves_the_row_in_place() {
    let api = ScriptedCatalog::default();
    api.0.enrollments.lock().push_back(Ok(vec![enrollment(5, 10, EnrollmentStatus::Enrolled)]));
    api.0.unenrolls.lock().push_back(Err(ApiError::not_found("not_found", "Enrollment not found")));

    let dashboard = EnrollmentBoard::new(api);
    dashboard.load().await;

    match dashboard.unenroll(5, Confirm::Yes).await {
        UnenrollOutcome::Failed(err) => assert_eq!(err.message(), "Enrollment not found"),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(dashboard.enrollments().len(), 1);
    assert_eq!(dashboard.phase(5), ItemPhase::RolledBack);
}
