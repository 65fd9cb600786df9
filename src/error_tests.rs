use crate::error::ApiError;

#[test]
fn status_classification() {
    assert!(matches!(ApiError::from_status(400, "Missing required fields".into()), ApiError::Validation { .. }));
    assert!(matches!(ApiError::from_status(401, "no".into()), ApiError::Unauthorized { .. }));
    assert!(matches!(ApiError::from_status(403, "Forbidden".into()), ApiError::Forbidden { .. }));
    assert!(matches!(ApiError::from_status(404, "Course not found".into()), ApiError::NotFound { .. }));
    assert!(matches!(ApiError::from_status(409, "Already enrolled in this course".into()), ApiError::Conflict { .. }));
    assert!(matches!(ApiError::from_status(500, "boom".into()), ApiError::Server { .. }));
    assert!(matches!(ApiError::from_status(503, "down".into()), ApiError::Server { .. }));
}

#[test]
fn server_message_carried_verbatim() {
    let err = ApiError::from_status(400, "Course is at capacity".into());
    assert_eq!(err.message(), "Course is at capacity");
    assert_eq!(err.code_str(), "validation");
    assert_eq!(err.to_string(), "validation: Course is at capacity");
}

#[test]
fn session_expiry_is_only_unauthorized() {
    assert!(ApiError::from_status(401, "expired".into()).is_session_expiry());
    assert!(!ApiError::from_status(403, "forbidden".into()).is_session_expiry());
    assert!(!ApiError::network("network", "refused").is_session_expiry());
}
