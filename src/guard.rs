//! Access decisions for routed pages. Pure: reads a session snapshot and a
//! page's declared requirement, performs no I/O, and never mutates anything.

use crate::models::Role;
use crate::session::{SessionSnapshot, SessionStatus};

/// What a page declares about who may see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequirement {
    Public,
    RequiresAuth,
    RequiresRole(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Render,
    /// The startup session check has not completed; render a neutral loading
    /// view rather than flashing protected content or redirecting early.
    RenderLoading,
    RedirectTo(&'static str),
    /// Authenticated but lacking privilege. Visibly distinct from "not logged
    /// in": the user is told "forbidden", not sent to the login page.
    RenderForbidden,
}

pub const LOGIN_PATH: &str = "/login";

pub fn decide(session: &SessionSnapshot, requirement: PageRequirement) -> AccessDecision {
    // No decision other than "loading" until the startup check has resolved.
    if matches!(session.status, SessionStatus::Idle | SessionStatus::Loading) {
        return AccessDecision::RenderLoading;
    }
    match requirement {
        PageRequirement::Public => AccessDecision::Render,
        PageRequirement::RequiresAuth => match &session.identity {
            Some(_) => AccessDecision::Render,
            None => AccessDecision::RedirectTo(LOGIN_PATH),
        },
        PageRequirement::RequiresRole(role) => match &session.identity {
            None => AccessDecision::RedirectTo(LOGIN_PATH),
            Some(id) if id.role == role => AccessDecision::Render,
            Some(_) => AccessDecision::RenderForbidden,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identity, Profile};

    fn snap(status: SessionStatus, role: Option<Role>) -> SessionSnapshot {
        let stamp = chrono::NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        SessionSnapshot {
            status,
            identity: role.map(|r| Identity {
                id: 1,
                username: "u".into(),
                email: "u@example.edu".into(),
                role: r,
                created_at: stamp,
                updated_at: stamp,
                profile: Profile::default(),
            }),
            last_error: None,
        }
    }

    #[test]
    fn loading_never_decides() {
        for req in [
            PageRequirement::Public,
            PageRequirement::RequiresAuth,
            PageRequirement::RequiresRole(Role::Admin),
        ] {
            assert_eq!(decide(&snap(SessionStatus::Loading, None), req), AccessDecision::RenderLoading);
            assert_eq!(decide(&snap(SessionStatus::Idle, None), req), AccessDecision::RenderLoading);
        }
    }

    #[test]
    fn public_renders_for_everyone() {
        assert_eq!(decide(&snap(SessionStatus::Ready, None), PageRequirement::Public), AccessDecision::Render);
        assert_eq!(
            decide(&snap(SessionStatus::Ready, Some(Role::Student)), PageRequirement::Public),
            AccessDecision::Render
        );
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        assert_eq!(
            decide(&snap(SessionStatus::Ready, None), PageRequirement::RequiresAuth),
            AccessDecision::RedirectTo("/login")
        );
        assert_eq!(
            decide(&snap(SessionStatus::Ready, None), PageRequirement::RequiresRole(Role::Admin)),
            AccessDecision::RedirectTo("/login")
        );
    }

    #[test]
    fn wrong_role_is_forbidden_never_redirected() {
        let student = snap(SessionStatus::Ready, Some(Role::Student));
        assert_eq!(
            decide(&student, PageRequirement::RequiresRole(Role::Admin)),
            AccessDecision::RenderForbidden
        );
        let teacher = snap(SessionStatus::Ready, Some(Role::Teacher));
        assert_eq!(
            decide(&teacher, PageRequirement::RequiresRole(Role::Admin)),
            AccessDecision::RenderForbidden
        );
    }

    #[test]
    fn matching_role_renders() {
        let admin = snap(SessionStatus::Ready, Some(Role::Admin));
        assert_eq!(decide(&admin, PageRequirement::RequiresRole(Role::Admin)), AccessDecision::Render);
        assert_eq!(decide(&admin, PageRequirement::RequiresAuth), AccessDecision::Render);
    }
}
