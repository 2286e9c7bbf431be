use super::*;
use crate::gate::classify::{PUBLIC_PATHS, classify};

fn decide_path(has_session: bool, path: &str) -> Decision {
    decide(has_session, classify(path), path)
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn public_paths_without_session_are_allowed() {
    for path in PUBLIC_PATHS {
        assert_eq!(decide_path(false, path), Decision::Allow, "{path}");
    }
}

#[test]
fn auth_screens_with_session_redirect_to_dashboard() {
    for path in ["/sign-in", "/sign-up"] {
        assert_eq!(decide_path(true, path), Decision::RedirectToDashboard, "{path}");
    }
}

#[test]
fn other_public_paths_with_session_are_allowed() {
    for path in ["/", "/sign-out", "/auth/callback"] {
        assert_eq!(decide_path(true, path), Decision::Allow, "{path}");
    }
}

#[test]
fn auth_api_is_allowed_regardless_of_session() {
    for path in ["/api/auth/callback", "/api/auth/sign-in", "/api/auth/refresh"] {
        assert_eq!(decide_path(false, path), Decision::Allow, "{path}");
        assert_eq!(decide_path(true, path), Decision::Allow, "{path}");
    }
}

#[test]
fn protected_without_session_redirects_to_sign_in() {
    for path in ["/dashboard", "/api/users/me", "/settings", "/api/auth"] {
        assert_eq!(decide_path(false, path), Decision::RedirectToSignIn, "{path}");
    }
}

#[test]
fn protected_with_session_is_allowed() {
    for path in ["/dashboard", "/api/users/me", "/settings"] {
        assert_eq!(decide_path(true, path), Decision::Allow, "{path}");
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenarios() {
    assert_eq!(decide_path(false, "/dashboard"), Decision::RedirectToSignIn);
    assert_eq!(decide_path(true, "/dashboard"), Decision::Allow);
    assert_eq!(decide_path(true, "/sign-in"), Decision::RedirectToDashboard);
    assert_eq!(decide_path(false, "/api/auth/callback"), Decision::Allow);
    assert_eq!(decide_path(false, "/"), Decision::Allow);
}

#[test]
fn locations() {
    assert_eq!(Decision::Allow.location(), None);
    assert_eq!(Decision::RedirectToDashboard.location(), Some("/dashboard"));
    assert_eq!(Decision::RedirectToSignIn.location(), Some("/sign-in"));
}
