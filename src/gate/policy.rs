//! Redirect policy: turns session presence and route class into a decision.

use serde::Serialize;

use super::classify::RouteClass;

pub const DASHBOARD_PATH: &str = "/dashboard";
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Screens a signed-in visitor is bounced away from.
const AUTH_SCREENS: &[&str] = &["/sign-in", "/sign-up"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectToDashboard,
    RedirectToSignIn,
}

impl Decision {
    /// Redirect target, if the decision is a redirect.
    #[must_use]
    pub fn location(self) -> Option<&'static str> {
        match self {
            Self::Allow => None,
            Self::RedirectToDashboard => Some(DASHBOARD_PATH),
            Self::RedirectToSignIn => Some(SIGN_IN_PATH),
        }
    }
}

/// Rules are evaluated in order; the first match wins.
#[must_use]
pub fn decide(has_session: bool, class: RouteClass, path: &str) -> Decision {
    if has_session && AUTH_SCREENS.contains(&path) {
        return Decision::RedirectToDashboard;
    }
    match class {
        RouteClass::AuthApi | RouteClass::Public => Decision::Allow,
        RouteClass::Protected if !has_session => Decision::RedirectToSignIn,
        RouteClass::Protected => Decision::Allow,
    }
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
