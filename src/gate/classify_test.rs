use super::*;

#[test]
fn every_public_path_is_public() {
    for path in PUBLIC_PATHS {
        assert_eq!(classify(path), RouteClass::Public, "{path}");
    }
}

#[test]
fn auth_api_prefix_wins() {
    assert_eq!(classify("/api/auth/callback"), RouteClass::AuthApi);
    assert_eq!(classify("/api/auth/sign-in"), RouteClass::AuthApi);
    assert_eq!(classify("/api/auth/"), RouteClass::AuthApi);
}

#[test]
fn auth_api_without_trailing_slash_is_protected() {
    assert_eq!(classify("/api/auth"), RouteClass::Protected);
}

#[test]
fn public_match_is_exact() {
    assert_eq!(classify("/sign-in/"), RouteClass::Protected);
    assert_eq!(classify("/sign-inx"), RouteClass::Protected);
    assert_eq!(classify("/auth/callback/extra"), RouteClass::Protected);
    assert_eq!(classify(""), RouteClass::Protected);
}

#[test]
fn everything_else_is_protected() {
    assert_eq!(classify("/dashboard"), RouteClass::Protected);
    assert_eq!(classify("/api/users/me"), RouteClass::Protected);
    assert_eq!(classify("/profile"), RouteClass::Protected);
}

#[test]
fn public_paths_do_not_overlap_auth_prefix() {
    for path in PUBLIC_PATHS {
        assert!(!path.starts_with(AUTH_API_PREFIX), "{path}");
    }
}

#[test]
fn classify_is_idempotent() {
    for path in ["/", "/dashboard", "/api/auth/refresh", "/sign-up", "/x/y"] {
        assert_eq!(classify(path), classify(path));
    }
}
