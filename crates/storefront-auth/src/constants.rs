//! Storefront auth endpoint paths
//!
//! Paths are relative to the configured API base URL. The exempt list keeps
//! the refresh protocol away from the endpoints that mint or revoke
//! credentials: an authentication failure there must fail directly to the
//! caller instead of triggering another refresh.

/// Token refresh endpoint (no request body; credential travels as bearer
/// authorization or an out-of-band cookie)
pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// Login endpoint (email + password JSON body)
pub const LOGIN_PATH: &str = "/auth/login";

/// Logout endpoint (best-effort, fire-and-forget)
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Authenticated user lookup
pub const AUTH_USER_PATH: &str = "/auth/auth-user";

/// Endpoints never subject to refresh-and-retry.
pub const REFRESH_EXEMPT_PATHS: [&str; 3] = [REFRESH_PATH, LOGIN_PATH, LOGOUT_PATH];

/// True when `url` targets an endpoint exempt from the refresh protocol.
///
/// Substring match, so absolute URLs, bare paths, and paths with query
/// strings all qualify.
pub fn is_refresh_exempt(url: &str) -> bool {
    REFRESH_EXEMPT_PATHS.iter().any(|path| url.contains(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_are_exempt() {
        assert!(is_refresh_exempt("https://api.tee-shop.dev/auth/refresh-token"));
        assert!(is_refresh_exempt("/auth/login"));
        assert!(is_refresh_exempt("http://localhost:4000/auth/logout?next=/"));
    }

    #[test]
    fn other_endpoints_are_not_exempt() {
        assert!(!is_refresh_exempt("https://api.tee-shop.dev/auth/auth-user"));
        assert!(!is_refresh_exempt("https://api.tee-shop.dev/products/42"));
        assert!(!is_refresh_exempt("/cart"));
    }
}
