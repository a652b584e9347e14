//! Per-navigation session gate
//!
//! [`RouteGuard::decide`] is the pure rule: protected pages need a session,
//! public auth pages are pointless with one. [`route_guard_middleware`]
//! applies it to an axum router, verifying the session cookie through a
//! [`SessionVerifier`] because the page server cannot see the client's
//! token store.

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use medadmin_core::{SessionConfig, SessionError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Session cookie '{0}' missing")]
    MissingCookie(String),

    #[error("Session token has expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Session secret is not configured")]
    NotConfigured,
}

/// Which rule set a path falls under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteScope {
    /// Auth pages: login, password recovery
    Public,
    /// Dashboard pages
    Protected,
    /// Everything else
    Open,
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    login_path: String,
    dashboard_path: String,
    public_paths: Vec<String>,
    protected_paths: Vec<String>,
}

impl RouteGuard {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
            dashboard_path: config.dashboard_path.clone(),
            public_paths: config.public_paths.clone(),
            protected_paths: config.protected_paths.clone(),
        }
    }

    pub fn scope(&self, path: &str) -> RouteScope {
        if self.protected_paths.iter().any(|p| under(path, p)) {
            RouteScope::Protected
        } else if self.public_paths.iter().any(|p| under(path, p)) {
            RouteScope::Public
        } else {
            RouteScope::Open
        }
    }

    /// Decide what happens to a navigation to `path`
    pub fn decide(&self, path: &str, has_session: bool) -> GuardDecision {
        match (self.scope(path), has_session) {
            (RouteScope::Protected, false) => GuardDecision::Redirect(self.login_path.clone()),
            (RouteScope::Public, true) => GuardDecision::Redirect(self.dashboard_path.clone()),
            _ => GuardDecision::Pass,
        }
    }
}

/// `path` equals `prefix` or lies below it
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'))
}

/// Claims of the identity provider's session JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Backend user id
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Set when the provider failed to renew the backend token
    #[serde(default)]
    pub error: Option<SessionError>,
}

impl SessionClaims {
    /// Whether these claims stand for a usable session
    pub const fn is_active(&self) -> bool {
        self.error.is_none()
    }
}

/// Reads and verifies the session carried by an incoming request
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, parts: &Parts) -> Result<SessionClaims, GuardError>;
}

/// HS256 JWT stored in a cookie
pub struct JwtSessionVerifier {
    cookie_name: String,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtSessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionVerifier")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl JwtSessionVerifier {
    pub fn new(cookie_name: impl Into<String>, secret: &str) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// # Errors
    ///
    /// Returns [`GuardError::NotConfigured`] when no secret is set.
    pub fn from_config(config: &SessionConfig) -> Result<Self, GuardError> {
        let secret = config
            .secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or(GuardError::NotConfigured)?;
        Ok(Self::new(config.cookie_name.clone(), secret))
    }

    /// Validate a raw token and extract its claims
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Expired`] or [`GuardError::InvalidToken`].
    pub fn validate(&self, token: &str) -> Result<SessionClaims, GuardError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => GuardError::Expired,
                _ => GuardError::InvalidToken(e.to_string()),
            })
    }
}

#[async_trait]
impl SessionVerifier for JwtSessionVerifier {
    async fn verify(&self, parts: &Parts) -> Result<SessionClaims, GuardError> {
        let token = cookie_value(parts, &self.cookie_name)
            .ok_or_else(|| GuardError::MissingCookie(self.cookie_name.clone()))?;
        self.validate(&token)
    }
}

/// Value of cookie `name` across all `Cookie` headers, without surrounding quotes
pub fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(name)
        .map(Cookie::value_trimmed)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Router state for [`route_guard_middleware`]
#[derive(Clone)]
pub struct GuardState {
    pub guard: Arc<RouteGuard>,
    pub verifier: Arc<dyn SessionVerifier>,
}

impl GuardState {
    pub fn new(guard: RouteGuard, verifier: Arc<dyn SessionVerifier>) -> Self {
        Self {
            guard: Arc::new(guard),
            verifier,
        }
    }
}

/// Redirect per [`RouteGuard::decide`] with `303 See Other`
///
/// Verified claims are added to the request extensions of passing
/// requests.
pub async fn route_guard_middleware(
    State(state): State<GuardState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if state.guard.scope(&path) == RouteScope::Open {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let claims = match state.verifier.verify(&parts).await {
        Ok(claims) if claims.is_active() => Some(claims),
        Ok(claims) => {
            debug!(user_id = %claims.sub, error = ?claims.error, "session marked unusable");
            None
        }
        Err(e) => {
            debug!(%path, error = %e, "no verified session");
            None
        }
    };

    match state.guard.decide(&path, claims.is_some()) {
        GuardDecision::Pass => {
            if let Some(claims) = claims {
                parts.extensions.insert(claims);
            }
            next.run(Request::from_parts(parts, body)).await
        }
        GuardDecision::Redirect(location) => {
            debug!(%path, %location, "route guard redirect");
            Redirect::to(&location).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use http::StatusCode;
    use http::header::{COOKIE, LOCATION};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    fn guard() -> RouteGuard {
        RouteGuard::from_config(&SessionConfig::default())
    }

    fn token(exp_offset_secs: i64, error: Option<SessionError>) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "admin-1".to_string(),
            exp: now + exp_offset_secs,
            iat: Some(now),
            email: Some("admin@example.com".to_string()),
            name: Some("Ada Admin".to_string()),
            error,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn app() -> Router {
        let state = GuardState::new(
            guard(),
            Arc::new(JwtSessionVerifier::new("session-token", SECRET)),
        );
        Router::new()
            .route("/login", get(|| async { "login" }))
            .route("/dashboard", get(|| async { "dashboard" }))
            .route("/dashboard/doctors", get(|| async { "doctors" }))
            .route("/privacy-policy", get(|| async { "policy" }))
            .layer(axum::middleware::from_fn_with_state(
                state,
                route_guard_middleware,
            ))
    }

    fn request(path: &str, cookie: Option<String>) -> Request {
        let mut builder = http::Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, format!("theme=dark; session-token={cookie}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_decide() {
        let guard = guard();

        assert_eq!(
            guard.decide("/dashboard/doctors", false),
            GuardDecision::Redirect("/login".to_string())
        );
        assert_eq!(guard.decide("/dashboard", true), GuardDecision::Pass);
        assert_eq!(
            guard.decide("/verify-otp", true),
            GuardDecision::Redirect("/dashboard".to_string())
        );
        assert_eq!(guard.decide("/login", false), GuardDecision::Pass);
        assert_eq!(guard.decide("/privacy-policy", false), GuardDecision::Pass);
        assert_eq!(guard.decide("/privacy-policy", true), GuardDecision::Pass);
        assert_eq!(guard.scope("/dashboards"), RouteScope::Open);
        assert_eq!(guard.decide("/dashboards", false), GuardDecision::Pass);
        assert_eq!(guard.scope("/login/help"), RouteScope::Public);
    }

    fn parts_with(cookies: &[&str]) -> Parts {
        let mut builder = http::Request::builder().uri("/dashboard");
        for cookie in cookies {
            builder = builder.header(COOKIE, *cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_cookie_value_reads_quoted_and_split_headers() {
        let parts = parts_with(&[r#"session-token="abc.def.ghi""#]);
        assert_eq!(
            cookie_value(&parts, "session-token").as_deref(),
            Some("abc.def.ghi")
        );

        let parts = parts_with(&["theme=dark", "session-token=abc.def.ghi; lang=en"]);
        assert_eq!(
            cookie_value(&parts, "session-token").as_deref(),
            Some("abc.def.ghi")
        );

        let parts = parts_with(&["session-token=; theme=dark"]);
        assert_eq!(cookie_value(&parts, "session-token"), None);
        assert_eq!(cookie_value(&parts, "missing"), None);
    }

    #[test]
    fn test_validate_rejects_expired_and_foreign_tokens() {
        let verifier = JwtSessionVerifier::new("session-token", SECRET);

        let claims = verifier.validate(&token(3600, None)).unwrap();
        assert_eq!(claims.sub, "admin-1");
        assert!(claims.is_active());

        assert!(matches!(
            verifier.validate(&token(-3600, None)),
            Err(GuardError::Expired)
        ));

        let other = JwtSessionVerifier::new("session-token", "other-secret");
        assert!(matches!(
            other.validate(&token(3600, None)),
            Err(GuardError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_from_config_requires_secret() {
        let mut config = SessionConfig::default();
        assert!(matches!(
            JwtSessionVerifier::from_config(&config),
            Err(GuardError::NotConfigured)
        ));

        config.secret = Some(SECRET.to_string());
        assert!(JwtSessionVerifier::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_middleware_redirects_without_session() {
        let response = app()
            .oneshot(request("/dashboard/doctors", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_middleware_redirects_signed_in_user_away_from_login() {
        let response = app()
            .oneshot(request("/login", Some(token(3600, None))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/dashboard");
    }

    #[tokio::test]
    async fn test_middleware_passes_valid_session() {
        let response = app()
            .oneshot(request("/dashboard", Some(token(3600, None))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app()
            .oneshot(request("/privacy-policy", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_treats_failed_refresh_as_signed_out() {
        let cookie = token(3600, Some(SessionError::RefreshAccessTokenError));

        let response = app()
            .oneshot(request("/dashboard", Some(cookie.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app().oneshot(request("/login", Some(cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
