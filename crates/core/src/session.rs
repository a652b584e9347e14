//! Session token model and lifecycle rules
//!
//! A [`SessionToken`] is created on login, replaced on every refresh and
//! dropped on logout. The transition helpers here are pure; storing the
//! result and sequencing refreshes is the HTTP client's job.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker recorded on a session whose token could not be renewed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum SessionError {
    /// The refresh endpoint rejected the refresh token or could not be reached
    #[error("RefreshAccessTokenError")]
    RefreshAccessTokenError,
    /// A refresh was due but the session holds no refresh token
    #[error("RefreshTokenMissing")]
    RefreshTokenMissing,
}

/// Lifecycle state of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Token present and outside the refresh window
    Valid,
    /// Token inside the refresh window, renewal due
    Expiring,
    /// A refresh call is in flight
    Refreshing,
    /// No usable token; only a new login leaves this state
    Invalid,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valid => "valid",
            Self::Expiring => "expiring",
            Self::Refreshing => "refreshing",
            Self::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

/// Access/refresh token pair of one authenticated admin
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    /// Backend identifier of the signed-in user
    pub user_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

// Tokens never end up in logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("user_id", &self.user_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("error", &self.error)
            .finish()
    }
}

impl SessionToken {
    /// Token issued by a successful login
    pub fn issue(
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: Some(access_token.into()),
            refresh_token,
            expires_at: now + max_age,
            error: None,
        }
    }

    /// Access token usable for an outgoing request, if any
    pub fn usable_access_token(&self) -> Option<&str> {
        match self.error {
            Some(_) => None,
            None => self.access_token.as_deref(),
        }
    }

    /// Whether the token sits inside the refresh window
    pub fn is_due(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now >= self.expires_at - window
    }

    /// Classify the token at `now`
    pub fn state(&self, now: DateTime<Utc>, window: Duration) -> SessionState {
        if self.usable_access_token().is_none() {
            SessionState::Invalid
        } else if self.is_due(now, window) {
            SessionState::Expiring
        } else {
            SessionState::Valid
        }
    }

    /// Successor token after a successful refresh
    ///
    /// The refresh token is kept unless the server rotated it. The new
    /// expiry is always strictly later than the current one.
    #[must_use]
    pub fn refreshed(
        &self,
        access_token: impl Into<String>,
        rotated_refresh_token: Option<String>,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Self {
        let expires_at = (now + max_age).max(self.expires_at + Duration::milliseconds(1));
        Self {
            user_id: self.user_id.clone(),
            access_token: Some(access_token.into()),
            refresh_token: rotated_refresh_token.or_else(|| self.refresh_token.clone()),
            expires_at,
            error: None,
        }
    }

    /// Successor token after an unrecoverable refresh failure
    #[must_use]
    pub fn invalidated(&self, marker: SessionError) -> Self {
        Self {
            user_id: self.user_id.clone(),
            access_token: None,
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
            error: Some(marker),
        }
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    fn token() -> SessionToken {
        SessionToken::issue(
            "admin-1",
            "A1",
            Some("R1".to_string()),
            start(),
            Duration::hours(24),
        )
    }

    #[test]
    fn test_issue_sets_expiry_from_max_age() {
        assert_eq!(token().expires_at, start() + Duration::hours(24));
        assert_eq!(token().usable_access_token(), Some("A1"));
    }

    #[test]
    fn test_state_transitions_at_window_boundary() {
        let token = token();
        let window = Duration::seconds(60);

        let before = start() + Duration::hours(24) - Duration::seconds(61);
        assert_eq!(token.state(before, window), SessionState::Valid);

        let boundary = start() + Duration::hours(24) - Duration::seconds(60);
        assert_eq!(token.state(boundary, window), SessionState::Expiring);

        let later = start() + Duration::hours(25);
        assert_eq!(token.state(later, window), SessionState::Expiring);
    }

    #[test]
    fn test_refreshed_keeps_refresh_token_unless_rotated() {
        let now = start() + Duration::hours(23) + Duration::minutes(59);
        let kept = token().refreshed("A2", None, now, Duration::hours(24));
        assert_eq!(kept.refresh_token.as_deref(), Some("R1"));

        let rotated = token().refreshed("A2", Some("R2".to_string()), now, Duration::hours(24));
        assert_eq!(rotated.refresh_token.as_deref(), Some("R2"));
        assert_eq!(rotated.expires_at, now + Duration::hours(24));
    }

    #[test]
    fn test_refreshed_expiry_strictly_increases_even_with_frozen_clock() {
        let mut current = token();
        let frozen = start();
        for i in 0..5 {
            let next = current.refreshed(format!("A{i}"), None, frozen, Duration::hours(24));
            assert!(next.expires_at > current.expires_at);
            current = next;
        }
    }

    #[test]
    fn test_refreshed_clears_error_marker() {
        let failed = token().invalidated(SessionError::RefreshAccessTokenError);
        let recovered = failed.refreshed("A2", None, start(), Duration::hours(24));
        assert_eq!(recovered.error, None);
        assert_eq!(recovered.usable_access_token(), Some("A2"));
    }

    #[test]
    fn test_invalidated_drops_access_token() {
        let failed = token().invalidated(SessionError::RefreshTokenMissing);
        assert_eq!(failed.access_token, None);
        assert_eq!(failed.error, Some(SessionError::RefreshTokenMissing));
        assert_eq!(
            failed.state(start(), Duration::seconds(60)),
            SessionState::Invalid
        );
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", token());
        assert!(!rendered.contains("A1"));
        assert!(!rendered.contains("R1"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_marker_wire_names() {
        assert_eq!(
            serde_json::to_string(&SessionError::RefreshTokenMissing).unwrap(),
            "\"RefreshTokenMissing\""
        );
        assert_eq!(
            SessionError::RefreshAccessTokenError.to_string(),
            "RefreshAccessTokenError"
        );
    }
}
