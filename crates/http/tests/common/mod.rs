//! Shared fixtures for the client integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use medadmin_core::{Clock, SessionConfig, SessionToken};
use medadmin_http::{ApiClient, MemoryTokenStore, Navigator, TokenStore};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Login instant used by the session scenarios
pub fn login_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

/// Navigator that records every redirect
#[derive(Default)]
pub struct RecordingNavigator {
    pub visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: &str) {
        self.visited.lock().unwrap().push(location.to_string());
    }
}

pub fn login_response(access: &str, refresh: Option<&str>) -> Value {
    let mut data = json!({
        "accessToken": access,
        "user": {
            "_id": "admin-1",
            "email": "admin@example.com",
            "firstName": "Ada",
            "lastName": "Admin",
            "profileImage": "https://cdn.example.com/ada.png"
        }
    });
    if let Some(refresh) = refresh {
        data["refreshToken"] = json!(refresh);
    }
    json!({ "success": true, "message": "Login successful", "data": data })
}

pub fn refresh_response(access: &str) -> Value {
    json!({ "success": true, "data": { "accessToken": access } })
}

pub fn overview_response() -> Value {
    json!({
        "success": true,
        "data": {
            "totals": {
                "patients": { "count": 120, "weeklyNew": 8, "weekOverWeekChangePct": 12.5 },
                "doctors": { "count": 30, "weeklyNew": 2, "weekOverWeekChangePct": -3.0 }
            },
            "weeklySignups": {
                "days": [
                    { "label": "Mon", "patients": 3, "doctors": 1 },
                    { "label": "Tue", "patients": 5, "doctors": 1 }
                ]
            }
        }
    })
}

/// Client against `server` with a controllable clock
pub fn client_with(
    server: &MockServer,
    clock: Arc<ManualClock>,
    navigator: Arc<dyn Navigator>,
    session: SessionConfig,
) -> ApiClient {
    ApiClient::builder()
        .base_url(server.uri())
        .clock(clock)
        .navigator(navigator)
        .session_config(session)
        .build()
        .unwrap()
}

/// Client already holding a fresh session with access token `A1`
pub fn signed_in_client(server: &MockServer) -> ApiClient {
    let token = SessionToken::issue(
        "admin-1",
        "A1",
        Some("R1".to_string()),
        Utc::now(),
        Duration::hours(24),
    );
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(token));
    ApiClient::builder()
        .base_url(server.uri())
        .store(store)
        .navigator(Arc::new(RecordingNavigator::default()))
        .build()
        .unwrap()
}
