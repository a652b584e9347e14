//! medadmin core types and utilities

pub mod config;
pub mod error;
pub mod query;
pub mod session;
pub mod tracing;
pub mod types;

pub use crate::config::{ApiConfig, DashboardConfig, SessionConfig, SocketConfig};
pub use error::{CoreError, CoreResult};
pub use query::{
    AppointmentStatus, DEFAULT_PAGE_SIZE, DoctorApproval, ListQuery, PatientStatus,
    ReferralStatus, StatusFilter, total_pages,
};
pub use session::{Clock, SessionError, SessionState, SessionToken, SystemClock};
