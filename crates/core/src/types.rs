//! Wire models exchanged with the platform backend
//!
//! Backend documents carry their identifier as `_id`; `id` is accepted as
//! an alias. Fields the dashboard does not interpret are kept in `extra`
//! where a record is edited and sent back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::{AppointmentStatus, DoctorApproval, PatientStatus};

/// Standard response envelope `{ success, message, data }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Body of a mutation response; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

/// Pagination block of a list response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: u64,
}

/// Paged list body `{ data: [...], pagination: { total } }` or `{ data, total }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Listing<T> {
    /// Total number of rows across all pages
    pub fn total(&self) -> u64 {
        self.pagination
            .as_ref()
            .map(|p| p.total)
            .or(self.total)
            .unwrap_or(self.data.len() as u64)
    }
}

/// Profile picture reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    #[serde(default)]
    pub url: Option<String>,
}

/// Doctor or patient account as listed by the user endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    /// Patient account state (`active` or `block`)
    #[serde(default)]
    pub status: Option<String>,
    /// Doctor registration state
    #[serde(default)]
    pub approval_status: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub appointment_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Parsed doctor approval state; unknown values read as `None`
    pub fn approval(&self) -> Option<DoctorApproval> {
        self.approval_status.as_deref()?.parse().ok()
    }

    /// Parsed patient account state; unknown values read as `None`
    pub fn patient_status(&self) -> Option<PatientStatus> {
        self.status.as_deref()?.parse().ok()
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or_default()
    }
}

/// Nested party reference inside an appointment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRef {
    #[serde(default, rename = "_id", alias = "id")]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Consultation fee
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub patient: Option<PartyRef>,
    #[serde(default)]
    pub doctor: Option<PartyRef>,
    #[serde(default)]
    pub fees: Option<Fees>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appointment {
    /// Flat patient name, falling back to the nested patient record
    pub fn patient_display_name(&self) -> Option<&str> {
        self.patient_name
            .as_deref()
            .or_else(|| self.patient.as_ref()?.full_name.as_deref())
    }

    /// Flat doctor name, falling back to the nested doctor record
    pub fn doctor_display_name(&self) -> Option<&str> {
        self.doctor_name
            .as_deref()
            .or_else(|| self.doctor.as_ref()?.full_name.as_deref())
    }

    pub fn appointment_status(&self) -> Option<AppointmentStatus> {
        self.status.as_deref()?.to_lowercase().parse().ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.appointment_status() == Some(AppointmentStatus::Cancelled)
    }
}

/// Medical speciality category; wire names are snake case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub speciality_name: String,
    #[serde(default)]
    pub category_image_url: Option<String>,
    /// Whether the category is offered to patients
    #[serde(default)]
    pub status: Option<bool>,
}

impl Category {
    pub fn is_active(&self) -> bool {
        self.status.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCode {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub total_uses: Option<u64>,
    #[serde(default)]
    pub times_used: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ReferralCode {
    /// Number of redemptions, whichever counter the backend reports
    pub fn usage_count(&self) -> u64 {
        self.total_uses.or(self.times_used).unwrap_or(0)
    }

    /// Case-insensitive match over code and description
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.code.to_lowercase().contains(&term)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One page of notifications `{ items, pagination }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPage {
    #[serde(default)]
    pub items: Vec<Notification>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl NotificationPage {
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }
}

/// Headline numbers for one account population
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupTotals {
    pub count: u64,
    pub weekly_new: u64,
    pub week_over_week_change_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewTotals {
    pub patients: SignupTotals,
    pub doctors: SignupTotals,
}

/// One point of the weekly signup series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupDay {
    pub label: String,
    pub patients: u64,
    pub doctors: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklySignups {
    pub days: Vec<SignupDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardOverview {
    pub totals: OverviewTotals,
    pub weekly_signups: WeeklySignups,
}

impl DashboardOverview {
    /// Accounts created this week across both populations
    pub const fn new_this_week(&self) -> u64 {
        self.totals.patients.weekly_new + self.totals.doctors.weekly_new
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorEarnings {
    pub doctor_name: String,
    pub specialty: Option<String>,
    pub appointments: u64,
    pub earnings: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EarningsOverview {
    pub total_earnings: f64,
    pub total_appointments: u64,
    pub avg_per_doctor: f64,
    pub doctors: Vec<DoctorEarnings>,
}

/// User block of a login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// `data` of a login response
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: LoginUser,
}

impl std::fmt::Debug for LoginData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginData")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Signed-in administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
    pub image: Option<String>,
}

impl From<LoginUser> for AdminProfile {
    fn from(user: LoginUser) -> Self {
        let name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            id: user.id,
            email: user.email,
            name,
            image: user.profile_image,
        }
    }
}

/// Fields sent when creating a referral code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReferralCode {
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
}
