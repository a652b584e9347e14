//! List query parameters and per-resource status filters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default page size used by every dashboard table
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A status value that can be sent as the `status` query parameter
pub trait StatusFilter {
    /// Wire representation
    fn as_str(&self) -> &'static str;
}

macro_rules! status_filter {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl StatusFilter for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(crate::CoreError::validation(format!(
                        concat!("unknown ", stringify!($name), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

status_filter! {
    /// Registration approval state of a doctor
    DoctorApproval {
        Pending => "pending",
        Approved => "approved",
        Suspended => "suspended",
    }
}

status_filter! {
    /// Account state of a patient
    PatientStatus {
        Active => "active",
        /// Blocked by an administrator
        Blocked => "block",
    }
}

status_filter! {
    /// Lifecycle state of an appointment
    AppointmentStatus {
        Pending => "pending",
        /// Confirmed by the doctor
        Confirmed => "appoint",
        Rescheduled => "reschedule",
        Cancelled => "cancelled",
    }
}

status_filter! {
    /// Activation state of a referral code
    ReferralStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// Pagination, search and status parameters of a list request
///
/// Changing the search term or the status filter sends the view back to
/// the first page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListQuery {
    page: u32,
    page_size: u32,
    search: Option<String>,
    status: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    /// Query for `page` with `page_size` rows; both are clamped to at least 1
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            search: None,
            status: None,
        }
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Move to `page` (at least 1)
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.set_page(page);
        self
    }

    /// Set the search term; an empty term clears it
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.set_search(search);
        self
    }

    /// Set or clear the status filter
    #[must_use]
    pub fn with_status<S: StatusFilter>(mut self, status: Option<S>) -> Self {
        self.set_status(status);
        self
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        let search = (!search.is_empty()).then_some(search);
        if search != self.search {
            self.search = search;
            self.page = 1;
        }
    }

    pub fn set_status<S: StatusFilter>(&mut self, status: Option<S>) {
        let status = status.map(|s| s.as_str().to_string());
        if status != self.status {
            self.status = status;
            self.page = 1;
        }
    }

    /// Query string pairs; absent search/status are omitted
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}

/// Number of pages needed for `total` rows
pub const fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64)
}
