//! Earnings reports

use medadmin_core::types::{DoctorEarnings, EarningsOverview, Listing};

use super::request::ApiRequest;
use super::{ApiClient, ClientError};

impl ApiClient {
    /// Platform-wide earnings with per-doctor rows
    pub async fn earnings_overview(&self) -> Result<EarningsOverview, ClientError> {
        self.send_data(ApiRequest::get("/appointment/earnings/overview")).await
    }

    pub async fn doctor_earnings(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Listing<DoctorEarnings>, ClientError> {
        let req = ApiRequest::get("/earnings/doctors").query([
            ("page", page.max(1).to_string()),
            ("limit", limit.max(1).to_string()),
        ]);
        self.send(req).await
    }
}
