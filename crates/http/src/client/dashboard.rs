//! Dashboard overview

use medadmin_core::types::DashboardOverview;

use super::request::ApiRequest;
use super::{ApiClient, ClientError};

impl ApiClient {
    /// Signup totals and the weekly signup series
    pub async fn dashboard_overview(&self) -> Result<DashboardOverview, ClientError> {
        self.send_data(ApiRequest::get("/user/dashboard/overview")).await
    }
}
