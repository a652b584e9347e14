//! Appointments

use medadmin_core::ListQuery;
use medadmin_core::types::{Ack, Appointment, Listing};
use serde::Serialize;
use serde_json::json;

use super::request::ApiRequest;
use super::{ApiClient, ClientError, require};

impl ApiClient {
    /// One page of appointments; `query.status` filters by lifecycle state
    pub async fn list_appointments(
        &self,
        query: &ListQuery,
    ) -> Result<Listing<Appointment>, ClientError> {
        self.send(ApiRequest::get("/appointment").query(query.to_pairs())).await
    }

    pub async fn appointment(&self, id: &str) -> Result<Appointment, ClientError> {
        require(id, "appointment id")?;
        self.send_data(ApiRequest::get(format!("/appointment/{id}"))).await
    }

    pub async fn update_appointment<B: Serialize + Sync>(
        &self,
        id: &str,
        changes: &B,
    ) -> Result<Ack, ClientError> {
        require(id, "appointment id")?;
        let req = ApiRequest::patch(format!("/appointment/{id}")).json(changes)?;
        self.send(req).await
    }

    pub async fn cancel_appointment(&self, id: &str) -> Result<Ack, ClientError> {
        require(id, "appointment id")?;
        let req = ApiRequest::patch(format!("/appointment/{id}/cancel")).json(&json!({}))?;
        self.send(req).await
    }
}
