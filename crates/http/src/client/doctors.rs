//! Doctor accounts

use medadmin_core::types::{Ack, Listing, UserProfile};
use medadmin_core::{DoctorApproval, ListQuery};
use serde::Serialize;

use super::request::ApiRequest;
use super::{ApiClient, ClientError, require};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalBody {
    approval_status: DoctorApproval,
}

impl ApiClient {
    /// One page of doctors; `query.status` filters by approval state
    pub async fn list_doctors(
        &self,
        query: &ListQuery,
    ) -> Result<Listing<UserProfile>, ClientError> {
        self.send(ApiRequest::get("/user/role/doctor").query(query.to_pairs())).await
    }

    pub async fn doctor(&self, id: &str) -> Result<UserProfile, ClientError> {
        require(id, "doctor id")?;
        self.send_data(ApiRequest::get(format!("/user/{id}"))).await
    }

    /// Approve or suspend a doctor's registration
    pub async fn set_doctor_approval(
        &self,
        id: &str,
        approval_status: DoctorApproval,
    ) -> Result<Ack, ClientError> {
        require(id, "doctor id")?;
        let req = ApiRequest::patch(format!("/user/doctor/{id}/approval"))
            .json(&ApprovalBody { approval_status })?;
        self.send(req).await
    }

    /// Partial profile update
    pub async fn update_doctor<B: Serialize + Sync>(
        &self,
        id: &str,
        changes: &B,
    ) -> Result<Ack, ClientError> {
        require(id, "doctor id")?;
        let req = ApiRequest::patch(format!("/user/doctor/{id}")).json(changes)?;
        self.send(req).await
    }

    pub async fn delete_doctor(&self, id: &str) -> Result<Ack, ClientError> {
        require(id, "doctor id")?;
        self.send(ApiRequest::delete(format!("/user/doctor/{id}"))).await
    }
}
