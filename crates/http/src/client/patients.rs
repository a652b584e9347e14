//! Patient accounts

use medadmin_core::types::{Ack, Listing, UserProfile};
use medadmin_core::{ListQuery, PatientStatus};
use serde::Serialize;

use super::request::ApiRequest;
use super::{ApiClient, ClientError, require};

#[derive(Serialize)]
struct StatusBody {
    status: PatientStatus,
}

impl ApiClient {
    pub async fn list_patients(
        &self,
        query: &ListQuery,
    ) -> Result<Listing<UserProfile>, ClientError> {
        self.send(ApiRequest::get("/user/role/patient").query(query.to_pairs())).await
    }

    pub async fn patient(&self, id: &str) -> Result<UserProfile, ClientError> {
        require(id, "patient id")?;
        self.send_data(ApiRequest::get(format!("/user/{id}"))).await
    }

    /// Block or reactivate a patient
    pub async fn set_patient_status(
        &self,
        id: &str,
        status: PatientStatus,
    ) -> Result<Ack, ClientError> {
        self.update_patient(id, &StatusBody { status }).await
    }

    pub async fn update_patient<B: Serialize + Sync>(
        &self,
        id: &str,
        changes: &B,
    ) -> Result<Ack, ClientError> {
        require(id, "patient id")?;
        let req = ApiRequest::patch(format!("/user/patient/{id}")).json(changes)?;
        self.send(req).await
    }

    pub async fn delete_patient(&self, id: &str) -> Result<Ack, ClientError> {
        require(id, "patient id")?;
        self.send(ApiRequest::delete(format!("/user/patient/{id}"))).await
    }
}
