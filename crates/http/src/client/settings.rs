//! Application settings

use medadmin_core::types::Ack;

use super::request::ApiRequest;
use super::{ApiClient, ClientError};

impl ApiClient {
    /// Switch the referral programme on or off
    pub async fn toggle_referral_system(&self) -> Result<Ack, ClientError> {
        self.send(ApiRequest::patch("/app-setting/toggle-referral-system")).await
    }
}
