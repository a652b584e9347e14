//! Referral codes

use medadmin_core::ReferralStatus;
use medadmin_core::StatusFilter;
use medadmin_core::types::{Ack, Envelope, NewReferralCode, ReferralCode};
use serde::Serialize;

use super::request::ApiRequest;
use super::{ApiClient, ClientError, require};

#[derive(Serialize)]
struct ReferralChanges<'a> {
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveBody {
    is_active: bool,
}

/// Canonical form of a referral code: trimmed and upper-cased
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl ApiClient {
    /// All referral codes, optionally only active or inactive ones
    pub async fn referral_codes(
        &self,
        status: Option<ReferralStatus>,
    ) -> Result<Vec<ReferralCode>, ClientError> {
        let mut req = ApiRequest::get("/referral/get-referral-codes");
        if let Some(status) = status {
            req = req.query([("status", status.as_str())]);
        }
        let Envelope { data, .. } = self.send::<Envelope<Option<Vec<ReferralCode>>>>(req).await?;
        Ok(data.unwrap_or_default())
    }

    /// Create a code; it is normalized and must not be blank
    pub async fn create_referral_code(
        &self,
        code: &str,
        description: &str,
        is_active: bool,
    ) -> Result<Ack, ClientError> {
        require(code, "referral code")?;
        let body = NewReferralCode {
            code: normalize_code(code),
            description: description.trim().to_string(),
            is_active,
        };
        let req = ApiRequest::post("/referral/create-referral-code").json(&body)?;
        self.send(req).await
    }

    /// Edit a code's description, and its code while it has never been used
    pub async fn update_referral_code(
        &self,
        existing: &ReferralCode,
        code: &str,
        description: &str,
    ) -> Result<Ack, ClientError> {
        require(&existing.id, "referral code id")?;
        let code = (existing.usage_count() == 0 && !code.trim().is_empty())
            .then(|| normalize_code(code));
        let body = ReferralChanges {
            description: description.trim(),
            code,
        };
        let path = format!("/referral/update-referral-code/{}", existing.id);
        let req = ApiRequest::patch(path).json(&body)?;
        self.send(req).await
    }

    pub async fn set_referral_active(&self, id: &str, is_active: bool) -> Result<Ack, ClientError> {
        require(id, "referral code id")?;
        let req = ApiRequest::patch(format!("/referral/update-referral-code/{id}"))
            .json(&ActiveBody { is_active })?;
        self.send(req).await
    }

    pub async fn delete_referral_code(&self, id: &str) -> Result<Ack, ClientError> {
        require(id, "referral code id")?;
        self.send(ApiRequest::delete(format!("/referral/delete-referral-code/{id}"))).await
    }
}
