//! Authentication API client methods

use medadmin_core::SessionToken;
use medadmin_core::types::{Ack, AdminProfile, Envelope, LoginData};
use serde::Serialize;
use tracing::info;

use super::request::ApiRequest;
use super::{ApiClient, ClientError, require};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct OtpBody<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordBody<'a> {
    email: &'a str,
    otp: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

impl ApiClient {
    /// Sign in and start a new session
    ///
    /// Any previous session is replaced.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminProfile, ClientError> {
        require(email, "email")?;
        require(password, "password")?;

        let req = ApiRequest::post("/auth/login").json(&Credentials { email, password })?;
        let Envelope { data, .. }: Envelope<LoginData> = self.send_public(req).await?;

        let token = SessionToken::issue(
            data.user.id.clone(),
            data.access_token,
            data.refresh_token,
            self.clock().now(),
            self.session_config().max_age(),
        );
        self.store().set(token);

        let profile = AdminProfile::from(data.user);
        info!(user_id = %profile.id, "admin signed in");
        Ok(profile)
    }

    /// End the session and return to the login page
    pub fn logout(&self) {
        if let Some(token) = self.store().get() {
            info!(user_id = %token.user_id, "admin signed out");
        }
        self.store().clear();
        self.inner
            .navigator
            .navigate(&self.session_config().login_path);
    }

    /// Request a password reset email
    pub async fn forgot_password(&self, email: &str) -> Result<Ack, ClientError> {
        require(email, "email")?;
        let req = ApiRequest::post("/auth/forget").json(&EmailBody { email })?;
        self.send_public(req).await
    }

    /// Send a one-time password to `email`
    pub async fn send_otp(&self, email: &str) -> Result<Ack, ClientError> {
        require(email, "email")?;
        let req = ApiRequest::post("/auth/send-otp").json(&EmailBody { email })?;
        self.send_public(req).await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Ack, ClientError> {
        require(email, "email")?;
        require(otp, "otp")?;
        let req = ApiRequest::post("/auth/verify-otp").json(&OtpBody { email, otp })?;
        self.send_public(req).await
    }

    /// Set a new password using a verified one-time password
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        password: &str,
    ) -> Result<Ack, ClientError> {
        require(email, "email")?;
        require(otp, "otp")?;
        require(password, "password")?;
        let req = ApiRequest::post("/auth/reset-password").json(&ResetPasswordBody {
            email,
            otp,
            password,
        })?;
        self.send_public(req).await
    }

    /// Change the signed-in admin's password
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Ack, ClientError> {
        require(old_password, "old password")?;
        require(new_password, "new password")?;
        let req = ApiRequest::post("/auth/change-password").json(&ChangePasswordBody {
            old_password,
            new_password,
        })?;
        self.send(req).await
    }
}
