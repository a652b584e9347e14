//! Notification inbox

use medadmin_core::types::{Ack, NotificationPage};

use super::request::ApiRequest;
use super::{ApiClient, ClientError, require};

/// Default page size of the notification dropdown
pub const NOTIFICATION_PAGE_SIZE: u32 = 20;

impl ApiClient {
    /// One page of notifications, optionally filtered by read state
    pub async fn notifications(
        &self,
        page: u32,
        limit: u32,
        is_read: Option<bool>,
    ) -> Result<NotificationPage, ClientError> {
        let mut req = ApiRequest::get("/notification").query([
            ("page", page.max(1).to_string()),
            ("limit", limit.max(1).to_string()),
        ]);
        if let Some(is_read) = is_read {
            req = req.query([("isRead", is_read.to_string())]);
        }
        self.send_data(req).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> Result<Ack, ClientError> {
        require(id, "notification id")?;
        self.send(ApiRequest::patch(format!("/notification/{id}/read"))).await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<Ack, ClientError> {
        self.send(ApiRequest::patch("/notification/read-all")).await
    }
}
