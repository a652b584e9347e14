//! Speciality categories
//!
//! Categories are created and edited as multipart forms so an image can
//! travel with the record. Status-only toggles use a JSON patch.

use medadmin_core::ListQuery;
use medadmin_core::types::{Ack, Category, Listing};
use serde::Serialize;

use super::request::{ApiRequest, FilePart, MultipartForm};
use super::{ApiClient, ClientError, require};

/// Editable fields of a category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub speciality_name: String,
    /// Only sent on update
    pub status: Option<bool>,
    pub image: Option<FilePart>,
}

impl CategoryForm {
    pub fn new(speciality_name: impl Into<String>) -> Self {
        Self {
            speciality_name: speciality_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_status(mut self, active: bool) -> Self {
        self.status = Some(active);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: FilePart) -> Self {
        self.image = Some(image);
        self
    }

    fn to_multipart(&self) -> Result<MultipartForm, ClientError> {
        require(&self.speciality_name, "speciality name")?;

        let mut form = MultipartForm::new().text("speciality_name", self.speciality_name.trim());
        if let Some(status) = self.status {
            form = form.text("status", status.to_string());
        }
        if let Some(image) = &self.image {
            form = form.file("category_image", image.clone());
        }
        Ok(form)
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: bool,
}

impl ApiClient {
    /// One page of categories, searchable by name
    pub async fn list_categories(
        &self,
        query: &ListQuery,
    ) -> Result<Listing<Category>, ClientError> {
        let pairs = query
            .to_pairs()
            .into_iter()
            .filter(|(key, _)| *key != "status");
        self.send(ApiRequest::get("/category/admin/all").query(pairs)).await
    }

    pub async fn category(&self, id: &str) -> Result<Category, ClientError> {
        require(id, "category id")?;
        self.send_data(ApiRequest::get(format!("/category/{id}"))).await
    }

    pub async fn create_category(&self, form: &CategoryForm) -> Result<Ack, ClientError> {
        // New categories never carry a status field.
        let form = CategoryForm {
            status: None,
            ..form.clone()
        }
        .to_multipart()?;
        self.send(ApiRequest::post("/category").multipart(form)).await
    }

    pub async fn update_category(
        &self,
        id: &str, form: &CategoryForm,
    ) -> Result<Ack, ClientError> {
        require(id, "category id")?;
        let form = form.to_multipart()?;
        self.send(ApiRequest::patch(format!("/category/{id}")).multipart(form)).await
    }

    /// Activate or deactivate a category without touching its other fields
    pub async fn set_category_status(&self, id: &str, active: bool) -> Result<Ack, ClientError> {
        require(id, "category id")?;
        let req =
            ApiRequest::patch(format!("/category/{id}")).json(&StatusBody { status: active })?;
        self.send(req).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<Ack, ClientError> {
        require(id, "category id")?;
        self.send(ApiRequest::delete(format!("/category/{id}"))).await
    }
}
