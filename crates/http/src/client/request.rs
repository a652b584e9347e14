//! Replayable description of an outbound API call
//!
//! A [`reqwest::RequestBuilder`] is consumed when sent, so a request that
//! has to be replayed after a token refresh is kept as an [`ApiRequest`]
//! and turned into a fresh builder for every attempt.

use reqwest::{Method, header, multipart};
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::ClientError;

/// File attached to a multipart form
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Multipart form kept as plain data so it can be rebuilt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, FilePart)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.files.push((name.into(), file));
        self
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|(field, _)| field == name)
    }

    fn to_form(&self) -> Result<multipart::Form, ClientError> {
        let mut form = multipart::Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for (name, file) in &self.files {
            let mut part =
                multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(mime) = &file.mime {
                part = part.mime_str(mime)?;
            }
            form = form.part(name.clone(), part);
        }
        Ok(form)
    }
}

/// Request payload
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(JsonValue),
    Multipart(MultipartForm),
}

/// Outbound API call: method, path relative to the base URL, query and body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query pairs
    #[must_use]
    pub fn query<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a multipart body
    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Build a sendable request, optionally carrying a bearer token
    pub(crate) fn build(
        &self,
        client: &reqwest::Client,
        base_url: &str,
        bearer: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = format!("{}{}", base_url, self.path);
        let mut request = client.request(self.method.clone(), url);

        if !self.query.is_empty() {
            request = request.query(&self.query);
        }

        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        request = match &self.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart(form) => request.multipart(form.to_form()?),
        };

        Ok(request)
    }
}
