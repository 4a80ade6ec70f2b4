//! HTTP client for the REST backend.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder};
use serde_json::Value;
use tokio_stream::StreamExt;

use super::command::{RequestBody, RestCommand};
use crate::chat::Registrar;
use crate::config::Config;
use crate::error::RestError;
use crate::models::{Credentials, RegistrationRequest};

/// Chunk size used when streaming uploads.
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Upload progress, reported for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(self) -> u64 {
        if self.total == 0 {
            100
        } else {
            self.sent * 100 / self.total
        }
    }
}

/// Client for the REST backend.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    user: Option<String>,
    token: Option<String>,
}

impl RestClient {
    /// `base_url` must end with `/`; commands are appended to it.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            user: None,
            token: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rest_url.clone())
            .with_auth(config.rest_user.clone(), config.rest_token.clone())
    }

    /// Send `user`/`token` headers on every call when set.
    #[must_use]
    pub fn with_auth(mut self, user: Option<String>, token: Option<String>) -> Self {
        self.user = user;
        self.token = token;
        self
    }

    pub fn url(&self, command: &str) -> String {
        format!("{}{command}", self.base_url)
    }

    /// Run a command and return the JSON response (`null` for an empty body).
    pub async fn execute(&self, command: &RestCommand) -> Result<Value, RestError> {
        let path = command.path();
        let url = self.url(&path);
        tracing::debug!(%url, "rest call");

        let request = match command.body() {
            RequestBody::None => self.http.get(&url),
            RequestBody::Text(text) => {
                tracing::debug!(body = %text, "post data");
                self.http
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=UTF-8")
                    .body(text)
            }
            RequestBody::Json(json) => {
                tracing::debug!(body = %json, "post data");
                self.http.post(&url).json(&json)
            }
        };

        self.send(&path, request).await
    }

    /// Upload an image file to `variable` as multipart part `file`.
    pub async fn upload_image(&self, variable: &str, file: &Path) -> Result<Value, RestError> {
        let path = format!("image/upload/{}", urlencoding::encode(variable));
        let url = self.url(&path);

        let bytes = tokio::fs::read(file).await.map_err(|source| RestError::File {
            path: file.display().to_string(),
            source,
        })?;
        let total = bytes.len() as u64;
        tracing::debug!(%url, total, "uploading {}", file.display());

        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let mut sent = 0u64;
        let stream = tokio_stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            let progress = UploadProgress { sent, total };
            tracing::debug!(
                sent = progress.sent,
                total = progress.total,
                "upload progress {}%",
                progress.percent()
            );
            Ok::<_, std::io::Error>(chunk)
        });

        let file_name = file
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().to_string());
        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name)
            .mime_str(image_mime(file))
            .map_err(|source| RestError::Transport {
                command: path.clone(),
                source,
            })?;
        let form = Form::new().part("file", part);

        self.send(&path, self.http.post(&url).multipart(form)).await
    }

    async fn send(&self, command: &str, request: RequestBuilder) -> Result<Value, RestError> {
        let request = self.authorize(request);
        let transport = |source| RestError::Transport {
            command: command.to_string(),
            source,
        };

        let resp = request.send().await.map_err(transport)?;
        let status = resp.status();
        let text = resp.text().await.map_err(transport)?;

        if !status.is_success() {
            tracing::warn!(%status, "ERROR: {command}");
            return Err(RestError::Status {
                command: command.to_string(),
                status,
                body: text,
            });
        }

        tracing::info!("SUCCESS: {command}");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&text).map_err(|source| RestError::Decode {
            command: command.to_string(),
            source,
        })?;
        tracing::debug!("Returned: {value:#}");
        Ok(value)
    }

    fn authorize(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(ref user) = self.user {
            request = request.header("user", user);
        }
        if let Some(ref token) = self.token {
            request = request.header("token", token);
        }
        request
    }
}

#[async_trait]
impl Registrar for RestClient {
    async fn register(&self, request: &RegistrationRequest) -> Result<Credentials, RestError> {
        let command = RestCommand::Register(request.clone());
        let value = self.execute(&command).await?;
        serde_json::from_value(value).map_err(|source| RestError::Decode {
            command: command.path(),
            source,
        })
    }
}

fn image_mime(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
