use crate::error::{Result, StudioError};
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 200;

/// Raw image returned by the API.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
}

impl ImageClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("pollgen/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StudioError::ConfigError(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { client })
    }

    /// GETs `url` and returns the body. Any non-2xx status is an error and
    /// the body is not returned.
    pub async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("Image request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::ResponseError {
                status: status.as_u16(),
                message: truncate(body.trim(), ERROR_BODY_LIMIT),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::RequestError(format!("Reading image body failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(StudioError::ResponseError {
                status: status.as_u16(),
                message: "empty image body".into(),
            });
        }

        log::debug!(
            "Received {} bytes ({})",
            bytes.len(),
            content_type.as_deref().unwrap_or("no content type")
        );

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
