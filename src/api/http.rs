//! reqwest-backed implementation of [`SlideApi`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::slide::{SlideMetadata, SlideRect};

use super::{
    download_filename, ErrorBody, FilesResponse, InfoResponse, RegionImage, SaveRequest,
    SaveResponse, ServerConfig, SlideApi, StoredBody,
};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest body excerpt kept in [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 200;

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the slide server.
///
/// # Example
///
/// ```ignore
/// use wsi_clip::api::{HttpSlideApi, SlideApi, DEFAULT_TIMEOUT};
///
/// let api = HttpSlideApi::new("http://localhost:8080/api", DEFAULT_TIMEOUT)?;
/// let files = api.list_files().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpSlideApi {
    http: Client,
    base: Url,
}

impl HttpSlideApi {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{} cannot be a base URL", base_url)));
        }

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self { http, base })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build the URL for an endpoint; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        parse_json(status, &body)
    }

    async fn get_image(&self, url: Url) -> Result<(HeaderMap, Bytes), ApiError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if is_json(&headers) {
            return Err(match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(err) => ApiError::Server {
                    status,
                    message: err.error,
                },
                Err(_) => ApiError::Decode("expected image data, got JSON".to_string()),
            });
        }
        if body.is_empty() {
            return Err(ApiError::Decode("empty image body".to_string()));
        }
        Ok((headers, body))
    }
}

#[async_trait]
impl SlideApi for HttpSlideApi {
    async fn list_files(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["files"])?;
        let body: FilesResponse = self.get_json(url).await?;
        Ok(body.files)
    }

    async fn slide_info(&self, filename: &str) -> Result<SlideMetadata, ApiError> {
        let url = self.endpoint(&["info", filename])?;
        let body: InfoResponse = self.get_json(url).await?;
        Ok(body.into_metadata(filename))
    }

    async fn thumbnail(
        &self,
        filename: &str,
        max_width: u32,
        max_height: u32,
    ) -> Result<Bytes, ApiError> {
        let mut url = self.endpoint(&["thumbnail", filename])?;
        url.query_pairs_mut()
            .append_pair("max_width", &max_width.to_string())
            .append_pair("max_height", &max_height.to_string());

        let (_, body) = self.get_image(url).await?;
        Ok(body)
    }

    async fn region(&self, filename: &str, rect: SlideRect) -> Result<RegionImage, ApiError> {
        let mut url = self.endpoint(&["region"])?;
        url.query_pairs_mut()
            .append_pair("filename", filename)
            .append_pair("x", &rect.x.to_string())
            .append_pair("y", &rect.y.to_string())
            .append_pair("width", &rect.width.to_string())
            .append_pair("height", &rect.height.to_string());

        let (headers, data) = self.get_image(url).await?;

        let level_used = header_number(&headers, "x-level-used");
        let output_size = match (
            header_number(&headers, "x-output-width"),
            header_number(&headers, "x-output-height"),
        ) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        };

        Ok(RegionImage {
            data,
            level_used,
            output_size,
        })
    }

    async fn save(&self, request: &SaveRequest) -> Result<SaveResponse, ApiError> {
        let url = self.endpoint(&["save"])?;
        debug!("POST {} ({})", url, request.save_filename);

        let response = self.http.post(url).json(request).send().await?;
        let response = check_status(response).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if !is_json(&headers) && !body.is_empty() {
            let filename = headers
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_disposition)
                .unwrap_or_else(|| download_filename(&request.save_filename));
            return Ok(SaveResponse::Download {
                filename,
                data: body,
            });
        }

        let stored: StoredBody = parse_json(status, &body)?;
        Ok(SaveResponse::Stored {
            path: stored.path,
            message: stored.message,
        })
    }

    async fn server_config(&self) -> Result<ServerConfig, ApiError> {
        let url = self.endpoint(&["config"])?;
        self.get_json(url).await
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Turn non-2xx responses into errors, preferring the JSON `error` field.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await?;
    let status = status.as_u16();
    Err(match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(err) => ApiError::Server {
            status,
            message: err.error,
        },
        Err(_) => ApiError::Status {
            status,
            body: String::from_utf8_lossy(&body)
                .chars()
                .take(MAX_ERROR_BODY)
                .collect(),
        },
    })
}

/// Parse a JSON body, treating an `{ error }` object as a server error even
/// on a 2xx status.
fn parse_json<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    if let Ok(err) = serde_json::from_slice::<ErrorBody>(body) {
        return Err(ApiError::Server {
            status,
            message: err.error,
        });
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Extract the filename from a `Content-Disposition` header.
///
/// `filename*=UTF-8''…` (percent-encoded) wins over a plain `filename=`.
fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let encoded = encoded
                .split_once("''")
                .map(|(_, rest)| rest)
                .unwrap_or(encoded);
            if let Ok(decoded) = urlencoding::decode(encoded) {
                if !decoded.is_empty() {
                    return Some(decoded.into_owned());
                }
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            let name = name.trim_matches('"');
            if !name.is_empty() {
                plain = Some(name.to_string());
            }
        }
    }
    plain
}
