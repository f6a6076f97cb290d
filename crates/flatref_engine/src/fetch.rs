use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;

use flatref_logging::{flatref_info, flatref_warn};

use crate::{DownloadEvent, FailureKind, FetchError, FetchMetadata, FetchOutput};

/// Descriptor files are a few hundred bytes; anything near this is not one.
pub const DESCRIPTOR_MAX_BYTES: u64 = 1024 * 1024;
/// The compressed Flathub catalog is tens of megabytes.
pub const CATALOG_MAX_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: DESCRIPTOR_MAX_BYTES,
            user_agent: crate::endpoints::default_user_agent(),
        }
    }
}

impl FetchSettings {
    /// Settings sized for the catalog document; the request timeout is
    /// stretched since the whole archive is read in one response.
    pub fn for_catalog() -> Self {
        Self {
            request_timeout: Duration::from_secs(300),
            max_bytes: CATALOG_MAX_BYTES,
            ..Self::default()
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: DownloadEvent);
}

/// Discards every event.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: DownloadEvent) {}
}

/// Reports every event through the logger, with enough detail on failures
/// to retry an item by hand.
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::Saved {
                path, url, ordinal, ..
            } => flatref_info!("[{}] Saved {} from {}", ordinal, path.display(), url),
            DownloadEvent::Skipped { path, .. } => {
                flatref_info!("Skipped existing {}", path.display())
            }
            DownloadEvent::Failed {
                app_id,
                subject,
                attempts,
            } => {
                let tried = attempts
                    .iter()
                    .map(|attempt| format!("{} ({})", attempt.url, attempt.error))
                    .collect::<Vec<_>>()
                    .join("; ");
                match subject {
                    Some(subject) => {
                        flatref_warn!("Error downloading {} (subject {}): {}", app_id, subject, tried)
                    }
                    None => flatref_warn!("Error downloading {}: {}", app_id, tried),
                }
            }
            DownloadEvent::WriteFailed {
                app_id,
                path,
                message,
            } => flatref_warn!("Could not write {} for {}: {}", path.display(), app_id, message),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`. Only a `200 OK` with a non-empty body is a success.
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

/// Holds one client shared by every request.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let final_url = response.url().to_string();

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(FetchError::new(FailureKind::EmptyBody, "response body is empty"));
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
