//! Remote media download
//!
//! Each provider hosts inbound media differently:
//!
//! - Gupshup puts a direct URL in the webhook; it is fetched with the
//!   channel's API key as a bearer token when the channel has one.
//! - Cloud sends a media id. `GET {graph}/{id}` returns JSON with a
//!   short-lived `url`, which is then fetched with the same bearer token.
//! - 360dialog serves `GET {dialog}/v1/media/{id}` behind a `D360-API-KEY`
//!   header.
//!
//! Bodies larger than the fetcher's byte limit are abandoned.
//!
//! A failed download never fails the message: the caller stores the message
//! without the attachment.

use std::time::Duration;

use async_trait::async_trait;
use relay_common::IngestConfig;
use relay_core::{Channel, MediaDescriptor, MediaSource, Provider};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const DIALOG_API_KEY_HEADER: &str = "d360-api-key";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_FILENAME: &str = "attachment";

/// WhatsApp's largest media size (documents)
pub const DEFAULT_MAX_MEDIA_BYTES: usize = 100 * 1024 * 1024;

/// Downloaded media ready to be stored as an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Media download port used by the ingestion pipeline
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Download the media behind `media` using `channel`'s credentials.
    ///
    /// `None` means the download failed and has already been logged.
    async fn fetch(&self, channel: &Channel, media: &MediaDescriptor) -> Option<FetchedMedia>;
}

/// Why a download did not produce bytes
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Channel has no api_key configured")]
    MissingCredentials,

    #[error("Invalid media url: {0}")]
    InvalidUrl(String),

    #[error("{provider} channels cannot fetch media by {source_kind}")]
    UnsupportedSource {
        provider: Provider,
        source_kind: &'static str,
    },

    #[error("Media request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Media request returned HTTP {0}")]
    Status(StatusCode),

    #[error("Media lookup response carried no url")]
    MissingUrl,

    #[error("Media exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Debug, Deserialize)]
struct GraphMedia {
    url: Option<String>,
}

/// `reqwest`-backed [`AttachmentFetcher`]
#[derive(Debug, Clone)]
pub struct HttpAttachmentFetcher {
    http: reqwest::Client,
    graph_api_base: String,
    dialog_api_base: String,
    max_bytes: usize,
}

impl HttpAttachmentFetcher {
    pub fn new(
        timeout: Duration,
        graph_api_base: impl Into<String>,
        dialog_api_base: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout.max(Duration::from_millis(1)))
            .build()?;

        Ok(Self {
            http,
            graph_api_base: graph_api_base.into().trim_end_matches('/').to_string(),
            dialog_api_base: dialog_api_base.into().trim_end_matches('/').to_string(),
            max_bytes: DEFAULT_MAX_MEDIA_BYTES,
        })
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self, FetchError> {
        Self::new(
            config.media_fetch_timeout(),
            &config.graph_api_base_url,
            &config.dialog_api_base_url,
        )
    }

    async fn download(
        &self,
        channel: &Channel,
        media: &MediaDescriptor,
    ) -> Result<FetchedMedia, FetchError> {
        let api_key = channel.provider_config.api_key();
        let require_key = || api_key.ok_or(FetchError::MissingCredentials);

        let (bytes, header_type) = match (channel.provider, &media.source) {
            // Direct links carry the bearer only when the channel has a key
            (_, MediaSource::Url(url)) => {
                let headers = match api_key {
                    Some(key) => auth_bearer(key)?,
                    None => HeaderMap::new(),
                };
                self.get(parse_url(url)?, headers).await?
            }
            (Provider::Cloud, MediaSource::MediaId(id)) => {
                let api_key = require_key()?;
                let lookup = parse_url(&format!("{}/{id}", self.graph_api_base))?;
                let located: GraphMedia = self
                    .http
                    .get(lookup)
                    .bearer_auth(api_key)
                    .send()
                    .await?
                    .error_for_status()
                    .map_err(status_error)?
                    .json()
                    .await?;
                let url = located.url.ok_or(FetchError::MissingUrl)?;
                debug!(media_id = %id, "Resolved Cloud media url");
                self.get(parse_url(&url)?, auth_bearer(api_key)?).await?
            }
            (Provider::Default, MediaSource::MediaId(id)) => {
                let url = parse_url(&format!("{}/v1/media/{id}", self.dialog_api_base))?;
                let mut headers = HeaderMap::new();
                headers.insert(DIALOG_API_KEY_HEADER, header_value(require_key()?)?);
                self.get(url, headers).await?
            }
            (provider, MediaSource::MediaId(_)) => {
                return Err(FetchError::UnsupportedSource {
                    provider,
                    source_kind: "media id",
                })
            }
        };

        Ok(FetchedMedia {
            filename: media
                .filename
                .clone()
                .or_else(|| media.caption.clone())
                .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
            content_type: media
                .content_type
                .clone()
                .or(header_type)
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            data: bytes,
        })
    }

    async fn get(&self, url: Url, headers: HeaderMap) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let mut response = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await?
            .error_for_status()
            .map_err(status_error)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());

        let too_large = FetchError::TooLarge { limit: self.max_bytes };
        let declared = response.content_length().unwrap_or(0);
        if usize::try_from(declared).map_or(true, |len| len > self.max_bytes) {
            return Err(too_large);
        }

        // Content-Length can be absent; the cap holds while reading too
        let mut bytes = Vec::with_capacity(declared as usize);
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(too_large);
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok((bytes, content_type))
    }
}

#[async_trait]
impl AttachmentFetcher for HttpAttachmentFetcher {
    #[instrument(skip(self, channel, media), fields(channel_id = %channel.id, provider = %channel.provider))]
    async fn fetch(&self, channel: &Channel, media: &MediaDescriptor) -> Option<FetchedMedia> {
        match self.download(channel, media).await {
            Ok(fetched) => {
                debug!(bytes = fetched.data.len(), content_type = %fetched.content_type, "Media downloaded");
                Some(fetched)
            }
            Err(e) => {
                warn!(error = %e, "Media download failed, keeping message without attachment");
                None
            }
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw.trim()).map_err(|_| FetchError::InvalidUrl(raw.to_string()))
}

fn header_value(raw: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(raw).map_err(|_| FetchError::MissingCredentials)
}

fn auth_bearer(api_key: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        header_value(&format!("Bearer {api_key}"))?,
    );
    Ok(headers)
}

fn status_error(e: reqwest::Error) -> FetchError {
    e.status().map_or(FetchError::Transport(e), FetchError::Status)
}
