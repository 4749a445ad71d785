use async_trait::async_trait;
use mediagate_core::{
    AuthGate, ByteRange, Catalog, CoreError, FilterSelection, MediaCatalog, MediaChunk, MediaId,
    PartialContent, ServerConfig,
};
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

#[cfg(test)]
mod test_server;

const LOG_TARGET: &str = "mediagate::http";

const AUTH_PATH: &str = "api/auth";
const MEDIA_PATH: &str = "api/media";
const FILTERED_PATH: &str = "api/media/filtered";

const USER_AGENT: &str = concat!("Mediagate/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    password: &'a str,
}

/// Percent-encode each segment of an id, keeping the `/` separators.
fn encode_id(id: &str) -> String {
    id.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Gallery server client.
///
/// The session cookie granted by [`AuthGate::authenticate`] is kept in the
/// client's cookie store and sent with every later request. Requests are never
/// retried.
pub struct HttpGalleryClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGalleryClient {
    /// Create a client for the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created.
    pub fn new(config: &ServerConfig) -> Result<Self, CoreError> {
        let base_url = config.base_url()?;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        info!(target: LOG_TARGET, "Gallery client for {}", base_url);
        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, CoreError> {
        Ok(self.base_url.join(path)?)
    }

    /// Map non-success statuses onto the error taxonomy. A 401 from any
    /// endpoint means the session is gone.
    fn check_status(endpoint: &str, response: Response) -> Result<Response, CoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!(target: LOG_TARGET, "GET {} returned status {}", endpoint, status);
        if status == StatusCode::UNAUTHORIZED {
            return Err(CoreError::SessionExpired);
        }
        Err(CoreError::UnexpectedStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl AuthGate for HttpGalleryClient {
    async fn authenticate(&self, credential: &str) -> Result<(), CoreError> {
        let url = self.endpoint(AUTH_PATH)?;
        debug!(target: LOG_TARGET, "POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&AuthRequest {
                password: credential,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(target: LOG_TARGET, "Gallery granted a session");
            Ok(())
        } else {
            warn!(target: LOG_TARGET, "Gallery rejected credential with status {}", status);
            Err(CoreError::AuthRejected {
                reason: if status == StatusCode::UNAUTHORIZED {
                    "incorrect password".to_string()
                } else {
                    format!("server returned status {status}")
                },
            })
        }
    }
}

#[async_trait]
impl MediaCatalog for HttpGalleryClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn catalog(&self) -> Result<Catalog, CoreError> {
        let url = self.endpoint(MEDIA_PATH)?;
        debug!(target: LOG_TARGET, "GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = Self::check_status(MEDIA_PATH, response)?;
        let listing: HashMap<MediaId, Value> = response.json().await?;

        debug!(target: LOG_TARGET, "Catalog lists {} entries", listing.len());
        Ok(Catalog::from_listing(listing))
    }

    async fn filtered(&self, selection: &FilterSelection) -> Result<Vec<MediaId>, CoreError> {
        let url = self.endpoint(FILTERED_PATH)?;
        let pairs = selection.query_pairs();
        debug!(target: LOG_TARGET, "GET {} {:?}", url, pairs);

        let response = self.client.get(url).query(&pairs).send().await?;
        let response = Self::check_status(FILTERED_PATH, response)?;
        let ids: Vec<MediaId> = response.json().await?;

        debug!(target: LOG_TARGET, "Filter matched {} items", ids.len());
        Ok(ids)
    }

    async fn media_bytes(&self, id: &str) -> Result<Vec<u8>, CoreError> {
        Ok(self.media_range(id, None).await?.bytes)
    }

    async fn media_range(
        &self,
        id: &str,
        range: Option<ByteRange>,
    ) -> Result<MediaChunk, CoreError> {
        let url = self.endpoint(&format!("{MEDIA_PATH}/{}", encode_id(id)))?;
        debug!(target: LOG_TARGET, "GET {} {:?}", url, range);

        let mut request = self.client.get(url);
        if let Some(range) = range {
            request = request.header(RANGE, range.header_value());
        }
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CoreError::MediaNotFound { id: id.to_string() });
        }
        let response = Self::check_status(MEDIA_PATH, response)?;

        let partial = if response.status() == StatusCode::PARTIAL_CONTENT {
            response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|value| value.to_str().ok())
                .and_then(PartialContent::parse)
        } else {
            None
        };
        let bytes = response.bytes().await?.to_vec();
        Ok(MediaChunk { bytes, partial })
    }

    fn media_url(&self, id: &str) -> String {
        let path = format!("{MEDIA_PATH}/{}", encode_id(id));
        self.base_url
            .join(&path)
            .map_or_else(|_| format!("{}{path}", self.base_url), String::from)
    }
}
