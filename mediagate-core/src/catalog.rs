//! Interfaces to the gallery server and an in-memory implementation.

use crate::error::{CoreError, Result};
use crate::filter::FilterSelection;
use crate::media::{Catalog, MediaId, MediaItem};
use crate::range::{ByteRange, MediaChunk};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Grants session-scoped access in exchange for a credential.
#[async_trait]
pub trait AuthGate: Send + Sync {
    /// Present `credential` to the gate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AuthRejected`] when the credential is refused, or a
    /// transport error when no answer could be obtained.
    async fn authenticate(&self, credential: &str) -> Result<()>;
}

/// Lists media items and serves their bytes.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Get the catalog name (for logging)
    fn name(&self) -> &'static str;

    /// Fetch the full catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SessionExpired`] when the session is no longer
    /// valid, or a transport error.
    async fn catalog(&self) -> Result<Catalog>;

    /// Ids matching `selection`, in server order.
    ///
    /// # Errors
    ///
    /// Same as [`MediaCatalog::catalog`].
    async fn filtered(&self, selection: &FilterSelection) -> Result<Vec<MediaId>>;

    /// Raw bytes of one item.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MediaNotFound`] for unknown ids, otherwise the same
    /// as [`MediaCatalog::catalog`].
    async fn media_bytes(&self, id: &str) -> Result<Vec<u8>>;

    /// One byte range of an item, or the whole item when `range` is `None`.
    ///
    /// The default cuts the range out of [`MediaCatalog::media_bytes`].
    ///
    /// # Errors
    ///
    /// Same as [`MediaCatalog::media_bytes`].
    async fn media_range(&self, id: &str, range: Option<ByteRange>) -> Result<MediaChunk> {
        let bytes = self.media_bytes(id).await?;
        Ok(MediaChunk::slice(bytes, range))
    }

    /// Byte stream endpoint of one item, used as a display surface source.
    fn media_url(&self, id: &str) -> String;
}

/// Catalog held entirely in memory.
///
/// Used as a fixture for controller tests and as the backing store of the
/// test gallery server in `mediagate-http`.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    catalog: RwLock<Catalog>,
    bytes: RwLock<HashMap<MediaId, Vec<u8>>>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = MediaItem>) -> Self {
        Self {
            catalog: RwLock::new(Catalog::new(items)),
            bytes: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a byte payload to an item.
    #[must_use]
    pub fn with_bytes(self, id: impl Into<MediaId>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert_bytes(id, bytes);
        self
    }

    pub fn insert_bytes(&self, id: impl Into<MediaId>, bytes: impl Into<Vec<u8>>) {
        self.bytes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), bytes.into());
    }

    /// Replace the whole catalog, as if the server re-indexed its files.
    pub fn replace(&self, items: impl IntoIterator<Item = MediaItem>) {
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Catalog::new(items);
    }

    /// Current catalog snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Catalog {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ids matching `selection`, in catalog order.
    #[must_use]
    pub fn matching(&self, selection: &FilterSelection) -> Vec<MediaId> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items()
            .filter(|item| selection.matches(item))
            .map(|item| item.id.clone())
            .collect()
    }
}

#[async_trait]
impl MediaCatalog for InMemoryCatalog {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn catalog(&self) -> Result<Catalog> {
        Ok(self.snapshot())
    }

    async fn filtered(&self, selection: &FilterSelection) -> Result<Vec<MediaId>> {
        Ok(self.matching(selection))
    }

    async fn media_bytes(&self, id: &str) -> Result<Vec<u8>> {
        if self.snapshot().get(id).is_none() {
            return Err(CoreError::MediaNotFound { id: id.to_string() });
        }
        Ok(self
            .bytes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    fn media_url(&self, id: &str) -> String {
        format!("/api/media/{id}")
    }
}

/// Gate that accepts a single fixed credential.
#[derive(Debug, Clone)]
pub struct StaticAuthGate {
    credential: String,
}

impl StaticAuthGate {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
        }
    }

    #[must_use]
    pub fn accepts(&self, credential: &str) -> bool {
        self.credential == credential
    }
}

#[async_trait]
impl AuthGate for StaticAuthGate {
    async fn authenticate(&self, credential: &str) -> Result<()> {
        if self.accepts(credential) {
            Ok(())
        } else {
            Err(CoreError::AuthRejected {
                reason: "incorrect password".to_string(),
            })
        }
    }
}
