//! Art Institute of Chicago catalog client
//!
//! Places in a travel project are artworks from the public Art Institute API.
//! The [`ArtworkCatalog`] trait is the seam the planner depends on; production
//! wires an [`ArtInstituteClient`] behind a [`CachedCatalog`].

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::cache::PersistentCache;
use crate::config::ArtApiConfig;
use crate::{Result, TravelPlannerError};

/// Title used when the catalog has none for an artwork
pub const UNKNOWN_TITLE: &str = "Unknown";

/// The slice of an artwork record a place keeps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: i64,
    pub title: String,
}

/// Source of artwork records
#[async_trait]
pub trait ArtworkCatalog: Send + Sync {
    /// Fetch an artwork; `Ok(None)` when the catalog does not know the id.
    async fn get_artwork(&self, artwork_id: i64) -> Result<Option<Artwork>>;

    async fn artwork_exists(&self, artwork_id: i64) -> Result<bool> {
        Ok(self.get_artwork(artwork_id).await?.is_some())
    }
}

#[derive(Debug, Deserialize)]
struct ArtworkEnvelope {
    data: Option<ArtworkData>,
}

#[derive(Debug, Deserialize)]
struct ArtworkData {
    id: Option<i64>,
    title: Option<String>,
}

impl ArtworkData {
    fn into_artwork(self, requested_id: i64) -> Artwork {
        Artwork {
            id: self.id.unwrap_or(requested_id),
            title: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        }
    }
}

/// HTTP client for `https://api.artic.edu/api/v1`
pub struct ArtInstituteClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl ArtInstituteClient {
    /// Create a new client with timeout, user agent and transient-retry policy
    pub fn new(config: &ArtApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TravelPlannerError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ArtworkCatalog for ArtInstituteClient {
    #[instrument(skip(self))]
    async fn get_artwork(&self, artwork_id: i64) -> Result<Option<Artwork>> {
        let url = format!("{}/artworks/{}?fields=id,title", self.base_url, artwork_id);
        debug!("Calling the Art Institute API");

        let response = self.client.get(&url).send().await.map_err(|e| {
            TravelPlannerError::upstream(format!("Art Institute request failed: {e}"))
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            info!("Artwork not found in catalog");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Art Institute API returned an error");
            return Err(TravelPlannerError::upstream(format!(
                "Art Institute API error {status}: {body}"
            )));
        }

        let envelope: ArtworkEnvelope = response.json().await.map_err(|e| {
            TravelPlannerError::upstream(format!("Failed to parse Art Institute response: {e}"))
        })?;

        let data = envelope.data.unwrap_or(ArtworkData {
            id: None,
            title: None,
        });
        Ok(Some(data.into_artwork(artwork_id)))
    }
}

/// Wraps a catalog with the persistent TTL cache; only found artworks are cached.
pub struct CachedCatalog<C> {
    inner: C,
    cache: PersistentCache,
    ttl: Duration,
}

impl<C: ArtworkCatalog> CachedCatalog<C> {
    pub fn new(inner: C, cache: PersistentCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn cache_key(artwork_id: i64) -> String {
        format!("artwork:{artwork_id}")
    }
}

#[async_trait]
impl<C: ArtworkCatalog> ArtworkCatalog for CachedCatalog<C> {
    async fn get_artwork(&self, artwork_id: i64) -> Result<Option<Artwork>> {
        let key = Self::cache_key(artwork_id);

        match self.cache.get::<Artwork>(&key).await {
            Ok(Some(artwork)) => return Ok(Some(artwork)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, artwork_id, "Artwork cache read failed"),
        }

        let artwork = self.inner.get_artwork(artwork_id).await?;

        if let Some(artwork) = &artwork {
            if let Err(e) = self.cache.put(&key, artwork.clone(), self.ttl).await {
                warn!(error = %e, artwork_id, "Artwork cache write failed");
            }
        }

        Ok(artwork)
    }
}
