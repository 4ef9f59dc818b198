use super::{Classification, SpecialRecommendMap, parse_special_recommend};
use crate::models::RemoteDataSettings;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Classification document name.
pub const CLASSIFICATION_FILE: &str = "coreClassification.json";

/// Special-recommend document name.
pub const SPECIAL_RECOMMEND_FILE: &str = "SPECIAL_RECOMMEND_CORES.json";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}

/// Source of the remote catalog documents.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Raw text of `file`, `None` when the document does not exist.
    async fn fetch(&self, file: &str) -> Result<Option<String>, FetchError>;
}

/// Fetches documents over HTTP from a versioned base URL.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(settings: &RemoteDataSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.resolved_base_url(),
        })
    }

    pub fn url(&self, file: &str) -> String {
        format!("{}/{}", self.base_url, file)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, file: &str) -> Result<Option<String>, FetchError> {
        let url = self.url(file);
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(Some(response.text().await?))
    }
}

/// Load-once cache of the remote catalog documents.
///
/// Successful loads are kept until [`RemoteCatalog::reset`]. A missing,
/// unreachable or malformed document yields empty data and is retried on the
/// next call.
pub struct RemoteCatalog {
    source: Arc<dyn DataSource>,
    classification: RwLock<Option<Arc<Classification>>>,
    special_recommend: RwLock<Option<Arc<SpecialRecommendMap>>>,
}

impl RemoteCatalog {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            classification: RwLock::new(None),
            special_recommend: RwLock::new(None),
        }
    }

    /// Catalog backed by [`HttpDataSource`].
    pub fn http(settings: &RemoteDataSettings) -> Result<Self, FetchError> {
        Ok(Self::new(Arc::new(HttpDataSource::new(settings)?)))
    }

    pub async fn classification(&self) -> Arc<Classification> {
        if let Some(cached) = self.classification.read().await.as_ref() {
            return Arc::clone(cached);
        }

        let mut slot = self.classification.write().await;
        if let Some(cached) = slot.as_ref() {
            return Arc::clone(cached);
        }

        match self.load(CLASSIFICATION_FILE, Classification::parse).await {
            Some(data) => {
                tracing::info!("Loaded core classification ({} tabs)", data.tab_names().count());
                let data = Arc::new(data);
                *slot = Some(Arc::clone(&data));
                data
            }
            None => Arc::new(Classification::default()),
        }
    }

    pub async fn special_recommend(&self) -> Arc<SpecialRecommendMap> {
        if let Some(cached) = self.special_recommend.read().await.as_ref() {
            return Arc::clone(cached);
        }

        let mut slot = self.special_recommend.write().await;
        if let Some(cached) = slot.as_ref() {
            return Arc::clone(cached);
        }

        match self.load(SPECIAL_RECOMMEND_FILE, parse_special_recommend).await {
            Some(data) => {
                tracing::info!("Loaded {} special-recommend core(s)", data.len());
                let data = Arc::new(data);
                *slot = Some(Arc::clone(&data));
                data
            }
            None => Arc::new(SpecialRecommendMap::new()),
        }
    }

    /// Drop cached documents so the next call fetches again.
    pub async fn reset(&self) {
        *self.classification.write().await = None;
        *self.special_recommend.write().await = None;
    }

    async fn load<T>(
        &self,
        file: &str,
        parse: impl FnOnce(&str) -> Result<T, json5::Error>,
    ) -> Option<T> {
        let text = match self.source.fetch(file).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::warn!("{} not found, using empty data", file);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", file, e);
                return None;
            }
        };

        match parse(&text) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("{} is malformed, using empty data: {}", file, e);
                None
            }
        }
    }
}
