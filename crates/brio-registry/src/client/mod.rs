//! Registry collaborators: the HTTP client and an in-memory stand-in

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use brio_config::Settings;
use brio_core::error::BrioError;
use crate::api::{PackageData, VersionRecord};
use crate::RegistryResult;

mod memory;

pub use memory::MemoryRegistry;

/// Accept header understood by npm-compatible registries
pub const INSTALL_ACCEPT: &str = "application/vnd.npm.install-v1+json";

/// Source of package documents.
///
/// 404 responses map to [`BrioError::PackageNotFound`] /
/// [`BrioError::PackageVersionNotFound`]; any other non-200 status maps to
/// [`BrioError::Registry`]. Implementations never retry.
pub trait RegistrySource: Send + Sync {
    /// `GET /<name>`
    fn fetch_package(&self, name: &str) -> impl Future<Output = RegistryResult<PackageData>> + Send;

    /// `GET /<name>/<version>`
    fn fetch_version(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = RegistryResult<VersionRecord>> + Send;
}

/// Sessions may share one source
impl<S: RegistrySource> RegistrySource for Arc<S> {
    fn fetch_package(&self, name: &str) -> impl Future<Output = RegistryResult<PackageData>> + Send {
        S::fetch_package(self, name)
    }

    fn fetch_version(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = RegistryResult<VersionRecord>> + Send {
        S::fetch_version(self, name, version)
    }
}

/// HTTP registry client
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Base registry URL
    base_url: String,
}

impl HttpRegistry {
    /// Create a client for the public registry with the default timeout
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(&Settings::default())
    }

    /// Create a client from layered settings
    pub fn with_config(settings: &Settings) -> RegistryResult<Self> {
        Self::build(&settings.registry, settings.timeout)
    }

    fn build(base_url: &str, timeout: Duration) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .gzip(true)
            .user_agent(concat!("brio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BrioError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T, F>(&self, url: String, not_found: F) -> RegistryResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> BrioError,
    {
        debug!("GET {}", url);
        let response = self.client
            .get(&url)
            .header("Accept", INSTALL_ACCEPT)
            .send()
            .await
            .map_err(|e| BrioError::network(format!("Failed to fetch {}", url), e))?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| BrioError::network(format!("Failed to decode {}", url), e)),
            StatusCode::NOT_FOUND => Err(not_found()),
            status => Err(BrioError::Registry {
                status: status.as_u16(),
                url,
            }),
        }
    }

    /// Encode package name for URL (handle scoped packages)
    fn encode_package_name(&self, name: &str) -> String {
        if name.starts_with('@') {
            // @org/pkg -> @org%2fpkg
            name.replace('/', "%2f")
        } else {
            name.to_string()
        }
    }
}

impl RegistrySource for HttpRegistry {
    async fn fetch_package(&self, name: &str) -> RegistryResult<PackageData> {
        let url = format!("{}/{}", self.base_url, self.encode_package_name(name));
        self.get_json(url, || BrioError::PackageNotFound {
            name: name.to_string(),
        })
        .await
    }

    async fn fetch_version(&self, name: &str, version: &str) -> RegistryResult<VersionRecord> {
        let url = format!("{}/{}/{}", self.base_url, self.encode_package_name(name), version);
        self.get_json(url, || BrioError::PackageVersionNotFound {
            name: name.to_string(),
            version: version.to_string(),
        })
        .await
    }
}

#[cfg(test)]
mod tests;
