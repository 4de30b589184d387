//! Session loader: obtain a database image and hydrate a [`BlogDatabase`].
//!
//! Load policy: the persistent blob cache is consulted first; on a miss the
//! image is fetched from the remote endpoint and stored into the cache
//! before hydration. There is no retry or backoff, and a fetch failure
//! propagates to the caller.

use std::time::Duration;

use ureq::Agent;
use vellum_cache::{BlobCache, FileBlobCache, NullBlobCache};
use vellum_config::Config;

use crate::db::BlogDatabase;
use crate::error::{Result, StoreError};

/// Cache key the serialized database image is stored under.
pub const IMAGE_KEY: &str = "database";

/// Cache format marker; bumped when the stored image layout changes
/// incompatibly.
const CACHE_FORMAT: &str = "image-v1";

/// HTTP timeout for the image fetch.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Obtains the database image and hydrates per-session databases from it.
pub struct SessionLoader {
    endpoint: String,
    agent: Agent,
    cache: Box<dyn BlobCache>,
}

impl SessionLoader {
    /// Create a loader for the given endpoint and cache.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, cache: Box<dyn BlobCache>) -> Self {
        Self::with_timeout(endpoint, cache, DEFAULT_TIMEOUT)
    }

    /// Create a loader with a custom fetch timeout.
    #[must_use]
    pub fn with_timeout(
        endpoint: impl Into<String>,
        cache: Box<dyn BlobCache>,
        timeout: Duration,
    ) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            endpoint: endpoint.into(),
            agent,
            cache,
        }
    }

    /// Build a loader from configuration.
    ///
    /// With caching disabled in the config, every load fetches from the
    /// remote endpoint.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let cache: Box<dyn BlobCache> = if config.cache.enabled {
            Box::new(FileBlobCache::new(config.cache.dir.clone(), CACHE_FORMAT))
        } else {
            Box::new(NullBlobCache)
        };
        Self::new(config.remote.endpoint.clone(), cache)
    }

    /// Load the session database.
    ///
    /// Serves the image from the cache when present; otherwise fetches it
    /// from the remote endpoint and stores it before hydrating.
    pub async fn load(&self) -> Result<BlogDatabase> {
        if let Some(image) = self.cache.get(IMAGE_KEY) {
            tracing::debug!("database image served from cache ({} bytes)", image.len());
            return BlogDatabase::from_image(&image).await;
        }
        let image = self.fetch_image()?;
        self.cache.set(IMAGE_KEY, &image);
        BlogDatabase::from_image(&image).await
    }

    /// Drop the cached image so the next load re-fetches it.
    pub fn invalidate(&self) {
        self.cache.remove(IMAGE_KEY);
    }

    fn fetch_image(&self) -> Result<Vec<u8>> {
        tracing::info!("fetching database image from {}", self.endpoint);
        let response = self.agent.get(&self.endpoint).call()?;

        let status = response.status().as_u16();
        let mut body = response.into_body();
        if status >= 400 {
            let body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(StoreError::HttpStatus { status, body });
        }

        let image = body.read_to_vec()?;
        tracing::debug!("fetched database image ({} bytes)", image.len());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::image_with;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use tempfile::TempDir;

    /// Serve one HTTP response on an ephemeral local port.
    fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // Drain the request before responding
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let header = format!("{status_line}\r\nContent-Length: {}\r\n\r\n", body.len());
            stream.write_all(header.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        format!("http://{addr}/db")
    }

    fn file_cache(tmp: &TempDir) -> Box<dyn BlobCache> {
        Box::new(FileBlobCache::new(tmp.path().join("cache"), CACHE_FORMAT))
    }

    async fn test_image() -> Vec<u8> {
        image_with(&[
            "CREATE TABLE t (x INTEGER)",
            "INSERT INTO t (x) VALUES (7)",
        ])
        .await
    }

    #[tokio::test]
    async fn test_load_fetches_and_stores_in_cache() {
        let image = test_image().await;
        let endpoint = serve_once("HTTP/1.1 200 OK", image.clone());

        let tmp = TempDir::new().unwrap();
        let loader = SessionLoader::new(endpoint, file_cache(&tmp));

        let db = loader.load().await.unwrap();
        let x: i64 = sqlx::query_scalar("SELECT x FROM t")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(x, 7);

        // The fetched image now sits in the cache
        let cached = FileBlobCache::new(tmp.path().join("cache"), CACHE_FORMAT);
        assert_eq!(cached.get(IMAGE_KEY), Some(image));
    }

    #[tokio::test]
    async fn test_load_prefers_cache_over_fetch() {
        let image = test_image().await;
        let tmp = TempDir::new().unwrap();
        let cache = file_cache(&tmp);
        cache.set(IMAGE_KEY, &image);

        // The endpoint is unreachable; a cache hit never touches it
        let loader = SessionLoader::new("http://127.0.0.1:1/db", cache);
        let db = loader.load().await.unwrap();
        let x: i64 = sqlx::query_scalar("SELECT x FROM t")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(x, 7);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let loader = SessionLoader::new("http://127.0.0.1:1/db", Box::new(NullBlobCache));
        let result = loader.load().await;
        assert!(matches!(result, Err(StoreError::Http(_))));
    }

    #[tokio::test]
    async fn test_error_status_propagates() {
        let endpoint = serve_once("HTTP/1.1 500 Internal Server Error", b"boom".to_vec());
        let loader = SessionLoader::new(endpoint, Box::new(NullBlobCache));
        let result = loader.load().await;
        match result {
            Err(StoreError::HttpStatus { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let image = test_image().await;
        let tmp = TempDir::new().unwrap();
        let cache = file_cache(&tmp);
        cache.set(IMAGE_KEY, &image);

        let loader = SessionLoader::new("http://127.0.0.1:1/db", cache);
        loader.invalidate();

        // With the cache entry gone, the unreachable endpoint is hit
        assert!(loader.load().await.is_err());
    }

    #[tokio::test]
    async fn test_from_config_disabled_cache_always_fetches() {
        let image = test_image().await;
        let endpoint = serve_once("HTTP/1.1 200 OK", image);

        let config = Config {
            remote: vellum_config::RemoteConfig { endpoint },
            cache: vellum_config::CacheConfig {
                enabled: false,
                ..vellum_config::CacheConfig::default()
            },
            ..Config::default()
        };

        let loader = SessionLoader::from_config(&config);
        let db = loader.load().await.unwrap();
        let x: i64 = sqlx::query_scalar("SELECT x FROM t")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(x, 7);
    }
}
