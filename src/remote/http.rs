use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::RemoteSource;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::data::{Album, Photo};

/// JSON catalog client (jsonplaceholder-style `photos` / `albums` collections)
#[derive(Debug, Clone)]
pub struct HttpRemoteSource {
    http_client: Client,
    base_url: Url,
}

impl HttpRemoteSource {
    pub fn new(http_client: Client, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    /// Build a client with the configured timeouts
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("cannot build http client: {e}")))?;

        Ok(Self::new(http_client, config.base_url()?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(Error::Network)?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered with {}", url, status);
            return Err(Error::Protocol(format!("unexpected status {status} from {url}")));
        }

        let body = response.bytes().await.map_err(Error::Network)?;
        Ok(body.to_vec())
    }

    async fn get_collection<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Protocol(format!("cannot build url for {path}: {e}")))?;

        let body = self.get_bytes(url).await?;
        let items: Vec<T> = serde_json::from_slice(&body)?;

        debug!("fetched {} {}", items.len(), path);
        Ok(items)
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn photos(&self) -> Result<Vec<Photo>> {
        self.get_collection("photos").await
    }

    async fn albums(&self) -> Result<Vec<Album>> {
        self.get_collection("albums").await
    }

    async fn image(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url).map_err(|e| Error::Protocol(format!("bad image url {url}: {e}")))?;
        self.get_bytes(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use axum::{http::StatusCode, routing::get, Router};

    /// Serve `router` on an ephemeral port and return its base url
    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api/")).unwrap()
    }

    fn client(base_url: Url) -> HttpRemoteSource {
        HttpRemoteSource::new(Client::new(), base_url)
    }

    #[tokio::test]
    async fn test_fetches_photos_and_albums_verbatim() {
        let router = Router::new()
            .route(
                "/api/photos",
                get(|| async {
                    r#"[
                        {"albumId": 1, "id": 2, "title": "B", "url": "u2", "thumbnailUrl": "t2"},
                        {"albumId": 1, "id": 1, "title": "A", "url": "u1", "thumbnailUrl": "t1"}
                    ]"#
                }),
            )
            .route(
                "/api/albums",
                get(|| async { r#"[{"userId": 9, "id": 1, "title": "Vacation"}]"# }),
            );
        let remote = client(serve(router).await);

        let photos = remote.photos().await.unwrap();
        let ids: Vec<i64> = photos.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(photos[1].image_url, "u1");

        let albums = remote.albums().await.unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].title, "Vacation");
        assert_eq!(albums[0].owner_id, 9);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_protocol_error() {
        let router = Router::new().route("/api/photos", get(|| async { r#"{"not": "a list"}"# }));
        let remote = client(serve(router).await);

        let err = remote.photos().await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::Protocol));
    }

    #[tokio::test]
    async fn test_error_status_is_protocol_error() {
        let router = Router::new().route(
            "/api/albums",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let remote = client(serve(router).await);

        let err = remote.albums().await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::Protocol));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop, so nothing is listening on the port
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let remote = client(Url::parse(&format!("http://{addr}/")).unwrap());

        let err = remote.photos().await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::Network));
    }

    #[tokio::test]
    async fn test_unjoinable_base_url_is_protocol_error() {
        let remote = client(Url::parse("mailto:catalog@example.com").unwrap());

        let err = remote.albums().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert_eq!(err.failure_kind(), Some(FailureKind::Protocol));
    }

    #[test]
    fn test_from_config_uses_configured_base_url() {
        let config = Config {
            base_url: "http://catalog.local/api".into(),
            ..Config::default()
        };

        let remote = HttpRemoteSource::from_config(&config).unwrap();
        assert_eq!(remote.base_url().as_str(), "http://catalog.local/api/");

        let config = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            HttpRemoteSource::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_image_bytes() {
        let router = Router::new().route("/img/1", get(|| async { vec![1u8, 2, 3] }));
        let base = serve(router).await;
        let remote = client(base.clone());

        let url = base.join("/img/1").unwrap();
        assert_eq!(remote.image(url.as_str()).await.unwrap(), vec![1, 2, 3]);
    }
}
