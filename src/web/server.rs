//! Web server for filekeep.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::auth;
use crate::config::Config;
use crate::file::{FileStorage, TreeOptions};
use crate::{FilekeepError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
    /// Request body ceiling in bytes.
    max_body_bytes: usize,
}

impl WebServer {
    /// Create a new web server from configuration.
    ///
    /// Creates the storage root if needed and builds the delete credential
    /// check.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FilekeepError::Config(format!("invalid server address: {e}")))?;

        let storage = FileStorage::new(&config.storage.root)?.with_options(TreeOptions {
            sort_children: config.storage.sort_children,
        });
        tracing::info!("File storage initialized at: {}", config.storage.root);

        let credentials = auth::from_config(&config.security)
            .map_err(|e| FilekeepError::Config(e.to_string()))?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(storage, credentials)),
            cors_origins: config.web.cors_origins.clone(),
            max_body_bytes: config.storage.max_upload_bytes(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            &self.cors_origins,
            self.max_body_bytes,
        )
        .layer(CompressionLayer::new())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;

        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.storage.root = root.to_string_lossy().into_owned();
        config.security.delete_password = "test-secret".to_string();
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("storage-root");
        let config = create_test_config(&root);

        let server = WebServer::new(&config).unwrap();

        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_web_server_invalid_address() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(temp_dir.path());
        config.server.host = "not an address".to_string();

        let result = WebServer::new(&config);
        assert!(matches!(result, Err(FilekeepError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(temp_dir.path());
        std::fs::write(temp_dir.path().join("hello.txt"), b"hi").unwrap();

        let server = WebServer::new(&config).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let body: serde_json::Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
        assert_eq!(body["isFile"], false);
        assert_eq!(body["children"][0]["name"], "hello.txt");

        let resp = client
            .get(format!("http://{}/hello.txt/download", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "hi");
    }
}
