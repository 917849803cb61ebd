use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Settings;
use crate::readiness::Probe;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Re-reads a saved page from disk; useful while a browser export is still being written.
#[derive(Debug, Clone)]
pub struct FileProbe {
    path: PathBuf,
}

impl FileProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileProbe { path: path.into() }
    }
}

impl Probe for FileProbe {
    fn fetch(&mut self) -> impl Future<Output = Result<String>> + Send {
        let path = self.path.clone();
        async move {
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))
        }
    }
}

/// Re-fetches a creature page over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: &str, settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpProbe {
            client,
            url: url.to_string(),
        })
    }
}

impl Probe for HttpProbe {
    fn fetch(&mut self) -> impl Future<Output = Result<String>> + Send {
        let request = self.client.get(&self.url);
        let url = self.url.clone();
        async move {
            let response = request
                .send()
                .await
                .with_context(|| format!("Request to {} failed", url))?
                .error_for_status()?;
            let body = response
                .text()
                .await
                .with_context(|| format!("Failed to read body of {}", url))?;
            debug!(bytes = body.len(), %url, "fetched page");
            Ok(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/monsters/goblin-warrior", addr)
    }

    #[tokio::test]
    async fn http_probe_reads_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;
        let mut probe = HttpProbe::new(&url, &Settings::default()).unwrap();
        assert_eq!(probe.fetch().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn http_probe_error_status_is_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let mut probe = HttpProbe::new(&url, &Settings::default()).unwrap();
        let err = probe.fetch().await.unwrap_err();
        assert!(format!("{:#}", err).contains("404"));
    }

    #[tokio::test]
    async fn file_probe_reads_fixture() {
        let mut probe = FileProbe::new("tests/fixtures/loading.html");
        let page = probe.fetch().await.unwrap();
        assert!(page.contains("Loading"));
    }

    #[tokio::test]
    async fn file_probe_missing_file_is_error() {
        let mut probe = FileProbe::new("tests/fixtures/does-not-exist.html");
        let err = probe.fetch().await.unwrap_err();
        assert!(err.to_string().contains("does-not-exist.html"));
    }
}
