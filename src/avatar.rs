//! Avatar image probing.
//!
//! An avatar is only embedded in a row after the image has been fetched and
//! looks like an image. Every probe ends in exactly one outcome; failures
//! are never surfaced, the row is simply rendered without the avatar.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes of the body inspected for an image signature. The rest is never
/// downloaded.
const SNIFF_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Loaded,
    /// The image could not be fetched or decoded.
    Failed,
    /// The load was abandoned before it finished.
    Aborted,
}

impl ProbeOutcome {
    pub fn is_loaded(self) -> bool {
        self == ProbeOutcome::Loaded
    }
}

#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Probes avatars over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpImageProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpImageProbe {
    pub fn new() -> Self {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), timeout)
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let parsed = match Url::parse(url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            _ => {
                debug!(url, "avatar url is not http(s)");
                return ProbeOutcome::Failed;
            }
        };

        let mut response = match self.client.get(parsed).timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return ProbeOutcome::Aborted,
            Err(e) => {
                debug!(url, error = %e, "avatar request failed");
                return ProbeOutcome::Failed;
            }
        };

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "avatar request rejected");
            return ProbeOutcome::Failed;
        }

        let is_image = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("image/"));
        if !is_image {
            return ProbeOutcome::Failed;
        }

        match read_head(&mut response).await {
            Ok(head) if looks_like_image(&head) => ProbeOutcome::Loaded,
            Ok(_) => ProbeOutcome::Failed,
            Err(e) if e.is_timeout() => ProbeOutcome::Aborted,
            Err(_) => ProbeOutcome::Failed,
        }
    }
}

/// Read at most `SNIFF_LEN` bytes of the body, stopping early at EOF.
async fn read_head(response: &mut reqwest::Response) -> Result<Vec<u8>, reqwest::Error> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    while head.len() < SNIFF_LEN {
        match response.chunk().await? {
            Some(chunk) => {
                let take = chunk.len().min(SNIFF_LEN - head.len());
                head.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }
    Ok(head)
}

/// Check the leading bytes against the image formats browsers decode.
pub fn looks_like_image(bytes: &[u8]) -> bool {
    const SIGNATURES: &[&[u8]] = &[
        b"\x89PNG\r\n\x1a\n",
        b"\xff\xd8\xff",
        b"GIF87a",
        b"GIF89a",
        b"BM",
        b"\x00\x00\x01\x00",
    ];

    if SIGNATURES.iter().any(|sig| bytes.starts_with(sig)) {
        return true;
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return true;
    }

    // SVG is text; look for the root element near the start.
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    String::from_utf8_lossy(head).contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_image() {
        assert!(looks_like_image(b"\x89PNG\r\n\x1a\n\x00\x00"));
        assert!(looks_like_image(b"\xff\xd8\xff\xe0rest"));
        assert!(looks_like_image(b"GIF89a...."));
        assert!(looks_like_image(b"RIFF\x00\x00\x00\x00WEBPVP8 "));
        assert!(looks_like_image(
            br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"/>"#
        ));
        assert!(!looks_like_image(b"<html>not found</html>"));
        assert!(!looks_like_image(b""));
    }

    #[tokio::test]
    async fn test_non_http_url_fails_without_request() {
        let probe = HttpImageProbe::new();
        assert_eq!(probe.probe("not a url").await, ProbeOutcome::Failed);
        assert_eq!(
            probe.probe("javascript:alert(1)").await,
            ProbeOutcome::Failed
        );
    }

    /// Serve one response whose headers promise a large body but only the
    /// first part ever arrives; the connection stays open.
    async fn serve_partial(content_type: &'static str, head: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            let headers = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: 10000000\r\n\r\n",
                content_type
            );
            stream.write_all(headers.as_bytes()).await.unwrap();
            stream.write_all(&head).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        format!("http://{}/avatar.png", addr)
    }

    fn local_probe() -> HttpImageProbe {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpImageProbe::with_client(client, Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_probe_stops_after_leading_bytes() {
        let mut body = b"\x89PNG\r\n\x1a\n".to_vec();
        body.resize(SNIFF_LEN + 100, 0);
        let url = serve_partial("image/png", body).await;

        assert_eq!(local_probe().probe(&url).await, ProbeOutcome::Loaded);
    }

    #[tokio::test]
    async fn test_probe_rejects_non_image_content_type() {
        let url = serve_partial("text/html", b"<html></html>".to_vec()).await;
        assert_eq!(local_probe().probe(&url).await, ProbeOutcome::Failed);
    }

    #[test]
    fn test_only_loaded_counts() {
        assert!(ProbeOutcome::Loaded.is_loaded());
        assert!(!ProbeOutcome::Failed.is_loaded());
        assert!(!ProbeOutcome::Aborted.is_loaded());
    }
}
