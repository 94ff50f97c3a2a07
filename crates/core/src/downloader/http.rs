//! reqwest-based streaming downloader.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, RequestBuilder, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DownloaderConfig, HttpConfig, SourceConfig};
use crate::metrics;
use crate::source::{sanitize_file_name, FetchPlan};

use super::error::DownloadError;
use super::types::{DownloadResult, DownloadSession, ProgressEvent};

/// Streams fetch plans to local files.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    confirm_cookie_prefix: String,
    chunk_size: usize,
    progress_every_chunks: u64,
}

impl HttpDownloader {
    /// Builds a downloader with its own cookie-carrying HTTP client.
    pub fn new(
        http: &HttpConfig,
        source: &SourceConfig,
        downloader: &DownloaderConfig,
    ) -> Result<Self, DownloadError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(http.user_agent.clone())
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs));
        if http.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(http.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;

        Ok(Self::with_client(client, source, downloader))
    }

    /// Creates a downloader with default configuration.
    pub fn with_defaults() -> Result<Self, DownloadError> {
        Self::new(
            &HttpConfig::default(),
            &SourceConfig::default(),
            &DownloaderConfig::default(),
        )
    }

    /// Uses an existing client. The client should have a cookie store so the
    /// provider session survives between handshake requests.
    pub fn with_client(client: Client, source: &SourceConfig, downloader: &DownloaderConfig) -> Self {
        Self {
            client,
            confirm_cookie_prefix: source.confirm_cookie_prefix.clone(),
            chunk_size: downloader.chunk_size.max(1),
            progress_every_chunks: downloader.progress_every_chunks.max(1),
        }
    }

    /// Downloads `plan` into `destination`.
    ///
    /// On failure the partially written destination is removed.
    pub async fn download(
        &self,
        plan: &FetchPlan,
        destination: &Path,
        progress: Option<&mpsc::Sender<ProgressEvent>>,
        cancel: &CancellationToken,
    ) -> Result<DownloadResult, DownloadError> {
        metrics::DOWNLOADS_STARTED.inc();

        let result = self.fetch(plan, destination, progress, cancel).await;

        match &result {
            Ok(done) => {
                metrics::DOWNLOADS_COMPLETED.inc();
                metrics::DOWNLOADED_BYTES.inc_by(done.bytes_written);
                metrics::DOWNLOAD_DURATION
                    .with_label_values(&["success"])
                    .observe(done.elapsed.as_secs_f64());
                info!(
                    bytes = done.bytes_written,
                    elapsed_ms = done.elapsed.as_millis() as u64,
                    "Download completed"
                );
            }
            Err(e) => {
                metrics::DOWNLOADS_FAILED.inc();
                warn!(path = %destination.display(), error = ?e, "Download failed");
                if let Err(rm) = tokio::fs::remove_file(destination).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %destination.display(), error = %rm, "Failed to remove partial download");
                    }
                }
            }
        }

        result
    }

    async fn fetch(
        &self,
        plan: &FetchPlan,
        destination: &Path,
        progress: Option<&mpsc::Sender<ProgressEvent>>,
        cancel: &CancellationToken,
    ) -> Result<DownloadResult, DownloadError> {
        let response = self.open(plan, cancel).await?;

        let total_bytes = response.content_length();
        let suggested_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename);

        debug!(
            url = %plan.primary_endpoint(),
            total_bytes = ?total_bytes,
            "Streaming response body"
        );

        let mut file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        let mut session = DownloadSession::new(
            plan.clone(),
            destination.to_path_buf(),
            total_bytes,
        );
        let mut buffer: Vec<u8> = Vec::with_capacity(self.chunk_size);
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                next = stream.next() => next,
            };

            let bytes = match next {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Err(DownloadError::transport(&e)),
                None => break,
            };

            let mut data = &bytes[..];
            while !data.is_empty() {
                let take = (self.chunk_size - buffer.len()).min(data.len());
                buffer.extend_from_slice(&data[..take]);
                data = &data[take..];

                if buffer.len() == self.chunk_size {
                    let chunks = self
                        .write_chunk(&mut file, &mut buffer, &mut session, destination)
                        .await?;
                    if chunks % self.progress_every_chunks == 0 {
                        emit(progress, session.snapshot(false));
                    }
                }
            }
        }

        if !buffer.is_empty() {
            self.write_chunk(&mut file, &mut buffer, &mut session, destination)
                .await?;
        }
        file.flush()
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        emit(progress, session.snapshot(true));

        Ok(DownloadResult {
            path: destination.to_path_buf(),
            bytes_written: session.bytes_written(),
            total_bytes,
            suggested_name,
            elapsed: session.elapsed(),
        })
    }

    async fn write_chunk(
        &self,
        file: &mut File,
        buffer: &mut Vec<u8>,
        session: &mut DownloadSession,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        file.write_all(buffer)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        let chunks = session.record(buffer.len());
        buffer.clear();
        Ok(chunks)
    }

    /// Issues the request(s) for `plan` and returns the payload response.
    async fn open(
        &self,
        plan: &FetchPlan,
        cancel: &CancellationToken,
    ) -> Result<Response, DownloadError> {
        let endpoint = plan.primary_endpoint().clone();

        let Some(file_id) = plan.provider_file_id() else {
            return self.send(self.client.get(endpoint), cancel).await;
        };

        let first = self
            .send(self.client.get(endpoint.clone()).query(&[("id", file_id)]), cancel)
            .await?;

        match confirm_token(&first, &self.confirm_cookie_prefix) {
            Some(token) => {
                debug!(file_id = %file_id, "Provider requested confirmation, repeating request");
                metrics::HANDSHAKE_CONFIRMATIONS.inc();
                drop(first);
                self.send(
                    self.client
                        .get(endpoint)
                        .query(&[("id", file_id), ("confirm", token.as_str())]),
                    cancel,
                )
                .await
            }
            None => Ok(first),
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response, DownloadError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            response = request.send() => response.map_err(|e| DownloadError::transport(&e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        Ok(response)
    }
}

/// Sends without waiting; a slow or gone consumer never stalls the transfer.
fn emit(progress: Option<&mpsc::Sender<ProgressEvent>>, event: ProgressEvent) {
    let Some(tx) = progress else {
        return;
    };
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => debug!("Progress channel full, dropping update"),
        Err(TrySendError::Closed(_)) => debug!("Progress channel closed, dropping update"),
    }
}

/// Value of the first cookie whose name starts with `prefix`.
fn confirm_token(response: &Response, prefix: &str) -> Option<String> {
    response
        .cookies()
        .find(|c| c.name().starts_with(prefix))
        .map(|c| c.value().to_string())
}

/// Extracts a safe file name from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*=` form over plain `filename=`.
pub fn content_disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;

    for part in value.split(';').map(str::trim) {
        if let Some(encoded) = strip_prefix_ignore_case(part, "filename*=") {
            // charset'language'percent-encoded
            let encoded = encoded.trim_matches('"');
            let encoded = encoded.splitn(3, '\'').nth(2).unwrap_or(encoded);
            if let Some(name) = urlencoding::decode(encoded)
                .ok()
                .and_then(|decoded| sanitize_file_name(&decoded))
            {
                return Some(name);
            }
        } else if let Some(raw) = strip_prefix_ignore_case(part, "filename=") {
            plain = sanitize_file_name(raw.trim().trim_matches('"'));
        }
    }

    plain
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="clip.avi""#),
            Some("clip.avi".to_string())
        );
        assert_eq!(
            content_disposition_filename("attachment; FILENAME=report.pdf"),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn test_content_disposition_extended_wins() {
        let value = r#"attachment; filename="fallback.bin"; filename*=UTF-8''my%20video.mkv"#;
        assert_eq!(
            content_disposition_filename(value),
            Some("my video.mkv".to_string())
        );
    }

    #[test]
    fn test_content_disposition_rejects_traversal() {
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="../../etc/passwd""#),
            Some(".._.._etc_passwd".to_string())
        );
        assert_eq!(content_disposition_filename(r#"attachment; filename="""#), None);
        assert_eq!(content_disposition_filename("inline"), None);
    }
}
