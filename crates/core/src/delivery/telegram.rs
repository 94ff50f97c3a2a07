//! Telegram Bot API client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::TelegramConfig;

use super::error::DeliveryError;
use super::traits::ChatPlatform;
use super::types::{ChatTarget, MessageHandle, Upload};
use super::updates::Update;

/// [`ChatPlatform`] backed by the Telegram Bot API.
pub struct TelegramClient {
    client: Client,
    api_base: String,
    bot_token: String,
    poll_timeout_secs: u64,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
    chat: ApiChat,
}

#[derive(Debug, Deserialize)]
struct ApiChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    file_path: Option<String>,
}

impl From<ApiMessage> for MessageHandle {
    fn from(m: ApiMessage) -> Self {
        Self {
            chat_id: m.chat.id,
            message_id: m.message_id,
        }
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(DeliveryError::transport)?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    /// Long-polls for updates with an id of at least `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, DeliveryError> {
        let mut form = Form::new()
            .text("timeout", self.poll_timeout_secs.to_string())
            .text("allowed_updates", r#"["message"]"#);
        if let Some(offset) = offset {
            form = form.text("offset", offset.to_string());
        }

        self.call("getUpdates", form).await
    }

    /// Fetches a file sent to the bot (e.g. a photo) into `destination`.
    /// Returns the number of bytes written.
    pub async fn download_file(
        &self,
        file_id: &str,
        destination: &Path,
    ) -> Result<u64, DeliveryError> {
        let file: ApiFile = self
            .call("getFile", Form::new().text("file_id", file_id.to_string()))
            .await?;
        let file_path = file.file_path.ok_or_else(|| {
            DeliveryError::UnexpectedResponse("file has no download path".to_string())
        })?;

        let url = format!("{}/file/bot{}/{}", self.api_base, self.bot_token, file_path);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DeliveryError::transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Platform {
                code: status.as_u16() as i64,
                description: status
                    .canonical_reason()
                    .unwrap_or("file download failed")
                    .to_string(),
            });
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DeliveryError::io(parent, e))?;
        }
        let mut out = tokio::fs::File::create(destination)
            .await
            .map_err(|e| DeliveryError::io(destination, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DeliveryError::transport(e.without_url()))?
        {
            out.write_all(&chunk)
                .await
                .map_err(|e| DeliveryError::io(destination, e))?;
            written += chunk.len() as u64;
        }
        out.flush()
            .await
            .map_err(|e| DeliveryError::io(destination, e))?;

        debug!(file_id, bytes = written, "Downloaded file from Bot API");
        Ok(written)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// Posts `form` to `method` and unwraps the response envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T, DeliveryError> {
        debug!(method, "Calling Bot API");

        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::transport(e.without_url()))?;

        let status = response.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(DeliveryError::PayloadTooLarge);
        }

        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::transport(e.without_url()))?;

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|_| {
            DeliveryError::UnexpectedResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(100).collect::<String>()
            ))
        })?;

        if !envelope.ok {
            let code = envelope.error_code.unwrap_or(status.as_u16() as i64);
            if code == 413 {
                return Err(DeliveryError::PayloadTooLarge);
            }
            return Err(DeliveryError::Platform {
                code,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope
            .result
            .ok_or_else(|| DeliveryError::UnexpectedResponse("missing result".to_string()))
    }

    async fn file_part(path: &Path, file_name: &str) -> Result<Part, DeliveryError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| DeliveryError::io(path, e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| DeliveryError::io(path, e))?
            .len();

        Ok(Part::stream_with_length(Body::from(file), len).file_name(file_name.to_string()))
    }

    async fn upload_form(
        target: &ChatTarget,
        field: &str,
        upload: &Upload,
    ) -> Result<Form, DeliveryError> {
        let mut form = Form::new()
            .text("chat_id", target.chat_id.to_string())
            .part(
                field.to_string(),
                Self::file_part(&upload.path, &upload.file_name).await?,
            );

        if let Some(caption) = &upload.caption {
            form = form.text("caption", caption.clone());
        }
        if upload.disable_notification {
            form = form.text("disable_notification", "true");
        }

        Ok(form)
    }
}

#[async_trait]
impl ChatPlatform for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_message(
        &self,
        target: &ChatTarget,
        text: &str,
    ) -> Result<MessageHandle, DeliveryError> {
        let form = Form::new()
            .text("chat_id", target.chat_id.to_string())
            .text("text", text.to_string());

        let message: ApiMessage = self.call("sendMessage", form).await?;
        Ok(message.into())
    }

    async fn edit_message(&self, handle: &MessageHandle, text: &str) -> Result<(), DeliveryError> {
        let form = Form::new()
            .text("chat_id", handle.chat_id.to_string())
            .text("message_id", handle.message_id.to_string())
            .text("text", text.to_string());

        // Result is the edited message, or `true` for inline messages.
        let _: serde_json::Value = self.call("editMessageText", form).await?;
        Ok(())
    }

    async fn send_video(
        &self,
        target: &ChatTarget,
        upload: Upload,
    ) -> Result<MessageHandle, DeliveryError> {
        let form = Self::upload_form(target, "video", &upload)
            .await?
            .text("supports_streaming", "true");

        let message: ApiMessage = self.call("sendVideo", form).await?;
        Ok(message.into())
    }

    async fn send_document(
        &self,
        target: &ChatTarget,
        upload: Upload,
    ) -> Result<MessageHandle, DeliveryError> {
        let mut form = Self::upload_form(target, "document", &upload).await?;

        if let Some(thumb) = &upload.thumbnail {
            let name = thumb
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "thumb.jpg".to_string());
            form = form.part("thumbnail", Self::file_part(thumb, &name).await?);
        }

        let message: ApiMessage = self.call("sendDocument", form).await?;
        Ok(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_base: server.uri(),
            timeout_secs: 10,
            poll_timeout_secs: 1,
        })
        .unwrap()
    }

    fn ok_message(message_id: i64) -> serde_json::Value {
        serde_json::json!({
            "ok": true,
            "result": { "message_id": message_id, "chat": { "id": 42 } }
        })
    }

    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_message(5)))
            .expect(1)
            .mount(&server)
            .await;

        let handle = client(&server)
            .send_message(&ChatTarget::new(42), "hello")
            .await
            .unwrap();

        assert_eq!(
            handle,
            MessageHandle {
                chat_id: 42,
                message_id: 5
            }
        );
    }

    #[tokio::test]
    async fn test_api_error_maps_to_platform() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/editMessageText"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 3"
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .edit_message(
                &MessageHandle {
                    chat_id: 42,
                    message_id: 5,
                },
                "50%",
            )
            .await;

        match result {
            Err(DeliveryError::Platform { code, description }) => {
                assert_eq!(code, 429);
                assert!(description.starts_with("Too Many Requests"));
            }
            other => panic!("expected platform error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_413_is_payload_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendDocument"))
            .respond_with(ResponseTemplate::new(413))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.bin");
        tokio::fs::write(&file, vec![0u8; 64]).await.unwrap();

        let result = client(&server)
            .send_document(
                &ChatTarget::new(42),
                Upload {
                    path: file,
                    file_name: "big.bin".to_string(),
                    size_bytes: 64,
                    caption: None,
                    thumbnail: None,
                    disable_notification: true,
                },
            )
            .await;

        assert!(matches!(result, Err(DeliveryError::PayloadTooLarge)));
    }

    #[tokio::test]
    async fn test_send_video_uploads_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendVideo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_message(9)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        tokio::fs::write(&file, b"mp4 bytes").await.unwrap();

        let handle = client(&server)
            .send_video(
                &ChatTarget::new(42),
                Upload {
                    path: file,
                    file_name: "clip.mp4".to_string(),
                    size_bytes: 9,
                    caption: Some("via uplink".to_string()),
                    thumbnail: None,
                    disable_notification: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(handle.message_id, 9);

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("supports_streaming"));
        assert!(body.contains("filename=\"clip.mp4\""));
        assert!(body.contains("mp4 bytes"));
    }

    #[tokio::test]
    async fn test_get_updates_sends_offset_and_parses_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [{
                    "update_id": 11,
                    "message": {
                        "message_id": 1,
                        "chat": { "id": 42 },
                        "from": { "id": 7 },
                        "text": "https://example.com/a.zip"
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = client(&server).get_updates(Some(11)).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 11);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.text.as_deref(), Some("https://example.com/a.zip"));

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"offset\""));
        assert!(body.contains("name=\"timeout\""));
    }

    #[tokio::test]
    async fn test_download_file_resolves_path_and_writes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getFile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "file_id": "ph1", "file_path": "photos/file_3.jpg" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file/bot123:abc/photos/file_3.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg data".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("thumbs").join("thumb_7.jpg");
        let written = client(&server).download_file("ph1", &dest).await.unwrap();

        assert_eq!(written, 9);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"jpeg data");
    }

    #[tokio::test]
    async fn test_missing_upload_file_is_io_error() {
        let server = MockServer::start().await;
        let result = client(&server)
            .send_document(
                &ChatTarget::new(42),
                Upload {
                    path: "/nonexistent/file.bin".into(),
                    file_name: "file.bin".to_string(),
                    size_bytes: 0,
                    caption: None,
                    thumbnail: None,
                    disable_notification: true,
                },
            )
            .await;

        assert!(matches!(result, Err(DeliveryError::Io { .. })));
    }
}
