use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::ConverterConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Bot API base URL (override for a local Bot API server)
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds (uploads can be slow)
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
    /// Long-poll wait passed to `getUpdates`; must stay below `timeout_secs`
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    600
}

fn default_poll_timeout() -> u64 {
    30
}

/// Static allow-list of chat users permitted to trigger uploads
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub allowed_user_ids: Vec<i64>,
}

/// HTTP client configuration for source downloads
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds (0 disables it)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    0
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("uplink/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Storage-provider recognition and handshake settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Hosts (and their subdomains) treated as the storage provider
    #[serde(default = "default_provider_domains")]
    pub provider_domains: Vec<String>,
    /// Export endpoint queried with `id=` (and `confirm=` on the second pass)
    #[serde(default = "default_export_endpoint")]
    pub export_endpoint: String,
    /// Cookie name prefix carrying the large-file confirmation token
    #[serde(default = "default_confirm_cookie_prefix")]
    pub confirm_cookie_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider_domains: default_provider_domains(),
            export_endpoint: default_export_endpoint(),
            confirm_cookie_prefix: default_confirm_cookie_prefix(),
        }
    }
}

fn default_provider_domains() -> Vec<String> {
    vec!["drive.google.com".to_string(), "docs.google.com".to_string()]
}

fn default_export_endpoint() -> String {
    "https://docs.google.com/uc?export=download".to_string()
}

fn default_confirm_cookie_prefix() -> String {
    "download_warning".to_string()
}

/// Streaming download settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Bytes per write to the destination file
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Emit a progress event every N chunks (and once on completion)
    #[serde(default = "default_progress_every_chunks")]
    pub progress_every_chunks: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            progress_every_chunks: default_progress_every_chunks(),
        }
    }
}

fn default_chunk_size() -> usize {
    256 * 1024
}

fn default_progress_every_chunks() -> u64 {
    10
}

/// Delivery mode selection and upload options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Videos strictly below this size are sent inline; everything else as a document
    #[serde(default = "default_inline_video_max_bytes")]
    pub inline_video_max_bytes: u64,
    #[serde(default = "default_disable_notification")]
    pub disable_notification: bool,
    /// Optional caption attached to every upload
    #[serde(default)]
    pub caption: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            inline_video_max_bytes: default_inline_video_max_bytes(),
            disable_notification: default_disable_notification(),
            caption: None,
        }
    }
}

fn default_inline_video_max_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_disable_notification() -> bool {
    true
}

/// Where per-run workspaces are created
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,
    /// Thumbnails set with `/setthumb`, one file per user
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            thumbnail_dir: default_thumbnail_dir(),
        }
    }
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_thumbnail_dir() -> PathBuf {
    PathBuf::from("thumbnails")
}

/// Sanitized config for logging (bot token redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub allowed_users: usize,
    pub http: HttpConfig,
    pub source: SourceConfig,
    pub downloader: DownloaderConfig,
    pub converter: ConverterConfig,
    pub delivery: DeliveryConfig,
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_base: String,
    pub bot_token_configured: bool,
    pub timeout_secs: u64,
    pub poll_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            telegram: SanitizedTelegramConfig {
                api_base: config.telegram.api_base.clone(),
                bot_token_configured: !config.telegram.bot_token.is_empty(),
                timeout_secs: config.telegram.timeout_secs,
                poll_timeout_secs: config.telegram.poll_timeout_secs,
            },
            allowed_users: config.auth.allowed_user_ids.len(),
            http: config.http.clone(),
            source: config.source.clone(),
            downloader: config.downloader.clone(),
            converter: config.converter.clone(),
            delivery: config.delivery.clone(),
            workspace: config.workspace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[telegram]
bot_token = "123:secret"

[auth]
allowed_user_ids = [1001]
"#;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.delivery.inline_video_max_bytes, 52_428_800);
        assert!(config.delivery.disable_notification);
        assert_eq!(config.downloader.chunk_size, 256 * 1024);
        assert_eq!(config.source.confirm_cookie_prefix, "download_warning");
        assert_eq!(config.source.provider_domains.len(), 2);
        assert_eq!(config.converter.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.workspace.thumbnail_dir, PathBuf::from("thumbnails"));
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let toml = r#"
[telegram]
bot_token = "x"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_custom_sections() {
        let toml = r#"
[telegram]
bot_token = "t"
api_base = "http://localhost:8081"

[auth]
allowed_user_ids = [1, 2, 3]

[source]
provider_domains = ["drive.example.com"]
export_endpoint = "http://localhost:9000/uc?export=download"

[converter]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
video_extensions = ["mp4", "mkv"]

[workspace]
temp_root = "/var/tmp/uplink"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.telegram.api_base, "http://localhost:8081");
        assert_eq!(config.source.provider_domains, vec!["drive.example.com"]);
        assert_eq!(
            config.converter.ffmpeg_path,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.converter.video_extensions.len(), 2);
        assert_eq!(config.workspace.temp_root, PathBuf::from("/var/tmp/uplink"));
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.telegram.bot_token_configured);
        assert_eq!(sanitized.allowed_users, 1);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("123:secret"));
    }
}
