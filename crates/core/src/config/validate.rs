use reqwest::Url;

use super::{types::Config, ConfigError};

const MIN_CHUNK_SIZE: usize = 16 * 1024;
const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Validate configuration
/// Currently validates:
/// - Bot token and allow-list are present (sections enforced by serde)
/// - The Bot API request timeout outlasts the long-poll wait
/// - Chunk size and progress interval are sane
/// - Inline video threshold is positive
/// - Export endpoint is an http(s) URL
/// - At least one video extension is configured
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.bot_token.trim().is_empty() {
        return Err(invalid("telegram.bot_token cannot be empty"));
    }

    let telegram = &config.telegram;
    if telegram.timeout_secs <= telegram.poll_timeout_secs {
        return Err(invalid(format!(
            "telegram.timeout_secs ({}) must be greater than telegram.poll_timeout_secs ({})",
            telegram.timeout_secs, telegram.poll_timeout_secs
        )));
    }

    if config.auth.allowed_user_ids.is_empty() {
        return Err(invalid("auth.allowed_user_ids cannot be empty"));
    }

    let chunk = config.downloader.chunk_size;
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk) {
        return Err(invalid(format!(
            "downloader.chunk_size must be between {} and {} bytes, got {}",
            MIN_CHUNK_SIZE, MAX_CHUNK_SIZE, chunk
        )));
    }

    if config.downloader.progress_every_chunks == 0 {
        return Err(invalid("downloader.progress_every_chunks cannot be 0"));
    }

    if config.delivery.inline_video_max_bytes == 0 {
        return Err(invalid("delivery.inline_video_max_bytes cannot be 0"));
    }

    match Url::parse(&config.source.export_endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return Err(invalid(format!(
                "source.export_endpoint is not an http(s) URL: {}",
                config.source.export_endpoint
            )))
        }
    }

    if config.converter.video_extensions.is_empty() {
        return Err(invalid("converter.video_extensions cannot be empty"));
    }

    Ok(())
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(reason.into())
}
