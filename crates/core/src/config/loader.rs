use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// `UPLINK_TELEGRAM__BOT_TOKEN` overrides `telegram.bot_token`, and so on.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("UPLINK_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[telegram]
bot_token = "123:abc"

[auth]
allowed_user_ids = [42]

[delivery]
inline_video_max_bytes = 1000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.auth.allowed_user_ids, vec![42]);
        assert_eq!(config.delivery.inline_video_max_bytes, 1000);
    }

    #[test]
    fn test_load_config_from_str_missing_telegram() {
        let toml = r#"
[auth]
allowed_user_ids = [1]
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/uplink.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[telegram]
bot_token = "from-file"

[auth]
allowed_user_ids = [7, 8]

[downloader]
chunk_size = 65536
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.telegram.bot_token, "from-file");
        assert_eq!(config.downloader.chunk_size, 65536);
        assert_eq!(config.downloader.progress_every_chunks, 10);
    }
}
