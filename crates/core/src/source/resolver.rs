//! URL to fetch-plan resolution.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Url;
use tracing::debug;

use crate::config::SourceConfig;

use super::error::SourceError;
use super::types::FetchPlan;

/// Display name used when a URL carries no usable file name.
pub const FALLBACK_FILE_NAME: &str = "downloaded_file";

static FILE_PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("valid file id regex"));

/// Resolves user-supplied URLs into [`FetchPlan`]s.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    provider_domains: Vec<String>,
    export_endpoint: Url,
}

impl SourceResolver {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let export_endpoint = Url::parse(&config.export_endpoint)
            .map_err(|e| SourceError::invalid_url(format!("export endpoint: {}", e)))?;

        Ok(Self {
            provider_domains: config
                .provider_domains
                .iter()
                .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            export_endpoint,
        })
    }

    pub fn with_defaults() -> Result<Self, SourceError> {
        Self::new(&SourceConfig::default())
    }

    /// Resolves `input` into a fetch plan.
    ///
    /// Direct plans carry the input as parsed by [`Url`]: the host is
    /// lowercased, a bare origin gains a `/` path, dot segments are resolved
    /// and unsafe characters are percent-encoded. The request is the same
    /// one the raw input describes. Provider links must yield a file id; they
    /// never fall back to a direct fetch.
    pub fn resolve(&self, input: &str) -> Result<FetchPlan, SourceError> {
        let url = parse_http_url(input)?;

        if !self.is_provider_host(&url) {
            debug!(url = %url, "Resolved direct fetch plan");
            return Ok(FetchPlan::direct(url));
        }

        let file_id = extract_file_id(&url).ok_or_else(|| SourceError::Unresolvable {
            url: url.to_string(),
        })?;

        debug!(file_id = %file_id, "Resolved provider fetch plan");
        FetchPlan::two_phase(self.export_endpoint.clone(), file_id)
    }

    fn is_provider_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.provider_domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
    }
}

fn parse_http_url(input: &str) -> Result<Url, SourceError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|e| SourceError::invalid_url(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::invalid_url(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SourceError::invalid_url("missing host"));
    }

    Ok(url)
}

/// Extracts the provider file id from `/file/d/{id}/...` or `?id={id}`.
fn extract_file_id(url: &Url) -> Option<String> {
    if url.path().contains("/file/d/") {
        return FILE_PATH_ID
            .captures(url.path())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
    }

    url.query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Derives a display file name from the last path segment of `url`.
///
/// The query string is ignored and the segment is percent-decoded. Returns
/// [`FALLBACK_FILE_NAME`] when nothing usable remains.
pub fn suggested_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .and_then(|name| sanitize_file_name(&name))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Reduces `raw` to a single path component safe to join onto a workspace.
///
/// Separators become `_`; blank names and `.`/`..` are rejected.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw.replace(['/', '\\', '\0'], "_").trim().to_string();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SourceResolver {
        SourceResolver::with_defaults().unwrap()
    }

    #[test]
    fn test_direct_url_is_verbatim() {
        let input = "https://example.com/files/clip.avi?token=abc&x=1";
        let plan = resolver().resolve(input).unwrap();
        assert!(!plan.is_two_phase());
        assert_eq!(plan.primary_endpoint().as_str(), input);
    }

    #[test]
    fn test_direct_url_is_url_normalized() {
        let cases = [
            ("https://example.com", "https://example.com/"),
            ("https://EXAMPLE.com/a b.zip", "https://example.com/a%20b.zip"),
            ("https://example.com/x/../clip.avi", "https://example.com/clip.avi"),
            ("  https://example.com/a.zip  ", "https://example.com/a.zip"),
        ];
        for (input, expected) in cases {
            let plan = resolver().resolve(input).unwrap();
            assert_eq!(plan.primary_endpoint().as_str(), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_http_scheme_accepted() {
        let plan = resolver().resolve("http://example.com/a.zip").unwrap();
        assert_eq!(plan.primary_endpoint().scheme(), "http");
    }

    #[test]
    fn test_drive_path_form() {
        let plan = resolver()
            .resolve("https://drive.google.com/file/d/1AbC-d_E/view?usp=sharing")
            .unwrap();
        assert!(plan.is_two_phase());
        assert_eq!(plan.provider_file_id(), Some("1AbC-d_E"));
        assert_eq!(plan.primary_endpoint().host_str(), Some("docs.google.com"));
    }

    #[test]
    fn test_drive_query_form() {
        let plan = resolver()
            .resolve("https://drive.google.com/open?id=XYZ987")
            .unwrap();
        assert_eq!(plan.provider_file_id(), Some("XYZ987"));

        let plan = resolver()
            .resolve("https://docs.google.com/uc?export=download&id=QQQ")
            .unwrap();
        assert_eq!(plan.provider_file_id(), Some("QQQ"));
    }

    #[test]
    fn test_provider_without_id_is_unresolvable() {
        for input in [
            "https://drive.google.com/file/d/",
            "https://drive.google.com/file/d//view",
            "https://drive.google.com/drive/folders",
            "https://drive.google.com/open?id=",
        ] {
            let result = resolver().resolve(input);
            assert!(
                matches!(result, Err(SourceError::Unresolvable { .. })),
                "expected unresolvable for {}",
                input
            );
        }
    }

    #[test]
    fn test_provider_host_is_case_insensitive() {
        let plan = resolver()
            .resolve("https://DRIVE.Google.com/file/d/abc/view")
            .unwrap();
        assert_eq!(plan.provider_file_id(), Some("abc"));
    }

    #[test]
    fn test_lookalike_host_is_direct() {
        let plan = resolver()
            .resolve("https://notdrive.google.com.evil.test/file/d/abc/view")
            .unwrap();
        assert!(!plan.is_two_phase());
    }

    #[test]
    fn test_invalid_urls() {
        for input in ["", "not a url", "ftp://example.com/file", "file:///etc/passwd"] {
            let result = resolver().resolve(input);
            assert!(
                matches!(result, Err(SourceError::InvalidUrl { .. })),
                "expected invalid for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_custom_provider_domain() {
        let config = SourceConfig {
            provider_domains: vec!["files.example.org".to_string()],
            export_endpoint: "http://127.0.0.1:9/uc?export=download".to_string(),
            confirm_cookie_prefix: "download_warning".to_string(),
        };
        let resolver = SourceResolver::new(&config).unwrap();
        let plan = resolver
            .resolve("https://files.example.org/file/d/id42/view")
            .unwrap();
        assert_eq!(plan.provider_file_id(), Some("id42"));
        assert_eq!(plan.primary_endpoint().host_str(), Some("127.0.0.1"));

        let plan = resolver
            .resolve("https://drive.google.com/file/d/id42/view")
            .unwrap();
        assert!(!plan.is_two_phase());
    }

    #[test]
    fn test_suggested_file_name() {
        let url = Url::parse("https://example.com/a/b/clip.avi?x=1").unwrap();
        assert_eq!(suggested_file_name(&url), "clip.avi");

        let url = Url::parse("https://example.com/my%20movie.mkv").unwrap();
        assert_eq!(suggested_file_name(&url), "my movie.mkv");

        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(suggested_file_name(&url), FALLBACK_FILE_NAME);

        let url = Url::parse("https://example.com/evil%2F..%2Fname.txt").unwrap();
        assert_eq!(suggested_file_name(&url), "evil_.._name.txt");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name(" clip.mp4 "), Some("clip.mp4".to_string()));
        assert_eq!(sanitize_file_name("../etc/passwd"), Some(".._etc_passwd".to_string()));
        assert_eq!(sanitize_file_name("a\\b"), Some("a_b".to_string()));
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("   "), None);
    }
}
