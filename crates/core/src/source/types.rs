//! Types for source resolution.

use reqwest::Url;

use super::error::SourceError;

/// How a source will be fetched.
///
/// A plan carrying a provider file id is two-phase: the downloader first
/// asks the export endpoint for the file, then repeats the request with the
/// confirmation token if the provider set one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    primary_endpoint: Url,
    provider_file_id: Option<String>,
}

impl FetchPlan {
    /// A single-phase plan fetching `url` verbatim.
    pub fn direct(url: Url) -> Self {
        Self {
            primary_endpoint: url,
            provider_file_id: None,
        }
    }

    /// A two-phase plan against the provider export endpoint.
    pub fn two_phase(export_endpoint: Url, file_id: impl Into<String>) -> Result<Self, SourceError> {
        let file_id = file_id.into();
        if file_id.is_empty() {
            return Err(SourceError::Unresolvable {
                url: export_endpoint.to_string(),
            });
        }
        Ok(Self {
            primary_endpoint: export_endpoint,
            provider_file_id: Some(file_id),
        })
    }

    pub fn primary_endpoint(&self) -> &Url {
        &self.primary_endpoint
    }

    pub fn provider_file_id(&self) -> Option<&str> {
        self.provider_file_id.as_deref()
    }

    pub fn is_two_phase(&self) -> bool {
        self.provider_file_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_plan() {
        let url = Url::parse("https://example.com/a.bin").unwrap();
        let plan = FetchPlan::direct(url.clone());
        assert!(!plan.is_two_phase());
        assert_eq!(plan.primary_endpoint(), &url);
        assert_eq!(plan.provider_file_id(), None);
    }

    #[test]
    fn test_two_phase_rejects_empty_id() {
        let url = Url::parse("https://docs.google.com/uc?export=download").unwrap();
        assert!(FetchPlan::two_phase(url.clone(), "").is_err());

        let plan = FetchPlan::two_phase(url, "abc").unwrap();
        assert!(plan.is_two_phase());
        assert_eq!(plan.provider_file_id(), Some("abc"));
    }
}
