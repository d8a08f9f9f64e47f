use std::env;

pub const DEFAULT_BASE_URL: &str = "https://app.terraform.io";

/// Connection settings from the environment. A missing token or organization
/// is not rejected here; the first API call surfaces it.
#[derive(Debug, Clone)]
pub struct Config {
    /// `TFC_TOKEN`, an API bearer token.
    pub token: String,
    /// `TFC_URL`, defaulting to the public Terraform Cloud endpoint.
    pub base_url: String,
    /// `TFC_ORG`, the organization to operate on.
    pub org: String,
}

impl Config {
    pub fn from_env() -> Config {
        let token = env::var("TFC_TOKEN").unwrap_or_default();
        let org = env::var("TFC_ORG").unwrap_or_default();
        let base_url = env::var("TFC_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if token.is_empty() {
            tracing::warn!("TFC_TOKEN is not set; API requests will fail authentication");
        }
        if org.is_empty() {
            tracing::warn!("TFC_ORG is not set; workspace listing will fail");
        }
        Config {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            org,
        }
    }
}
