//! API Configuration Module
//!
//! Configuration for CORS, absolute URL construction, pagination limits,
//! relationship serialisation and the backing store. Everything is loaded
//! from environment variables with defaults suitable for development.

use std::path::PathBuf;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, link building and pagination.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Link Configuration
    // ========================================================================
    /// Fixed base for absolute URLs, e.g. `https://marina.example.com`.
    /// When unset, links are built from the request's `Host` header.
    pub public_base_url: Option<String>,

    /// Scheme used with the `Host` header when no base URL is configured.
    pub url_scheme: String,

    // ========================================================================
    // Behaviour
    // ========================================================================
    /// Serialise relationship transitions per boat.
    pub serialize_relationships: bool,

    /// Upper bound on the number of entities a single listing scans.
    pub page_size_max: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours
            public_base_url: None,
            url_scheme: "http".to_string(),
            serialize_relationships: true,
            page_size_max: 100,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `MARINA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `MARINA_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `MARINA_PUBLIC_BASE_URL`: Base for absolute URLs (default: from Host header)
    /// - `MARINA_URL_SCHEME`: Scheme paired with the Host header (default: http)
    /// - `MARINA_SERIALIZE_RELATIONSHIPS`: "true" or "false" (default: true)
    /// - `MARINA_PAGE_SIZE_MAX`: Largest page a listing returns (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("MARINA_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("MARINA_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let public_base_url = std::env::var("MARINA_PUBLIC_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let url_scheme = std::env::var("MARINA_URL_SCHEME")
            .ok()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| s == "http" || s == "https")
            .unwrap_or(defaults.url_scheme);

        let serialize_relationships = std::env::var("MARINA_SERIALIZE_RELATIONSHIPS")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.serialize_relationships);

        let page_size_max = std::env::var("MARINA_PAGE_SIZE_MAX")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.page_size_max);

        Self {
            cors_origins,
            cors_max_age_secs,
            public_base_url,
            url_scheme,
            serialize_relationships,
            page_size_max,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.example.com
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern))
                        || origin_domain == pattern;
                }
            }
            false
        })
    }
}

// ============================================================================
// STORE CONFIGURATION
// ============================================================================

/// Which document store backs the service.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// LMDB directory. `None` selects the in-memory store.
    pub path: Option<PathBuf>,

    /// LMDB map size in megabytes.
    pub max_size_mb: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_size_mb: 1024,
        }
    }
}

impl StoreConfig {
    /// Environment variables:
    /// - `MARINA_STORE_PATH`: LMDB directory (unset = in-memory)
    /// - `MARINA_STORE_MAX_SIZE_MB`: LMDB map size (default: 1024)
    pub fn from_env() -> Self {
        let path = std::env::var("MARINA_STORE_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let max_size_mb = std::env::var("MARINA_STORE_MAX_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1024);

        Self { path, max_size_mb }
    }
}
