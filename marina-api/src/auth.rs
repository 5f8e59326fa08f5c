//! Authentication Module
//!
//! Verifies the bearer tokens (OpenID Connect ID tokens, i.e. JWTs) callers
//! present in `Authorization: Bearer <token>`. A verified token yields an
//! `AuthContext` whose `subject` is the caller's stable identity; boat
//! ownership is keyed on it.
//!
//! Verification is behind the `IdentityVerifier` trait. The shipped
//! implementation checks HS256 signatures against a shared secret or RS256
//! signatures against a configured public key. It does not fetch JWKS.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// Time checks are done here rather than inside `jsonwebtoken` so tests can
/// pin the clock.
pub trait JwtClock: Send + Sync {
    /// Current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}


// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// JWT secret that never shows up in logs or `Debug` output.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::internal_error("JWT secret must not be empty"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 tokens.
    pub jwt_secret: JwtSecret,

    /// PEM-encoded RSA public key. When set, tokens are verified as RS256.
    pub jwt_public_key_pem: Option<String>,

    /// Signature algorithm expected on incoming tokens.
    pub jwt_algorithm: Algorithm,

    /// Required `iss` claim, if any.
    pub jwt_issuer: Option<String>,

    /// Required `aud` claim, if any.
    pub jwt_audience: Option<String>,

    /// Lifetime of tokens minted by `generate_jwt_token`.
    pub jwt_expiration_secs: i64,

    /// Tolerance applied to `exp` and `nbf`.
    pub jwt_clock_skew_secs: i64,

    /// Clock used for time validation.
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_public_key_pem", &self.jwt_public_key_pem.as_ref().map(|_| "[PEM]"))
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: build_jwt_secret(String::new()),
            jwt_public_key_pem: None,
            jwt_algorithm: Algorithm::HS256,
            jwt_issuer: None,
            jwt_audience: None,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `MARINA_JWT_SECRET`: HS256 shared secret
    /// - `MARINA_JWT_PUBLIC_KEY_PEM`: RSA public key; switches verification to RS256
    /// - `MARINA_JWT_ISSUER`: Required `iss` claim (e.g. `https://accounts.google.com`)
    /// - `MARINA_JWT_AUDIENCE`: Required `aud` claim (the OAuth client id)
    /// - `MARINA_JWT_CLOCK_SKEW_SECS`: Clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let secret_str = std::env::var("MARINA_JWT_SECRET").unwrap_or_default();

        let jwt_public_key_pem = std::env::var("MARINA_JWT_PUBLIC_KEY_PEM")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let jwt_algorithm = if jwt_public_key_pem.is_some() {
            Algorithm::RS256
        } else {
            Algorithm::HS256
        };

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_public_key_pem,
            jwt_algorithm,
            jwt_issuer: std::env::var("MARINA_JWT_ISSUER")
                .ok()
                .filter(|s| !s.is_empty()),
            jwt_audience: std::env::var("MARINA_JWT_AUDIENCE")
                .ok()
                .filter(|s| !s.is_empty()),
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: std::env::var("MARINA_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// Refuse insecure HS256 secrets when `MARINA_ENVIRONMENT` is production.
    /// In development the problems are logged and startup continues.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        if self.jwt_algorithm != Algorithm::HS256 {
            return Ok(());
        }

        let environment = std::env::var("MARINA_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();
        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::internal_error(format!(
                    "Cannot start server in production with insecure JWT secret. \
                     Set MARINA_JWT_SECRET to a secure value. MARINA_ENVIRONMENT={}",
                    environment
                )));
            }
            tracing::warn!(
                "Using insecure default JWT secret. Set MARINA_JWT_SECRET \
                 (at least 32 characters) before deploying."
            );
        } else if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::internal_error(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            }
            tracing::warn!(
                secret_len = self.jwt_secret.len(),
                "JWT secret is short; use at least 32 characters in production"
            );
        }

        Ok(())
    }

    fn decoding_key(&self) -> ApiResult<DecodingKey> {
        match &self.jwt_public_key_pem {
            Some(pem) => DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                ApiError::internal_error(format!("Invalid JWT public key: {}", e))
            }),
            None => Ok(DecodingKey::from_secret(self.jwt_secret.expose().as_bytes())),
        }
    }
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into())),
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// Claims read from an identity token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the stable external identity id.
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    pub fn new(subject: String, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();
        Self {
            sub: subject,
            exp: now + expiration_secs,
            iat: Some(now),
            nbf: None,
            iss: None,
            aud: None,
            email: None,
        }
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        clock.now_epoch_secs() > self.exp
    }
}

// ============================================================================
// AUTH CONTEXT
// ============================================================================

/// Verified caller identity, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Stable external identity id (the token's `sub`).
    pub subject: String,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
        }
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
        }
    }
}

// ============================================================================
// TOKEN VALIDATION
// ============================================================================

fn validate_claim_times(now: i64, exp: i64, nbf: Option<i64>, leeway_secs: i64) -> ApiResult<()> {
    if let Some(nbf) = nbf {
        if now + leeway_secs < nbf {
            return Err(ApiError::invalid_token("Token not yet valid (nbf)"));
        }
    }

    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }

    Ok(())
}

fn validation_for(config: &AuthConfig) -> Validation {
    let mut validation = Validation::new(config.jwt_algorithm);
    // exp/nbf are checked against our own clock.
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

    if let Some(issuer) = &config.jwt_issuer {
        validation.set_issuer(&[issuer]);
    }
    match &config.jwt_audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }
    validation
}

fn decode_claims(
    config: &AuthConfig,
    decoding_key: &DecodingKey,
    token: &str,
) -> ApiResult<Claims> {
    let validation = validation_for(config);

    let token_data =
        decode::<Claims>(token, decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                ApiError::invalid_token("Token issuer is not accepted")
            }
            jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                ApiError::invalid_token("Token audience is not accepted")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(timestamp = now, "System clock returned pre-epoch time");
        return Err(ApiError::internal_error("Server time configuration error"));
    }

    validate_claim_times(now, claims.exp, claims.nbf, config.jwt_clock_skew_secs)?;

    if claims.sub.trim().is_empty() {
        return Err(ApiError::invalid_token("Token has an empty subject"));
    }

    Ok(claims)
}

/// Validate a JWT and return its claims.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = config.decoding_key()?;
    decode_claims(config, &decoding_key, token)
}

/// Mint an HS256 token for `subject`. Used for local development and tests.
pub fn generate_jwt_token(config: &AuthConfig, subject: String) -> ApiResult<String> {
    let mut claims = Claims::new(subject, config.jwt_expiration_secs, &*config.clock);
    claims.iss = config.jwt_issuer.clone();
    claims.aud = config.jwt_audience.clone();

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Strip the `Bearer ` scheme from an Authorization header value.
pub fn bearer_token(header_value: &str) -> ApiResult<&str> {
    let token = header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use the Bearer scheme"))?
        .trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("Bearer token is empty"));
    }
    Ok(token)
}

// ============================================================================
// IDENTITY VERIFIER
// ============================================================================

/// Turns a bearer token into a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> ApiResult<AuthContext>;
}

/// `IdentityVerifier` backed by local JWT signature checks.
pub struct JwtIdentityVerifier {
    config: AuthConfig,
    decoding_key: DecodingKey,
}

impl JwtIdentityVerifier {
    /// # Errors
    /// Returns error if the configured public key cannot be parsed.
    pub fn new(config: AuthConfig) -> ApiResult<Self> {
        let decoding_key = config.decoding_key()?;
        Ok(Self {
            config,
            decoding_key,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> ApiResult<AuthContext> {
        decode_claims(&self.config, &self.decoding_key, token).map(AuthContext::from)
    }
}
