//! Certificate-based client-credentials token flow
//!
//! The identity provider accepts a signed JWT client assertion in place of a
//! client secret. The assertion header carries the certificate thumbprint
//! (`x5t`) so the provider can pick the matching public key; the claims bind
//! the assertion to the token endpoint and expire after five minutes.
//!
//! [`TokenProvider`] caches the resulting bearer token and refreshes it
//! synchronously once it comes within the refresh window of its expiry. The
//! cache sits behind a single async mutex, so concurrent callers never observe
//! a half-written token and only one refresh is in flight at a time.

use crate::config::{secret_string, GraphConfig, SecretString};
use crate::domain::{DocsiftError, Result, ShutdownSignal};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Lifetime of a signed client assertion
const ASSERTION_LIFETIME_SECS: i64 = 5 * 60;

/// DER encoding of the rsaEncryption OID (1.2.840.113549.1.1.1)
const RSA_ENCRYPTION_OID: &[u8] = &[
    0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01,
];

/// A bearer token and its absolute expiry
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: secret_string(value.into()),
            expires_at,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value.expose_secret().as_ref())
    }

    /// Whether the token expires within `window` of `now`
    pub fn needs_refresh(&self, window: Duration, now: DateTime<Utc>) -> bool {
        let window =
            ChronoDuration::from_std(window).unwrap_or_else(|_| ChronoDuration::days(365));
        self.expires_at - now <= window
    }
}

/// Source of bearer tokens for outgoing requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a token that is valid for at least the refresh window
    async fn access_token(&self, signal: &ShutdownSignal) -> Result<AccessToken>;
}

/// A token issued out of band; never refreshed
pub struct StaticToken(AccessToken);

impl StaticToken {
    pub fn new(token: AccessToken) -> Self {
        Self(token)
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self, _signal: &ShutdownSignal) -> Result<AccessToken> {
        Ok(self.0.clone())
    }
}

/// Client identity backed by an X.509 certificate and its RSA private key
pub struct CertificateCredential {
    client_id: String,
    token_url: String,
    scope: String,
    signing_key: EncodingKey,
    thumbprint: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    aud: &'a str,
    iss: &'a str,
    sub: &'a str,
    jti: String,
    nbf: i64,
    exp: i64,
}

impl CertificateCredential {
    /// Load the certificate and key named in the configuration
    ///
    /// # Errors
    ///
    /// Returns [`DocsiftError::Configuration`] if either file is unreadable,
    /// the certificate PEM is malformed, or the key is not an RSA key.
    pub fn from_config(config: &GraphConfig) -> Result<Self> {
        let certificate = read_pem_file(&config.certificate_path, "certificate")?;
        let private_key = read_pem_file(&config.private_key_path, "private key")?;
        Self::from_pem(
            &config.client_id,
            &config.token_url(),
            &config.scope,
            &certificate,
            &private_key,
        )
    }

    /// Build a credential from PEM text
    pub fn from_pem(
        client_id: &str,
        token_url: &str,
        scope: &str,
        certificate_pem: &str,
        private_key_pem: &str,
    ) -> Result<Self> {
        let thumbprint = certificate_thumbprint(certificate_pem)?;
        let signing_key = load_rsa_signing_key(private_key_pem)?;

        Ok(Self {
            client_id: client_id.to_string(),
            token_url: token_url.to_string(),
            scope: scope.to_string(),
            signing_key,
            thumbprint,
        })
    }

    /// base64url(SHA-1(DER certificate))
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Sign a fresh client assertion
    pub fn client_assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            aud: &self.token_url,
            iss: &self.client_id,
            sub: &self.client_id,
            jti: uuid::Uuid::new_v4().to_string(),
            nbf: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.x5t = Some(self.thumbprint.clone());

        jsonwebtoken::encode(&header, &claims, &self.signing_key).map_err(|e| {
            DocsiftError::Authentication(format!("Failed to sign client assertion: {e}"))
        })
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
}

/// Caching token provider for the client-credentials flow
pub struct TokenProvider {
    http: reqwest::Client,
    credential: CertificateCredential,
    refresh_window: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        credential: CertificateCredential,
        refresh_window: Duration,
    ) -> Self {
        Self {
            http,
            credential,
            refresh_window,
            cached: Mutex::new(None),
        }
    }

    /// Replace the cached token
    pub async fn set_cached(&self, token: AccessToken) {
        *self.cached.lock().await = Some(token);
    }

    /// Return the cached token, refreshing it first if it is inside the
    /// refresh window
    pub async fn get_token(&self, signal: &ShutdownSignal) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.needs_refresh(self.refresh_window, Utc::now()) {
                return Ok(token.clone());
            }
            tracing::debug!(
                expires_at = %token.expires_at(),
                "Access token inside refresh window, refreshing"
            );
        }

        let token = tokio::select! {
            token = self.fetch() => token?,
            _ = signal.cancelled() => return Err(DocsiftError::Cancelled),
        };
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn fetch(&self) -> Result<AccessToken> {
        let assertion = self.credential.client_assertion()?;
        let form = [
            ("client_id", self.credential.client_id.as_str()),
            ("scope", self.credential.scope.as_str()),
            ("grant_type", "client_credentials"),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion.as_str()),
        ];

        let response = self
            .http
            .post(&self.credential.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                DocsiftError::Authentication(format!("Failed to reach token endpoint: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DocsiftError::Authentication(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            DocsiftError::Authentication(format!("Failed to decode token response: {e}"))
        })?;

        if !body.token_type.eq_ignore_ascii_case("bearer") {
            return Err(DocsiftError::Authentication(format!(
                "Invalid token_type: {}",
                body.token_type
            )));
        }

        let expires_at = Utc::now() + ChronoDuration::seconds(body.expires_in);
        tracing::info!(expires_at = %expires_at, "Acquired access token");

        Ok(AccessToken::new(body.access_token, expires_at))
    }
}

#[async_trait]
impl TokenSource for TokenProvider {
    async fn access_token(&self, signal: &ShutdownSignal) -> Result<AccessToken> {
        self.get_token(signal).await
    }
}

fn read_pem_file(path: &str, what: &str) -> Result<String> {
    std::fs::read_to_string(Path::new(path)).map_err(|e| {
        DocsiftError::Configuration(format!("Failed to read {what} from {path}: {e}"))
    })
}

/// Decode the first PEM block of `text`, returning its label and DER bytes
fn decode_pem(text: &str) -> Option<(String, Vec<u8>)> {
    let mut lines = text.lines().map(str::trim);
    let label = lines
        .by_ref()
        .find_map(|l| l.strip_prefix("-----BEGIN ")?.strip_suffix("-----"))?
        .to_string();
    let end_marker = format!("-----END {label}-----");

    let mut body = String::new();
    for line in lines {
        if line == end_marker {
            let der = general_purpose::STANDARD.decode(body.as_bytes()).ok()?;
            return Some((label, der));
        }
        body.push_str(line);
    }
    None
}

fn certificate_thumbprint(certificate_pem: &str) -> Result<String> {
    let (label, der) = decode_pem(certificate_pem).ok_or_else(|| {
        DocsiftError::Configuration("Certificate is not a valid PEM document".to_string())
    })?;
    if label != "CERTIFICATE" {
        return Err(DocsiftError::Configuration(format!(
            "Unsupported certificate PEM block: {label}"
        )));
    }
    let digest = Sha1::digest(&der);
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(digest))
}

fn load_rsa_signing_key(private_key_pem: &str) -> Result<EncodingKey> {
    let (label, der) = decode_pem(private_key_pem).ok_or_else(|| {
        DocsiftError::Configuration("Private key is not a valid PEM document".to_string())
    })?;

    match label.as_str() {
        "RSA PRIVATE KEY" => {}
        "PRIVATE KEY" => {
            if !der
                .windows(RSA_ENCRYPTION_OID.len())
                .any(|w| w == RSA_ENCRYPTION_OID)
            {
                return Err(DocsiftError::Configuration(
                    "Private key is not an RSA key".to_string(),
                ));
            }
        }
        other => {
            return Err(DocsiftError::Configuration(format!(
                "Unsupported key type {other}"
            )))
        }
    }

    EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| DocsiftError::Configuration(format!("Invalid RSA private key: {e}")))
}
