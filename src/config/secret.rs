//! Secure credential handling using the secrecy crate
//!
//! Bearer tokens and signed client assertions live in [`SecretString`] so they
//! are zeroed on drop, redacted in `Debug` output, and only reachable through
//! an explicit `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use docsift::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("eyJ0eXAi...".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "eyJ0eXAi...");
//! assert!(!format!("{token:?}").contains("eyJ0"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Type alias for a secret string
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString from a String
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
