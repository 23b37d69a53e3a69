//! Result type alias for Docsift

use super::errors::DocsiftError;

/// Result type alias for Docsift operations
///
/// # Examples
///
/// ```
/// use docsift::domain::result::Result;
/// use docsift::domain::errors::DocsiftError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DocsiftError::Configuration("missing tenant".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DocsiftError>;
