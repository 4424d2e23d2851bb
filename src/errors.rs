/*!
 * Error types for the loctrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails (malformed JSON included)
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Every attempt of an operation failed
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Name of the provider operation
        operation: String,
        /// Number of attempts consumed
        attempts: u32,
        /// The error returned by the final attempt
        last_error: String,
    },
}

impl ProviderError {
    /// Whether another attempt of the same request may succeed.
    ///
    /// Network failures, server errors, rate limits and malformed output are
    /// transient. Authentication and other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::AuthenticationError(_) | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Number of attempts recorded in the error, 1 for single-shot errors
    pub fn attempts(&self) -> u32 {
        match self {
            Self::RetriesExhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    /// Map an HTTP status and body to the matching error variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The token budget leaves no room for any text after the prompt overhead
    #[error("Token budget of {target} leaves no room after {overhead} tokens of prompt overhead")]
    InvalidTokenBudget {
        /// Requested batch budget
        target: usize,
        /// Reserved prompt overhead
        overhead: usize,
    },

    /// A single item cannot fit into any batch
    #[error("Context too small for '{key}': needs {required} tokens, {available} available")]
    ContextTooSmall {
        /// Key of the item that does not fit
        key: String,
        /// Estimated cost of the item
        required: usize,
        /// Tokens available per batch
        available: usize,
    },
}
