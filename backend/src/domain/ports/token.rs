//! Driven ports for the Texas token sidecar.

use async_trait::async_trait;
use serde::Deserialize;

use super::define_port_error;
use crate::domain::Token;

/// Introspection answer for a user token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenIntrospection {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub acr: Option<String>,
    #[serde(default)]
    pub pid: Option<String>,
}

define_port_error! {
    /// Errors surfaced while talking to Texas.
    pub enum TokenError {
        /// Texas answered with an error status.
        Status { status: u16, message: String } => "texas svarte {status}: {message}",
        /// The request never produced a response.
        Transport { message: String } => "texas transportfeil: {message}",
        /// The response body could not be decoded.
        Decode { message: String } => "texas svar kunne ikke leses: {message}",
    }
}

/// Port validating bearer tokens presented by the frontend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    async fn introspect(&self, token: &Token) -> Result<TokenIntrospection, TokenError>;
}

/// Port exchanging tokens for downstream audiences.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// On-behalf-of token for `target` through TokenX.
    async fn tokenx(&self, target: &str, user_token: &Token) -> Result<Token, TokenError>;

    /// Machine-to-machine token for Fiks through Maskinporten.
    async fn maskinporten(&self) -> Result<Token, TokenError>;
}
