//! Authentication primitives for the logged-in citizen.
//!
//! Inbound adapters turn a validated bearer token into an
//! [`AuthenticatedUser`]; domain services only see these types.

use std::fmt;

/// Bearer token as presented by the frontend, without the `Bearer ` prefix.
///
/// `Debug` never prints the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Strip an optional `Bearer ` prefix from an `Authorization` header.
    ///
    /// # Examples
    /// ```
    /// use innsyn_api::domain::Token;
    ///
    /// assert_eq!(Token::from_authorization("Bearer abc").as_str(), "abc");
    /// assert_eq!(Token::from_authorization("abc").as_str(), "abc");
    /// ```
    pub fn from_authorization(header: &str) -> Self {
        let raw = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .unwrap_or(header);
        Self(raw.trim().to_owned())
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Citizen identified by a validated ID-porten token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    ident: String,
    token: Token,
}

impl AuthenticatedUser {
    /// Build a user from the `pid` claim and the presented token.
    pub fn new(ident: impl Into<String>, token: Token) -> Self {
        Self {
            ident: ident.into(),
            token,
        }
    }

    /// Fødselsnummer or D-nummer of the user.
    pub fn ident(&self) -> &str {
        self.ident.as_str()
    }

    /// Token presented by the frontend.
    pub fn token(&self) -> &Token {
        &self.token
    }
}
