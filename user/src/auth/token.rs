//! Session token codec.
//!
//! A token has the shape `session_<identity id>_<nonce>`. Identity ids may
//! contain `_` themselves, so decoding splits on the *last* separator: the
//! nonce alphabet never contains it.
//!
//! # Security Note
//!
//! Tokens carry no signature and no expiry. Anyone who knows an identity id
//! can forge a token for it. A production deployment should swap this codec
//! for a signed, expiring scheme while keeping `AuthService::resolve` as is.

use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use std::fmt;

use crate::error::TokenError;

pub const TOKEN_PREFIX: &str = "session_";
pub const SEPARATOR: char = '_';

const NONCE_LEN: usize = 16;

/// An opaque bearer token handed out at login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two halves recovered from a well-formed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedToken {
    pub identity_id: String,
    pub session_id: String,
}

/// Mints a token for `identity_id` with a fresh random nonce.
///
/// Uses the thread-local RNG, so concurrent logins never share state.
pub fn mint(identity_id: &str) -> SessionToken {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect();

    SessionToken(format!("{TOKEN_PREFIX}{identity_id}{SEPARATOR}{nonce}"))
}

/// Decodes a token into its identity id and session nonce.
///
/// Does not check that the identity exists; see `AuthService::resolve`.
pub fn parse(token: &str) -> Result<ParsedToken, TokenError> {
    let body = token.strip_prefix(TOKEN_PREFIX).ok_or(TokenError::Malformed {
        reason: "missing prefix",
    })?;

    let split_at = last_separator(body).ok_or(TokenError::Malformed {
        reason: "missing separator",
    })?;

    let identity_id = &body[..split_at];
    let session_id = &body[split_at + SEPARATOR.len_utf8()..];

    if identity_id.is_empty() {
        return Err(TokenError::Malformed {
            reason: "empty identity id",
        });
    }
    if session_id.is_empty() {
        return Err(TokenError::Malformed {
            reason: "empty session id",
        });
    }

    Ok(ParsedToken {
        identity_id: identity_id.to_string(),
        session_id: session_id.to_string(),
    })
}

/// Byte index of the last separator; identity ids may contain `_`.
fn last_separator(body: &str) -> Option<usize> {
    body.rfind(SEPARATOR)
}
