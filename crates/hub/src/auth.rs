// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token validation.
//!
//! Tokens are HMAC-signed JWTs minted by the identity service (a
//! collaborator). The `azp` claim distinguishes relay clients from UI
//! clients; relays additionally carry the org they report for.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `azp` value relay tokens are minted with.
pub const RELAY_AZP: &str = "pitwall-relay";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("relay token missing org claim")]
    MissingOrg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub azp: Option<String>,
    #[serde(default)]
    pub org_id: Option<i64>,
    pub exp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Relay,
    User,
}

impl Claims {
    pub fn kind(&self) -> ClientKind {
        if self.azp.as_deref() == Some(RELAY_AZP) {
            ClientKind::Relay
        } else {
            ClientKind::User
        }
    }
}

pub fn validate(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    if data.claims.kind() == ClientKind::Relay && data.claims.org_id.is_none() {
        return Err(AuthError::MissingOrg);
    }
    Ok(data.claims)
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
