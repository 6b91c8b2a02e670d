//! Structural validation of session tokens.
//!
//! Tokens are issued and signed by the token service. Signatures are not
//! checked here; only the audience and expiry claims are.

use jsonwebtoken::{decode, DecodingKey, Validation};
use time::OffsetDateTime;

use crate::models::token::TokenClaims;

pub const EXPECTED_AUDIENCE: &str = "OvO";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
    #[error("token audience is not OvO")]
    WrongAudience,
    #[error("token expired at {0}")]
    Expired(i64),
}

pub fn validate_token(token: &str) -> Result<TokenClaims, TokenError> {
    validate_token_at(token, OffsetDateTime::now_utc().unix_timestamp())
}

/// Decodes `token` and accepts it only if its audience is [`EXPECTED_AUDIENCE`]
/// and `now` is strictly before its expiry.
pub fn validate_token_at(token: &str, now: i64) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let claims = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?.claims;

    if !claims.aud.contains(EXPECTED_AUDIENCE) {
        return Err(TokenError::WrongAudience);
    }
    if now >= claims.exp {
        return Err(TokenError::Expired(claims.exp));
    }

    Ok(claims)
}
