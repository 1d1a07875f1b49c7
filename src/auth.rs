use anyhow::{anyhow, Result};
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::{debug, warn};

use crate::types::JwtClaims;

/// Resolves the caller identifier from the `Authorization` header.
///
/// Any failure yields `None`, so the request is served the anonymous feed.
pub fn resolve_caller_id(headers: &HeaderMap, jwt_secret: Option<&str>) -> Option<String> {
    let auth_header = headers.get(header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(_) => {
            warn!("Invalid authorization header format");
            return None;
        }
    };

    match validate_jwt(auth_str, jwt_secret) {
        Ok(claims) => {
            debug!("Authenticated request from {}", claims.sub);
            Some(claims.sub)
        }
        Err(e) => {
            warn!("JWT validation failed, serving anonymous feed: {}", e);
            None
        }
    }
}

pub fn validate_jwt(auth_header: &str, jwt_secret: Option<&str>) -> Result<JwtClaims> {
    // Extract bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| anyhow!("Invalid authorization header format"))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("sub".to_string());

    // Without a secret only the claims are checked (development mode)
    let decoding_key = match jwt_secret {
        Some(secret) => DecodingKey::from_secret(secret.as_bytes()),
        None => {
            validation.insecure_disable_signature_validation();
            DecodingKey::from_secret(b"")
        }
    };

    let token_data = decode::<JwtClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}
