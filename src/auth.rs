//! HTTP Basic authentication
//!
//! Passwords from `API_USERS` are kept only as SHA-256 digests; a request is
//! accepted when the digest of the supplied password equals the stored one.

use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

use crate::config::ApiUser;
use crate::error::{AppError, Result};
use crate::state::AppState;

type PasswordDigest = [u8; 32];

/// Configured API users
#[derive(Default)]
pub struct Credentials {
    users: HashMap<String, PasswordDigest>,
}

impl Credentials {
    pub fn from_users(users: &[ApiUser]) -> Self {
        Self {
            users: users
                .iter()
                .map(|u| (u.username.clone(), digest(&u.password)))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        let supplied = digest(password);
        match self.users.get(username) {
            Some(stored) => stored
                .iter()
                .zip(supplied.iter())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0,
            None => false,
        }
    }
}

fn digest(password: &str) -> PasswordDigest {
    Sha256::digest(password.as_bytes()).into()
}

/// Decode an `Authorization: Basic ...` header value into user and password
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Middleware guarding `/api/*`
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let credentials = state.credentials();
    if credentials.is_empty() {
        return Err(AppError::Unauthorized(
            "No API users are configured".to_string(),
        ));
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let (username, password) = parse_basic(header)
        .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

    if !credentials.verify(&username, &password) {
        tracing::warn!("Rejected credentials for user '{}'", username);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    tracing::Span::current().record("user", username.as_str());
    Ok(next.run(request).await)
}
