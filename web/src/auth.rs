/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::WebState;
use super::error::{WebError, WebResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Owner id taken from a verified token's `sub` claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner(pub String);

pub async fn authorize(
    State(web): State<WebState>,
    mut req: Request,
    next: Next,
) -> WebResult<Response> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(WebError::missing_token)?
        .to_str()
        .map_err(|_| WebError::Unauthorized("Authorization header empty".to_string()))?;

    let mut header = auth_header.split_whitespace();
    let token = match (header.next(), header.next()) {
        (Some("Bearer"), Some(token)) => token,
        _ => {
            return Err(WebError::Unauthorized(
                "Invalid Authorization header".to_string(),
            ));
        }
    };

    let token_data = decode_jwt(&web.state.jwt_secret, token).map_err(|e| {
        debug!(error = %e, "Rejected token");
        WebError::invalid_token()
    })?;

    if token_data.claims.sub.is_empty() {
        return Err(WebError::invalid_token());
    }

    req.extensions_mut().insert(Owner(token_data.claims.sub));
    Ok(next.run(req).await)
}

/// Issues a 24 hour token for `owner`. Tokens are normally minted by the
/// identity provider sharing the secret.
pub fn encode_jwt(secret: &str, owner: &str) -> WebResult<String> {
    let now = Utc::now();
    let exp = (now + Duration::hours(24)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = Claims {
        sub: owner.to_string(),
        exp,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|_| WebError::Unauthorized("Failed to generate token".to_string()))
}

pub fn decode_jwt(
    secret: &str,
    token: &str,
) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    decode(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
}
