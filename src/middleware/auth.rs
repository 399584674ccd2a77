use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id; also the attempt document id.
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

fn reject(reason: &str) -> Response {
    Error::Unauthorized(reason.to_string()).into_response()
}

/// Validates the bearer token and stores its `Claims` in request extensions.
/// Course-level permissions are checked by the services, not here.
pub async fn require_bearer_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return reject("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject("unsupported_scheme");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) if !data.claims.sub.is_empty() => {
            req.extensions_mut().insert(data.claims);
            next.run(req).await
        }
        Ok(_) => reject("invalid_subject"),
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            reject("invalid_token")
        }
    }
}

pub fn issue_token(secret: &str, sub: &str, role: Option<&str>, ttl_seconds: i64) -> crate::error::Result<String> {
    let exp = (chrono::Utc::now().timestamp() + ttl_seconds).max(0) as usize;
    let claims = Claims {
        sub: sub.to_string(),
        exp,
        role: role.map(str::to_string),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}
