use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendra_core::identity::CallerIdentity;

use crate::state::AppState;

/// JWT claims issued by the upstream identity provider. This core never
/// manages credentials; it only derives a `CallerIdentity` from a verified
/// token or a session header.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub supplier_id: Option<Uuid>,
    pub exp: usize,
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Map verified claims onto the caller roles the domain understands.
pub fn identity_from_claims(claims: &Claims) -> Result<CallerIdentity, String> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| format!("subject is not a user id: {}", claims.sub))?;
    match claims.role.as_str() {
        "CUSTOMER" => {
            let email = claims
                .email
                .clone()
                .ok_or_else(|| "customer token is missing an email claim".to_string())?;
            Ok(CallerIdentity::Customer { user_id, email })
        }
        "SUPPLIER" => {
            let supplier_id = claims
                .supplier_id
                .ok_or_else(|| "supplier token is missing a supplier_id claim".to_string())?;
            Ok(CallerIdentity::Supplier {
                user_id,
                supplier_id,
            })
        }
        "ADMIN" => Ok(CallerIdentity::Admin { user_id }),
        other => Err(format!("unknown role: {}", other)),
    }
}

/// Resolves the caller for every `/v1` request and injects a
/// `CallerIdentity` into the request extensions.
///
/// A bearer token wins when present; otherwise an `X-Session-Id` header
/// identifies an anonymous shopper. A request carrying neither is rejected.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let identity = if let Some(auth_header) = req.headers().get("Authorization") {
        let header = auth_header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

        identity_from_claims(&token_data.claims).map_err(|reason| {
            tracing::debug!("Rejected token: {}", reason);
            StatusCode::FORBIDDEN
        })?
    } else if let Some(session) = req.headers().get("X-Session-Id") {
        let session_id = session
            .to_str()
            .ok()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(StatusCode::UNAUTHORIZED)?;
        CallerIdentity::Anonymous {
            session_id: session_id.to_string(),
        }
    } else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
