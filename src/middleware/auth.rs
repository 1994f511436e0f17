use crate::AppState;
use crate::db::models::AuthUser;
use crate::error::AppError;
use axum::{
    TypedHeader,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use headers::{Authorization, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid, // user_id
    pub email: String,
    pub username: String,
    pub exp: u64,    // expiration time
    pub iat: u64,    // issued at
    pub jti: String, // JWT ID
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Verifies access tokens issued by the ProjectHub auth service. Issuance
/// lives elsewhere; this side only checks signature and expiry.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_ref()),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(token_data.claims)
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<axum::body::Body>,
    next: Next<axum::body::Body>,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::auth("Missing bearer token"))?;

    // Verify the token
    let claims = state.auth_service.verify_token(bearer.token())?;

    // Inactive or unknown users are treated as unauthenticated
    let user = state
        .session_users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::auth("User not found or inactive"))?;

    // Make the user available to handlers
    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}
