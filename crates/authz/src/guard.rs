use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use shelf_http::AppError;

use crate::token::TokenKeys;

pub const MISSING_TOKEN: &str = "Access token required";
pub const INVALID_TOKEN: &str = "Invalid token";

/// Identity attached to a request by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

/// Middleware rejecting requests without a valid bearer token.
///
/// No token → 401; a token failing signature or expiry checks → 403.
pub async fn require_auth(
    State(keys): State<Arc<TokenKeys>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| AppError::unauthorized(MISSING_TOKEN))?;

    let claims = keys.verify(token).map_err(|err| {
        tracing::debug!(error = %err, "bearer token rejected");
        AppError::forbidden(INVALID_TOKEN)
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
    });

    Ok(next.run(req).await)
}

/// Token part of an `Authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized(MISSING_TOKEN))
    }
}
