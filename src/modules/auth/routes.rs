use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use shelf_authz::TokenKeys;
use shelf_http::{error::ErrorResponse, AppError, ValidatedJson};

use super::models::{AuthResponse, Credentials, NewUser, PublicUser};
use super::store::{UserStore, EMAIL_CONSTRAINT};
use crate::utils::username;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenKeys>,
    pub bcrypt_cost: u32,
}

fn duplicate_user(email: &str) -> AppError {
    AppError::conflict(vec![], format!("User already exists for email = {email}"))
}

/// Register a new account and sign it in
#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    request_body = Credentials,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Invalid body or email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AuthState>,
    ValidatedJson(body): ValidatedJson<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if state.users.find_by_email(&body.email).await?.is_some() {
        return Err(duplicate_user(&body.email));
    }

    let password_hash = hash_password(body.password, state.bcrypt_cost).await?;
    let username = username::generate();

    let id = state
        .users
        .create(NewUser {
            username: username.clone(),
            email: body.email.clone(),
            password_hash,
        })
        .await
        .map_err(|err| {
            if err.violates(EMAIL_CONSTRAINT) {
                duplicate_user(&body.email)
            } else {
                AppError::from(err)
            }
        })?;

    let token = state
        .tokens
        .issue(id, &body.email)
        .map_err(|err| AppError::Internal(err.into()))?;

    tracing::info!(user_id = id, %username, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user: PublicUser {
                id,
                username,
                email: body.email,
            },
        }),
    ))
}

/// Exchange email and password for a token
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 401, description = "Unknown email or wrong password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    ValidatedJson(body): ValidatedJson<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let Some(user) = state.users.find_by_email(&body.email).await? else {
        tracing::debug!("login for unknown email");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(body.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = user.id, "login with wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state
        .tokens
        .issue(user.id, &user.email)
        .map_err(|err| AppError::Internal(err.into()))?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: PublicUser::from(&user),
    }))
}

// bcrypt is CPU bound; keep it off the async workers.
async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}
