//! Account endpoints: register and login.
//!
//! Both are the only unauthenticated routes. Attempts are logged with the
//! username for audit; passwords never reach the logs.

use api_types::account::{Credentials, TokenResponse};
use axum::{Json, extract::State, http::StatusCode};

use crate::{ServerError, server::ServerState};

/// Create a user and return its freshly minted token.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<TokenResponse>), ServerError> {
    let username = payload.username.clone().unwrap_or_default();

    match state
        .engine
        .register(payload.username.as_deref(), payload.password.as_deref())
        .await
    {
        Ok(token) => {
            tracing::info!(username = %username, "user registered");
            Ok((StatusCode::CREATED, Json(TokenResponse { token })))
        }
        Err(err) => {
            tracing::warn!(username = %username, "registration rejected: {err}");
            Err(err.into())
        }
    }
}

/// Verify a credential and return the caller's token.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<TokenResponse>, ServerError> {
    let username = payload.username.clone().unwrap_or_default();

    match state
        .engine
        .login(payload.username.as_deref(), payload.password.as_deref())
        .await
    {
        Ok(token) => Ok(Json(TokenResponse { token })),
        Err(err) => {
            tracing::warn!(username = %username, "login failed");
            Err(err.into())
        }
    }
}
