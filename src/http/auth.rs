use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderName;
use std::convert::Infallible;
use uuid::Uuid;

use crate::app::auth::AuthService;
use crate::http::AppError;
use crate::AppState;

/// The resolved identity of the requester, if any. Never rejects: a missing
/// or invalid token yields `Caller(None)` and the operation decides.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Option<Uuid>);

#[derive(Debug, Clone)]
pub struct AdminToken;

const ADMIN_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-admin-token");

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Ok(Caller(None));
        };

        let service = AuthService::new(state.paseto_access_key, state.access_ttl_minutes);
        match service.authenticate_access_token(token) {
            Ok(session) => Ok(Caller(session.map(|session| session.user_id))),
            Err(err) => {
                tracing::debug!(error = ?err, "rejected access token");
                Ok(Caller(None))
            }
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .admin_token
            .as_ref()
            .ok_or_else(|| AppError::forbidden("admin token not configured"))?;

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::forbidden("missing admin token"))?;

        if provided != expected {
            return Err(AppError::forbidden("invalid admin token"));
        }

        Ok(AdminToken)
    }
}
