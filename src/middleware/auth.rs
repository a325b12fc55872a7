//! Session-based identity and the role gates run before handlers.
//!
//! Gates are plain `from_fn` middleware attached with `route_layer`, so a
//! rejected request never reaches the handler.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::{
    dto::auth::SessionUser,
    error::AppError,
    middleware::session::SESSION_USER_KEY,
    models::Role,
};

/// The signed-in user; rejects with 401 when there is none.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

/// The signed-in user on public routes, `None` for guests.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<SessionUser>);

pub fn ensure_role(user: &SessionUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn session_user(session: &Session) -> Result<Option<SessionUser>, AppError> {
    Ok(session.get::<SessionUser>(SESSION_USER_KEY).await?)
}

pub async fn set_session_user(session: &Session, user: &SessionUser) -> Result<(), AppError> {
    session.insert(SESSION_USER_KEY, user).await?;
    Ok(())
}

async fn user_from_parts(parts: &Parts) -> Result<Option<SessionUser>, AppError> {
    if let Some(user) = parts.extensions.get::<SessionUser>() {
        return Ok(Some(user.clone()));
    }
    match parts.extensions.get::<Session>() {
        Some(session) => session_user(session).await,
        None => Ok(None),
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(user_from_parts(parts).await?))
    }
}

async fn gate(
    session: Session,
    mut request: Request,
    next: Next,
    role: Option<Role>,
) -> Result<Response, AppError> {
    let user = session_user(&session).await?.ok_or(AppError::Unauthorized)?;
    if let Some(role) = role {
        ensure_role(&user, role)?;
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Any signed-in user.
pub async fn require_auth(session: Session, request: Request, next: Next) -> Result<Response, AppError> {
    gate(session, request, next, None).await
}

pub async fn require_admin(session: Session, request: Request, next: Next) -> Result<Response, AppError> {
    gate(session, request, next, Some(Role::Admin)).await
}

pub async fn require_seller(session: Session, request: Request, next: Next) -> Result<Response, AppError> {
    gate(session, request, next, Some(Role::Seller)).await
}

pub async fn require_client(session: Session, request: Request, next: Next) -> Result<Response, AppError> {
    gate(session, request, next, Some(Role::Client)).await
}

/// Only anonymous visitors, e.g. the login and register forms.
pub async fn require_guest(session: Session, request: Request, next: Next) -> Result<Response, AppError> {
    if session_user(&session).await?.is_some() {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
