use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use tower_sessions::Session;

use crate::{
    db::DbPool,
    dto::auth::{LoginRequest, RegisterRequest, SessionUser},
    error::{AppError, AppResult},
    middleware::auth::set_session_user,
    models::{LogType, Role, User},
    repositories::user_repository::{self, NewUser},
    response::{ApiResponse, Meta},
    services::log_service,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Creates a user after checking the email is free. Shared by sign-up and the admin panel.
pub async fn create_account(
    pool: &DbPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> AppResult<User> {
    if user_repository::find_by_email(pool, email).await?.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }

    let password_hash = hash_password(password)?;
    let user = user_repository::insert(
        pool,
        NewUser {
            first_name,
            last_name,
            email,
            password_hash: &password_hash,
            role,
        },
    )
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Email is already taken".to_string())
        } else {
            AppError::DbError(err)
        }
    })?;
    Ok(user)
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub async fn register_user(pool: &DbPool, payload: RegisterRequest) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let role = payload.role.unwrap_or(Role::Client);
    let user = create_account(
        pool,
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.password,
        role,
    )
    .await?;

    log_service::record(
        pool,
        LogType::Auth,
        "user_register",
        Some(user.id),
        Some(serde_json::json!({ "role": user.role })),
    )
    .await;
    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login_user(
    pool: &DbPool,
    session: &Session,
    payload: LoginRequest,
) -> AppResult<ApiResponse<SessionUser>> {
    payload.validate()?;
    let LoginRequest { email, password } = payload;
    let user = match user_repository::find_by_email(pool, &email).await? {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        log_service::record(pool, LogType::Auth, "login_failed", Some(user.id), None).await;
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let session_user = SessionUser {
        user_id: user.id,
        role: user.role,
        first_name: user.first_name.clone(),
    };
    session.cycle_id().await?;
    set_session_user(session, &session_user).await?;

    if user.is_admin() {
        tracing::info!(user_id = %user.id, "admin signed in");
    }
    log_service::record(pool, LogType::Auth, "user_login", Some(user.id), None).await;

    Ok(ApiResponse::success(
        "Logged in",
        session_user,
        Some(Meta::empty()),
    ))
}

pub async fn logout_user(pool: &DbPool, session: &Session, user: &SessionUser) -> AppResult<()> {
    session.flush().await?;
    log_service::record(pool, LogType::Auth, "user_logout", Some(user.user_id), None).await;
    Ok(())
}

pub async fn current_user(pool: &DbPool, user: &SessionUser) -> AppResult<ApiResponse<User>> {
    let user = user_repository::find_by_id(pool, user.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(ApiResponse::success("Current user", user, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert_ne!(hash, "s3cret-pass");
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }
}
