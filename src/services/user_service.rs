use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        auth::SessionUser,
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    error::{AppError, AppResult},
    models::{LogType, User},
    repositories::user_repository,
    response::{ApiResponse, Empty, Meta},
    routes::params::UserListQuery,
    services::{
        auth_service::{self, is_unique_violation},
        log_service,
    },
};

pub async fn list_users(pool: &DbPool, query: UserListQuery) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let q = query.q.as_deref();
    let items = user_repository::list(pool, query.role, q, limit, offset).await?;
    let total = user_repository::count(pool, query.role, q).await?;
    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_user(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = user_repository::find_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User", user, Some(Meta::empty())))
}

pub async fn create_user(
    pool: &DbPool,
    admin: &SessionUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let user = auth_service::create_account(
        pool,
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.password,
        payload.role,
    )
    .await?;

    log_service::record(
        pool,
        LogType::User,
        "user_create",
        Some(admin.user_id),
        Some(serde_json::json!({ "user_id": user.id, "role": user.role })),
    )
    .await;
    Ok(ApiResponse::success("User created", user, Some(Meta::empty())))
}

pub async fn update_user(
    pool: &DbPool,
    admin: &SessionUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let mut user = user_repository::find_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(email) = &payload.email {
        if let Some(other) = user_repository::find_by_email(pool, email).await? {
            if other.id != user.id {
                return Err(AppError::Conflict("Email is already taken".into()));
            }
        }
        user.email = email.clone();
    }
    if let Some(first_name) = payload.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = last_name;
    }
    if let Some(password) = &payload.password {
        user.password_hash = auth_service::hash_password(password)?;
    }

    let user = user_repository::save(pool, &user).await.map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Email is already taken".into())
        } else {
            AppError::DbError(err)
        }
    })?;

    log_service::record(
        pool,
        LogType::User,
        "user_update",
        Some(admin.user_id),
        Some(serde_json::json!({
            "user_id": user.id,
            "password_changed": payload.password.is_some(),
        })),
    )
    .await;
    Ok(ApiResponse::success("User updated", user, Some(Meta::empty())))
}

pub async fn delete_user(
    pool: &DbPool,
    admin: &SessionUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    if admin.user_id == id {
        return Err(AppError::BadRequest("cannot delete your own account".into()));
    }
    let target = user_repository::find_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !user_repository::delete(pool, id).await? {
        return Err(AppError::NotFound);
    }

    log_service::record(
        pool,
        LogType::User,
        "user_delete",
        Some(admin.user_id),
        Some(serde_json::json!({
            "user_id": id,
            "role": target.role,
            "removed_with_account": removed_with(&target),
        })),
    )
    .await;
    Ok(ApiResponse::success("User deleted", Empty::default(), Some(Meta::empty())))
}

/// Rows that go away with `user` through the cascading foreign keys.
fn removed_with(user: &User) -> &'static [&'static str] {
    if user.is_seller() {
        &["products"]
    } else if user.is_client() {
        &["cart", "addresses", "orders"]
    } else {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@example.com".into(),
            password_hash: String::new(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn deleting_lists_what_the_account_takes_with_it() {
        assert_eq!(removed_with(&user(Role::Seller)), &["products"]);
        assert_eq!(removed_with(&user(Role::Client)), &["cart", "addresses", "orders"]);
        assert!(removed_with(&user(Role::Admin)).is_empty());
    }
}
