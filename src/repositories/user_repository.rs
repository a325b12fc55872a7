use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Role, User};

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, new: NewUser<'_>) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, first_name, last_name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(normalize_email(new.email))
    .bind(new.password_hash)
    .bind(new.role)
    .fetch_one(db)
    .await
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_email<'e>(db: impl PgExecutor<'e>, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, role: Option<Role>, q: Option<&str>) {
    builder.push(" WHERE TRUE");
    if let Some(role) = role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(q) = q.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", q);
        builder
            .push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list<'e>(
    db: impl PgExecutor<'e>,
    role: Option<Role>,
    q: Option<&str>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<User>> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM users");
    push_filters(&mut builder, role, q);
    builder
        .push(" ORDER BY created_at DESC, id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder.build_query_as::<User>().fetch_all(db).await
}

pub async fn count<'e>(
    db: impl PgExecutor<'e>,
    role: Option<Role>,
    q: Option<&str>,
) -> sqlx::Result<i64> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
    push_filters(&mut builder, role, q);
    let (total,): (i64,) = builder.build_query_as().fetch_one(db).await?;
    Ok(total)
}

/// Role is deliberately not writable.
pub async fn save<'e>(db: impl PgExecutor<'e>, user: &User) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET first_name = $2, last_name = $3, email = $4, password_hash = $5, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(user.first_name.trim())
    .bind(user.last_name.trim())
    .bind(normalize_email(&user.email))
    .bind(&user.password_hash)
    .fetch_one(db)
    .await
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
