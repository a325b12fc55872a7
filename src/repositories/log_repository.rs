use serde_json::Value;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Log, LogType};

pub async fn insert<'e>(
    db: impl PgExecutor<'e>,
    log_type: LogType,
    action: &str,
    user_id: Option<Uuid>,
    details: Option<Value>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO logs (id, log_type, action, user_id, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(log_type)
    .bind(action)
    .bind(user_id)
    .bind(details)
    .execute(db)
    .await?;

    Ok(())
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    log_type: Option<LogType>,
    user_id: Option<Uuid>,
) {
    builder.push(" WHERE TRUE");
    if let Some(log_type) = log_type {
        builder.push(" AND log_type = ").push_bind(log_type);
    }
    if let Some(user_id) = user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
}

pub async fn list<'e>(
    db: impl PgExecutor<'e>,
    log_type: Option<LogType>,
    user_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Log>> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM logs");
    push_filters(&mut builder, log_type, user_id);
    builder
        .push(" ORDER BY created_at DESC, id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder.build_query_as::<Log>().fetch_all(db).await
}

pub async fn count<'e>(
    db: impl PgExecutor<'e>,
    log_type: Option<LogType>,
    user_id: Option<Uuid>,
) -> sqlx::Result<i64> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM logs");
    push_filters(&mut builder, log_type, user_id);
    let (total,): (i64,) = builder.build_query_as().fetch_one(db).await?;
    Ok(total)
}
