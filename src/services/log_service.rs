use serde_json::Value;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::logs::LogList,
    error::{AppError, AppResult},
    models::LogType,
    repositories::log_repository,
    response::{ApiResponse, Meta},
    routes::params::LogQuery,
};

/// Appends to the audit trail; a failed insert is only traced.
pub async fn record(
    pool: &DbPool,
    log_type: LogType,
    action: &str,
    user_id: Option<Uuid>,
    details: Option<Value>,
) {
    if let Err(err) = log_repository::insert(pool, log_type, action, user_id, details).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}

/// Records a failed operation with the error that ended it.
pub async fn record_failure(pool: &DbPool, action: &str, user_id: Option<Uuid>, err: &AppError) {
    let details = serde_json::json!({
        "error": err.to_string(),
        "status": err.status().as_u16(),
    });
    record(pool, LogType::Error, action, user_id, Some(details)).await;
}

pub async fn list(pool: &DbPool, query: LogQuery) -> AppResult<ApiResponse<LogList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let items = log_repository::list(pool, query.log_type, query.user_id, limit, offset).await?;
    let total = log_repository::count(pool, query.log_type, query.user_id).await?;
    Ok(ApiResponse::success(
        "Logs",
        LogList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
