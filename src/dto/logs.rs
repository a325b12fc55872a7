use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Log;

#[derive(Debug, Serialize, ToSchema)]
pub struct LogList {
    pub items: Vec<Log>,
}
