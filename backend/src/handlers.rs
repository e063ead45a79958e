use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use smartsense_shared::{format_timestamp, now_utc, Measurement, StorageError};
use tracing::error;

use crate::app_state::AppState;

/// GET /latest - 返回最新一条测量记录
pub async fn latest_measurement(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    latest_response(state.store.latest().await)
}

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time": format_timestamp(&now_utc()),
    }))
}

// 由查询结果构造响应
//
// 无数据是正常应答而非错误；存储故障对外只给出不透明的错误体，
// 具体原因留在服务端日志里。
fn latest_response(result: Result<Option<Measurement>, StorageError>) -> (StatusCode, Json<Value>) {
    match result {
        Ok(Some(m)) => (
            StatusCode::OK,
            Json(json!({
                "topic": m.topic,
                "value": m.value,
                "timestamp": format_timestamp(&m.timestamp),
            })),
        ),
        Ok(None) => (StatusCode::OK, Json(json!({ "message": "No data yet" }))),
        Err(e) => {
            error!("Failed to read latest measurement: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
        }
    }
}
